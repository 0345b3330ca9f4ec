use log::warn;
use serde::Deserialize;
use serde_json::Value;

use super::transport::ApiResponse;
use crate::errors::CoreError;

/// Envelope codes that mean success. Older endpoints answer `200`, newer ones `0`.
pub const SUCCESS_CODES: [i64; 2] = [0, 200];

const FALLBACK_MESSAGE: &str = "Request failed";

/// Longest body excerpt carried in an `HttpStatus` error.
const MAX_ERROR_BODY: usize = 200;

/// `{ code, message, data }` as sent by every backend endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    pub code: Value,
    #[serde(default)]
    pub message: Option<String>,
    /// Some endpoints use `msg`
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Integral code; integer strings and whole floats (`200.0`) are
    /// accepted, anything else is `-1`.
    #[must_use]
    pub fn code(&self) -> i64 {
        match &self.code {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                        .map(|f| f as i64)
                })
                .unwrap_or(-1),
            Value::String(s) => s.trim().parse().unwrap_or(-1),
            _ => -1,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        SUCCESS_CODES.contains(&self.code())
    }

    /// Server message, or a generic one when the server sent none.
    #[must_use]
    pub fn message(&self) -> String {
        self.message
            .as_deref()
            .or(self.msg.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string()
    }
}

/// Turn a non-401 response into the envelope's `data` or an error.
///
/// - Envelope with a success code → `data` (`null` when absent)
/// - Envelope with any other code → `CoreError::Api`
/// - Non-2xx without an envelope → `CoreError::HttpStatus`
/// - 2xx without an envelope → `CoreError::Deserialization`
pub fn unwrap_envelope(response: &ApiResponse) -> Result<Value, CoreError> {
    match serde_json::from_str::<Envelope>(&response.body) {
        Ok(envelope) if envelope.is_success() && response.is_success() => Ok(envelope.data),
        Ok(envelope) if envelope.is_success() => Err(CoreError::HttpStatus {
            status: response.status,
            message: envelope.message(),
        }),
        Ok(envelope) => {
            let code = envelope.code();
            let message = envelope.message();
            warn!("API error {code} (HTTP {}): {message}", response.status);
            Err(CoreError::Api { code, message })
        }
        Err(_) if !response.is_success() => {
            warn!("HTTP {} without envelope", response.status);
            Err(CoreError::HttpStatus {
                status: response.status,
                message: excerpt(&response.body),
            })
        }
        Err(e) => Err(CoreError::Deserialization(format!("Malformed response envelope: {e}"))),
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return FALLBACK_MESSAGE.to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY).collect()
}
