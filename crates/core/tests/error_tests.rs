// ═══════════════════════════════════════════════════════════════════
// Error Tests: CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use portfolio_insight_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn network() {
        let err = CoreError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn timeout() {
        assert_eq!(CoreError::Timeout(30).to_string(), "Request timed out after 30s");
    }

    #[test]
    fn unauthorized() {
        assert_eq!(
            CoreError::Unauthorized.to_string(),
            "Session expired, please log in again"
        );
    }

    #[test]
    fn http_status() {
        let err = CoreError::HttpStatus {
            status: 502,
            message: "Bad Gateway".into(),
        };
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }

    #[test]
    fn api() {
        let err = CoreError::Api {
            code: 400,
            message: "stock_code is required".into(),
        };
        assert_eq!(err.to_string(), "API error (400): stock_code is required");
    }

    #[test]
    fn api_negative_code() {
        let err = CoreError::Api {
            code: -1,
            message: "Request failed".into(),
        };
        assert_eq!(err.to_string(), "API error (-1): Request failed");
    }

    #[test]
    fn serialization() {
        let err = CoreError::Serialization("bad body".into());
        assert_eq!(err.to_string(), "Serialization error: bad body");
    }

    #[test]
    fn deserialization() {
        let err = CoreError::Deserialization("missing field".into());
        assert_eq!(err.to_string(), "Deserialization error: missing field");
    }

    #[test]
    fn validation() {
        let err = CoreError::ValidationError("Portfolio name must not be empty".into());
        assert_eq!(
            err.to_string(),
            "Validation failed: Portfolio name must not be empty"
        );
    }

    #[test]
    fn invalid_config() {
        let err = CoreError::InvalidConfig("timeout must be positive".into());
        assert_eq!(err.to_string(), "Invalid configuration: timeout must be positive");
    }
}

// ── Retry classification ────────────────────────────────────────────

mod retryable {
    use super::*;

    #[test]
    fn transport_failures_are_retryable() {
        assert!(CoreError::Network("reset".into()).is_retryable());
        assert!(CoreError::Timeout(5).is_retryable());
    }

    #[test]
    fn server_answers_are_not_retryable() {
        let errors = [
            CoreError::Unauthorized,
            CoreError::HttpStatus {
                status: 500,
                message: String::new(),
            },
            CoreError::Api {
                code: 1,
                message: String::new(),
            },
            CoreError::Deserialization(String::new()),
            CoreError::ValidationError(String::new()),
            CoreError::InvalidConfig(String::new()),
        ];
        for err in errors {
            assert!(!err.is_retryable(), "{err} should not be retryable");
        }
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Deserialization(_)));
        assert!(err.to_string().starts_with("Deserialization error: "));
    }

    #[test]
    fn question_mark_converts() {
        fn parse(raw: &str) -> Result<serde_json::Value, CoreError> {
            Ok(serde_json::from_str(raw)?)
        }
        assert!(parse("[1]").is_ok());
        assert!(matches!(parse("]"), Err(CoreError::Deserialization(_))));
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CoreError>();
    }
}
