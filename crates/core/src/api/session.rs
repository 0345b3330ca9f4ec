use std::sync::Mutex;

/// Where the bearer token lives between requests.
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: String);
    fn clear(&self);
}

/// In-process session, lost on restart.
#[derive(Debug, Default)]
pub struct MemorySession {
    token: Mutex<Option<String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySession {
    fn token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_token(&self, token: String) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Called once per 401 response, after the session has been cleared.
///
/// The host application decides what "go to login" means.
pub trait AuthExpiryHandler: Send + Sync {
    fn on_auth_expired(&self);
}

/// Does nothing; the caller still receives `CoreError::Unauthorized`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuthHandler;

impl AuthExpiryHandler for NoopAuthHandler {
    fn on_auth_expired(&self) {}
}

impl<F> AuthExpiryHandler for F
where
    F: Fn() + Send + Sync,
{
    fn on_auth_expired(&self) {
        self()
    }
}
