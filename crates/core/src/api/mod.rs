pub mod client;
pub mod envelope;
pub mod http_transport;
pub mod normalize;
pub mod session;
pub mod transport;

pub use client::{ApiClient, Credentials, Registration};
pub use session::{AuthExpiryHandler, MemorySession, NoopAuthHandler, SessionStore};
pub use transport::{ApiRequest, ApiResponse, Method, Transport};
