// ufanet-api: Async Rust client for the Ufanet residential access portal

pub mod auth;
pub mod client;
mod doorphones;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::{DEFAULT_BASE_URL, SessionClient};
pub use doorphones::DOORPHONES_PATH;
pub use error::Error;
pub use models::{Doorphone, DoorphoneId, UNKNOWN_DOORPHONE_NAME};
pub use transport::{TlsMode, TransportConfig};
