//! Doorphone entities and account lifecycle on top of `ufanet-api`.
//!
//! This crate is what a home-automation host binds to:
//!
//! - **[`Account`]**: One per configured Ufanet account. Owns the single
//!   shared [`SessionClient`](ufanet_api::SessionClient):
//!   [`setup()`](Account::setup) authenticates, fetches the doorphone list,
//!   registers entities with the host's [`EntitySink`], and spawns the
//!   periodic refresh task; [`unload()`](Account::unload) reverses all of it.
//!
//! - **[`DoorphoneController`]**: Per-doorphone [`LockEntity`]: a name, a
//!   stable unique id, a lock state that is always "unlocked", and an
//!   `open()` action whose failures are reported as an [`OpenOutcome`]
//!   instead of an error.
//!
//! - **[`DoorphoneStore`]**: Last good doorphone list with `watch`-based
//!   change notification. Failed refreshes leave it untouched.

pub mod account;
pub mod config;
pub mod doorphone;
pub mod entity;
pub mod error;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use account::{Account, ConnectionState};
pub use config::{AccountConfig, DEFAULT_REFRESH_INTERVAL, TlsVerification};
pub use doorphone::{DoorphoneController, UNIQUE_ID_PREFIX, unique_id_for};
pub use entity::{EntitySink, LockEntity, OpenOutcome};
pub use error::CoreError;
pub use store::{DoorphoneStore, SnapshotDiff};

// Re-export the portal types consumers need alongside the entities.
pub use ufanet_api::{DEFAULT_BASE_URL, Doorphone, DoorphoneId};
