//! SurrealDB repository implementations.

mod credential;
mod session;

pub use credential::SurrealCredentialRepository;
pub use session::SurrealSessionRepository;
