//! SurrealDB repository implementations.

mod credential;

pub use credential::SurrealCredentialRepository;
