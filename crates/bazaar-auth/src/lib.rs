//! Bazaar Auth — password hashing, HS256 bearer tokens, bearer header
//! extraction and the dual-path (token or credentials) login flow.

pub mod bearer;
pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use bearer::{AuthResult, Identity};
pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginCredentials, LoginInput, LoginOutput, LoginPath};
pub use token::TokenClaims;
