//! Domain models for Bazaar.
//!
//! These are the core types shared across all crates.

pub mod credential;
