//! Keyward Core — domain models and the persistence contract shared by
//! the authentication and storage crates.

pub mod error;
pub mod models;
pub mod repository;
