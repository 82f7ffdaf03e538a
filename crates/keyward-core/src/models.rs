//! Domain models for Keyward.
//!
//! These are the records the persistence collaborator owns; the auth
//! crate only holds them for the duration of a call.

pub mod credential;
pub mod session;
