//! Data models for the TeamUp recruitment backend.
//!
//! Serialized with camelCase field names to match the web client.

mod member;
mod role;
mod stack;
mod team;
mod user;

pub use member::*;
pub use role::*;
pub use stack::*;
pub use team::*;
pub use user::*;
