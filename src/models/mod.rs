//! Data models for chat turns and avatar identities

mod avatar;
mod message;

pub use avatar::*;
pub use message::*;
