//! The remote-command client: a persistent, authenticated, length-prefixed
//! binary request/response session used by every other subsystem to drive
//! the game (spec §4.1).

mod client;
mod error;
pub mod packet;

pub use client::RcClient;
pub use error::RcError;
