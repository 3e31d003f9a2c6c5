//! The Votifier RSA keypair and wire codec (spec §3, §4.2).

mod codec;
mod error;
pub mod keys;

pub use codec::{decrypt, parse, process, Vote, BLOCK_SIZE, GREETING};
pub use error::{KeyError, VotifierError};
pub use keys::KeyPair;
