//! Votifier protocol codec: greeting, block decryption, vote parsing
//! (spec §3, §4.2).

use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};

use crate::error::VotifierError;

/// The exact greeting sent immediately on accept (spec §4.2, §6).
pub const GREETING: &[u8] = b"VOTIFIER 2.0\n";

/// The fixed size of an encrypted vote block (spec §3).
pub const BLOCK_SIZE: usize = 256;

const OPCODE: &str = "VOTE";
const EXPECTED_LINES: usize = 5;

/// An immutable vote record decoded from a Votifier block (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    /// The voting site's service name.
    pub service: String,
    /// The player who voted.
    pub user: String,
    /// The voting site's opaque address string.
    pub address: String,
    /// An opaque timestamp string, passed through verbatim.
    pub timestamp: String,
}

/// Decrypts a 256-byte PKCS#1 v1.5 RSA block.
///
/// # Errors
/// [`VotifierError::BlockSize`] if `block.len() != 256`;
/// [`VotifierError::Crypto`] on a padding or key mismatch.
pub fn decrypt(private_key: &RsaPrivateKey, block: &[u8]) -> Result<Vec<u8>, VotifierError> {
    if block.len() != BLOCK_SIZE {
        return Err(VotifierError::BlockSize(block.len()));
    }

    Ok(private_key.decrypt(Pkcs1v15Encrypt, block)?)
}

/// Parses a decrypted 5-line vote payload.
///
/// Trailing bytes after the 5th line are tolerated. Each of the first 5
/// lines is trimmed before use.
///
/// # Errors
/// [`VotifierError::Encoding`] if the bytes aren't valid UTF-8;
/// [`VotifierError::Truncated`] if fewer than 5 lines are present;
/// [`VotifierError::BadOpcode`] if line 0 isn't `"VOTE"`.
pub fn parse(plain: &[u8]) -> Result<Vote, VotifierError> {
    let text = String::from_utf8(plain.to_vec())?;
    let lines: Vec<&str> = text.split('\n').collect();

    if lines.len() < EXPECTED_LINES {
        return Err(VotifierError::Truncated(lines.len()));
    }

    let opcode = lines[0].trim();
    if opcode != OPCODE {
        return Err(VotifierError::BadOpcode(opcode.to_string()));
    }

    Ok(Vote {
        service: lines[1].trim().to_string(),
        user: lines[2].trim().to_string(),
        address: lines[3].trim().to_string(),
        timestamp: lines[4].trim().to_string(),
    })
}

/// Decrypts then parses a vote block in one step.
pub fn process(private_key: &RsaPrivateKey, block: &[u8]) -> Result<Vote, VotifierError> {
    parse(&decrypt(private_key, block)?)
}
