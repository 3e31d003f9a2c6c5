//! Error taxonomy for the Votifier codec (spec §4.2/§7).

use thiserror::Error;

/// Errors produced while decrypting or parsing a Votifier vote block.
#[derive(Debug, Error)]
pub enum VotifierError {
    /// The encrypted block wasn't exactly 256 bytes.
    #[error("encrypted vote block must be 256 bytes, got {0}")]
    BlockSize(usize),

    /// PKCS#1 v1.5 decryption failed (bad padding, wrong key, garbage input).
    #[error("failed to decrypt vote block: {0}")]
    Crypto(#[from] rsa::Error),

    /// The decrypted payload wasn't valid UTF-8.
    #[error("vote payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Fewer than 5 newline-separated lines were present.
    #[error("vote payload truncated: expected at least 5 lines, got {0}")]
    Truncated(usize),

    /// The first line wasn't the literal `"VOTE"` opcode.
    #[error("unexpected vote opcode: '{0}'")]
    BadOpcode(String),
}

/// Errors produced while loading or generating the RSA keypair.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Filesystem I/O failed while reading, writing, or creating directories.
    #[error("key store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The RSA keypair itself failed to generate.
    #[error("failed to generate RSA keypair: {0}")]
    Generation(#[source] rsa::Error),

    /// An existing PEM file failed to parse.
    #[error("failed to parse key file: {0}")]
    Pkcs8(#[from] rsa::pkcs8::Error),

    /// An existing public key PEM failed to parse.
    #[error("failed to parse public key file: {0}")]
    Spki(#[from] rsa::pkcs8::spki::Error),
}
