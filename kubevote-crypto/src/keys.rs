//! RSA keypair load/generate/persist for the Votifier protocol (spec §3,
//! §4.2).
//!
//! Ported from `original_source/votifier_service/votifier_protocol.py`'s
//! `_load_or_generate_keys`, at the 2048-bit size the Votifier protocol
//! requires.

use std::path::{Path, PathBuf};

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::KeyError;

/// 2048-bit keys, per the Votifier wire protocol (spec §3).
pub const RSA_KEY_BITS: usize = 2048;

const PRIVATE_KEY_FILE: &str = "private.pem";
const PUBLIC_KEY_FILE: &str = "public.pem";

/// A loaded or freshly generated RSA keypair.
pub struct KeyPair {
    /// The private key, used to decrypt incoming vote blocks.
    pub private_key: RsaPrivateKey,
    /// The public key, published to voting sites as a PEM string.
    pub public_key: RsaPublicKey,
}

impl KeyPair {
    /// Loads `{keys_dir}/private.pem` and `{keys_dir}/public.pem` if both
    /// exist; otherwise generates a fresh 2048-bit keypair and persists it
    /// atomically (write-to-temp-then-rename) before returning it.
    pub fn load_or_generate(keys_dir: &Path) -> Result<Self, KeyError> {
        let private_path = keys_dir.join(PRIVATE_KEY_FILE);
        let public_path = keys_dir.join(PUBLIC_KEY_FILE);

        if private_path.exists() && public_path.exists() {
            Self::load(&private_path, &public_path)
        } else {
            Self::generate_and_save(keys_dir, &private_path, &public_path)
        }
    }

    fn load(private_path: &Path, public_path: &Path) -> Result<Self, KeyError> {
        tracing::info!(dir = %private_path.parent().unwrap_or(Path::new(".")).display(), "loading existing RSA keypair");

        let private_pem = std::fs::read_to_string(private_path)?;
        let private_key = RsaPrivateKey::from_pkcs8_pem(&private_pem)?;

        let public_pem = std::fs::read_to_string(public_path)?;
        let public_key = RsaPublicKey::from_public_key_pem(&public_pem)?;

        Ok(Self {
            private_key,
            public_key,
        })
    }

    fn generate_and_save(
        keys_dir: &Path,
        private_path: &Path,
        public_path: &Path,
    ) -> Result<Self, KeyError> {
        tracing::info!("generating new RSA keypair...");

        std::fs::create_dir_all(keys_dir)?;

        let mut rng = rand::rng();
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS).map_err(KeyError::Generation)?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key.to_pkcs8_pem(LineEnding::LF)?;
        let public_pem = public_key.to_public_key_pem(LineEnding::LF)?;

        write_atomically(private_path, private_pem.as_bytes())?;
        write_atomically(public_path, public_pem.as_bytes())?;

        tracing::info!("RSA keys saved to {}", keys_dir.display());
        tracing::info!("============================================================");
        tracing::info!("PUBLIC KEY (configure this on voting sites):");
        tracing::info!("============================================================");
        for line in public_pem.lines() {
            tracing::info!("{line}");
        }
        tracing::info!("============================================================");

        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// The public key as a PEM string, for logging or slash-command display.
    pub fn public_key_pem(&self) -> Result<String, KeyError> {
        Ok(self.public_key.to_public_key_pem(LineEnding::LF)?)
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    let tmp_path = path.with_extension("pem.tmp");
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_then_reloads_the_same_keys() {
        let dir = tempdir();

        let generated = KeyPair::load_or_generate(&dir).unwrap();
        let generated_pem = generated.public_key_pem().unwrap();

        let reloaded = KeyPair::load_or_generate(&dir).unwrap();
        let reloaded_pem = reloaded.public_key_pem().unwrap();

        assert_eq!(generated_pem, reloaded_pem);

        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempdir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let unique: u64 = rand::random();
        dir.push(format!("kubevote-crypto-test-{}-{unique}", std::process::id()));
        dir
    }
}
