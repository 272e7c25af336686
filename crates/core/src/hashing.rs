//! Content digests shared by local extraction and the metadata server, so a
//! hash computed on either side compares equal for equal bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl From<&str> for DigestAlgorithm {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "blake3" => DigestAlgorithm::Blake3,
            _ => DigestAlgorithm::Sha256,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::Sha256 => f.write_str("sha256"),
            DigestAlgorithm::Blake3 => f.write_str("blake3"),
        }
    }
}

/// Lowercase hex digest of `bytes`.
pub fn digest(bytes: &[u8], algorithm: DigestAlgorithm) -> String {
    match algorithm {
        DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
        DigestAlgorithm::Blake3 => blake3::hash(bytes).to_hex().to_string(),
    }
}

/// Streams a file through the digest without loading it whole.
pub fn digest_file(path: &Path, algorithm: DigestAlgorithm) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = [0u8; 8192];
    match algorithm {
        DigestAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hex::encode(hasher.finalize()))
        }
        DigestAlgorithm::Blake3 => {
            let mut hasher = blake3::Hasher::new();
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hasher.finalize().to_hex().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            digest(b"abc", DigestAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digests_are_lowercase_hex_of_fixed_length() {
        let sha = digest(b"hello", DigestAlgorithm::Sha256);
        let b3 = digest(b"hello", DigestAlgorithm::Blake3);
        assert_eq!(sha.len(), 64);
        assert_eq!(b3.len(), 64);
        assert!(sha.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(sha, b3);
    }

    #[test]
    fn file_digest_equals_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        let bytes: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &bytes).unwrap();

        for algo in [DigestAlgorithm::Sha256, DigestAlgorithm::Blake3] {
            assert_eq!(digest_file(&path, algo).unwrap(), digest(&bytes, algo));
        }
    }

    #[test]
    fn algorithm_parses_loosely() {
        assert_eq!(DigestAlgorithm::from("BLAKE3"), DigestAlgorithm::Blake3);
        assert_eq!(DigestAlgorithm::from("sha256"), DigestAlgorithm::Sha256);
        assert_eq!(DigestAlgorithm::from(""), DigestAlgorithm::Sha256);
    }
}
