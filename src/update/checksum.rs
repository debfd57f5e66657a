use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use super::error::UpdateError;

/// Hex-encoded SHA-256 of an in-memory payload
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hex-encoded SHA-256 of a file, read in 8 KiB chunks
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Check a downloaded payload against the advertised checksum.
pub fn verify(payload: &[u8], expected: &str) -> Result<(), UpdateError> {
    let actual = sha256_hex(payload);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(UpdateError::ChecksumMismatch {
            expected: expected.trim().to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn test_sha256_file_matches_memory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.bin");
        // Spans several read chunks
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        assert_eq!(sha256_file(&path).unwrap(), sha256_hex(&data));
    }

    #[test]
    fn test_verify() {
        assert!(verify(b"hello", HELLO_SHA256).is_ok());
        assert!(verify(b"hello", &HELLO_SHA256.to_uppercase()).is_ok());
        assert!(matches!(
            verify(b"hellO", HELLO_SHA256),
            Err(UpdateError::ChecksumMismatch { .. })
        ));
    }
}
