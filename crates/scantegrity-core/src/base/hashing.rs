//! SHA-1, SHA-256, and single-block AES-128-ECB wrappers.

use aes::Aes128;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use sha1::Sha1;
use sha2::{Digest as _, Sha256};

/// Lowercase hex-encoded SHA-1 digest of `message`.
#[must_use]
pub fn sha1_hex(message: &[u8]) -> String {
    hex::encode(Sha1::digest(message))
}

/// Raw 32-byte SHA-256 digest of `message`.
#[must_use]
pub fn sha256(message: &[u8]) -> [u8; 32] {
    Sha256::digest(message).into()
}

/// Encrypt a single 16-byte block with AES-128 in ECB mode (no padding).
///
/// `key` and `plaintext` must each be exactly 16 bytes.
#[must_use]
pub fn aes128_ecb_encrypt_block(key: &[u8; 16], plaintext: &[u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut block = *GenericArray::from_slice(plaintext);
    cipher.encrypt_block(&mut block);
    block.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_hex_matches_known_vector() {
        // SHA1("abc0") frozen from a reference computation.
        assert_eq!(
            sha1_hex(b"abc0"),
            "062c648aaf68174757c50ab1aeebb61e059c1d1b"
        );
    }

    #[test]
    fn sha256_is_32_bytes_and_deterministic() {
        let a = sha256(b"hello world");
        let b = sha256(b"hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn aes_ecb_block_is_reversible_length() {
        let key = [0_u8; 16];
        let plaintext = *b"PrincetonElectio";
        let cipher_text = aes128_ecb_encrypt_block(&key, &plaintext);
        assert_eq!(cipher_text.len(), 16);
        assert_ne!(cipher_text, plaintext);
    }
}
