//! The Scantegrity commitment scheme: AES-ECB-derived sub-key, double SHA-256.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

use super::hashing::{aes128_ecb_encrypt_block, sha256};

/// Size in bytes of the AES-128 key used to derive the commitment sub-key.
pub const KEY_SIZE: usize = 16;
/// Size in bytes of the AES plaintext constant used to derive the sub-key.
pub const CONSTANT_SIZE: usize = 16;

/// Errors produced while computing a commitment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommitmentError {
    /// The base64-encoded key did not decode to a byte string.
    #[error("key is not valid base64: {0}")]
    InvalidKeyEncoding(String),
    /// The decoded key was not exactly [`KEY_SIZE`] bytes.
    #[error("key must be {KEY_SIZE} bytes, got {0}")]
    InvalidKeyLength(usize),
    /// The constant was not exactly [`CONSTANT_SIZE`] bytes.
    #[error("constant must be {CONSTANT_SIZE} bytes, got {0}")]
    InvalidConstantLength(usize),
}

/// Compute a Scantegrity commitment.
///
/// `key_b64` is a base64-encoded 16-byte AES key (the salt, in protocol terms); `constant`
/// is the raw 16-byte AES plaintext shared by the whole election. The result is the
/// base64 encoding of `SHA256(message ++ sak) ++ SHA256(message ++ AES(sak, h1))`, where
/// `sak = AES(key, constant)`.
///
/// # Errors
/// Returns an error if `key_b64` does not decode to exactly [`KEY_SIZE`] bytes or
/// `constant` is not exactly [`CONSTANT_SIZE`] bytes.
pub fn commit(message: &[u8], key_b64: &str, constant: &[u8]) -> Result<String, CommitmentError> {
    let key_bytes = BASE64
        .decode(key_b64)
        .map_err(|e| CommitmentError::InvalidKeyEncoding(e.to_string()))?;
    let key: [u8; KEY_SIZE] = key_bytes
        .clone()
        .try_into()
        .map_err(|_| CommitmentError::InvalidKeyLength(key_bytes.len()))?;
    let constant_arr: [u8; CONSTANT_SIZE] = constant
        .try_into()
        .map_err(|_| CommitmentError::InvalidConstantLength(constant.len()))?;

    let sak = aes128_ecb_encrypt_block(&key, &constant_arr);

    let mut h1_preimage = Vec::with_capacity(message.len() + sak.len());
    h1_preimage.extend_from_slice(message);
    h1_preimage.extend_from_slice(&sak);
    let h1 = sha256(&h1_preimage);

    let (h1_first_half, h1_second_half) = h1.split_at(16);
    let h1_first: [u8; 16] = h1_first_half.try_into().expect("split_at(16) yields 16-byte halves");
    let h1_second: [u8; 16] = h1_second_half
        .try_into()
        .expect("split_at(16) yields 16-byte halves");
    let enc_first = aes128_ecb_encrypt_block(&sak, &h1_first);
    let enc_second = aes128_ecb_encrypt_block(&sak, &h1_second);

    let mut h2_preimage = Vec::with_capacity(message.len() + 32);
    h2_preimage.extend_from_slice(message);
    h2_preimage.extend_from_slice(&enc_first);
    h2_preimage.extend_from_slice(&enc_second);
    let h2 = sha256(&h2_preimage);

    let mut combined = Vec::with_capacity(64);
    combined.extend_from_slice(&h1);
    combined.extend_from_slice(&h2);

    Ok(BASE64.encode(combined))
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn commit_test_vector() {
        let message = hex!("3004030102000301000200030104020001");
        let key_b64 = "dWvJjTDof3YHWyOYvkIFoA==";
        let constant = b"PrincetonElectio";

        let result = commit(&message, key_b64, constant).expect("commit should succeed");

        assert_eq!(
            result,
            "EaYe2BToq529uzV7Re2vMdlqh38Wx3sjbcvnE/7qiWC6be1ytPGzQDsOotAUx2jkOpVThQo9zq+RRwDIQGxrjA=="
        );
    }

    #[test]
    fn commit_is_deterministic() {
        let message = b"hello ballot";
        let key_b64 = "dWvJjTDof3YHWyOYvkIFoA==";
        let constant = b"PrincetonElectio";

        let a = commit(message, key_b64, constant).expect("commit should succeed");
        let b = commit(message, key_b64, constant).expect("commit should succeed");
        assert_eq!(a, b);
    }

    #[test]
    fn commit_binding_smoke_message() {
        let key_b64 = "dWvJjTDof3YHWyOYvkIFoA==";
        let constant = b"PrincetonElectio";

        let a = commit(b"message-a", key_b64, constant).expect("commit should succeed");
        let b = commit(b"message-b", key_b64, constant).expect("commit should succeed");
        assert_ne!(a, b);
    }

    #[test]
    fn commit_binding_smoke_constant() {
        let key_b64 = "dWvJjTDof3YHWyOYvkIFoA==";

        let a = commit(b"message", key_b64, b"PrincetonElectio").expect("commit should succeed");
        let b = commit(b"message", key_b64, b"PrincetonElectia").expect("commit should succeed");
        assert_ne!(a, b);
    }

    #[test]
    fn commit_rejects_wrong_constant_length() {
        let key_b64 = "dWvJjTDof3YHWyOYvkIFoA==";
        let err = commit(b"message", key_b64, b"short").expect_err("constant length must be rejected");
        assert_eq!(err, CommitmentError::InvalidConstantLength(5));
    }
}
