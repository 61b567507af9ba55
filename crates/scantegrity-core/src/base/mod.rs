//! Foundational cryptographic primitives shared across the verifier.

mod commitment;
mod hashing;
mod permutation;
mod prng;

pub use commitment::{CONSTANT_SIZE, CommitmentError, KEY_SIZE, commit};
pub use hashing::{aes128_ecb_encrypt_block, sha1_hex, sha256};
pub use permutation::{
    PartitionMap, PermTree, Permutation, PermutationError, compose_lists, split,
    split_single_partition,
};
pub use prng::{generate_random_int_list, prng};
