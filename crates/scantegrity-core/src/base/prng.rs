//! Seeded, rejection-sampled challenge derivation.
//!
//! Reverse-engineered from the reference implementation's `prng` and
//! `generate_random_int_list`, which derive challenge row ids from a SHA-1 hash of the
//! seed concatenated with a decimal counter.

use super::hashing::sha1_hex;

/// Generate a pseudo-random integer in `[0, modulus)` from `seed` and `index`.
///
/// Computes `h = SHA1(seed ++ decimal(index))`, interpreted as a big-endian 160-bit
/// unsigned integer across all 40 hex digits, and returns `h mod modulus`.
///
/// # Panics
/// Panics if `modulus` is zero.
#[must_use]
#[allow(
    clippy::arithmetic_side_effects,
    reason = "digit accumulation is done in u128 while modulus fits u64, so it cannot overflow"
)]
pub fn prng(seed: &[u8], index: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "modulus must be positive");

    let mut hash_input = Vec::with_capacity(seed.len() + 20);
    hash_input.extend_from_slice(seed);
    hash_input.extend_from_slice(index.to_string().as_bytes());

    let hex_digest = sha1_hex(&hash_input);
    let modulus_u128 = u128::from(modulus);

    let mut acc: u128 = 0;
    for c in hex_digest.chars() {
        let digit = u128::from(c.to_digit(16).expect("sha1 hex digest is all hex digits"));
        acc = (acc * 16 + digit) % modulus_u128;
    }

    u64::try_from(acc).expect("result is reduced modulo a u64 modulus")
}

/// Generate `n` distinct pseudo-random integers in `[0, modulus)` from `seed`, in the order
/// they first appear under rejection sampling.
///
/// Starting from `counter = 0`, repeatedly compute `prng(seed, counter, modulus)`; append it
/// if not already present, otherwise discard and advance `counter`. Stops once `n` distinct
/// values have been collected.
///
/// # Panics
/// Panics if `n > modulus` (there are not enough distinct residues to satisfy the request),
/// or if `modulus` is zero.
#[must_use]
pub fn generate_random_int_list(seed: &[u8], modulus: u64, n: usize) -> Vec<u64> {
    assert!(
        u64::try_from(n).is_ok_and(|n64| n64 <= modulus),
        "cannot draw {n} distinct values modulo {modulus}"
    );

    let mut output = Vec::with_capacity(n);
    let mut counter: u64 = 0;
    while output.len() < n {
        let candidate = prng(seed, counter, modulus);
        counter = counter.checked_add(1).expect("counter overflow");
        if !output.contains(&candidate) {
            output.push(candidate);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn prng_matches_frozen_reference_value() {
        // SHA1("abc0") = 062c648aaf68174757c50ab1aeebb61e059c1d1b, mod 1000 = 635.
        assert_eq!(prng(b"abc", 0, 1000), 635);
    }

    #[test]
    fn prng_is_deterministic() {
        assert_eq!(prng(b"seed", 7, 500), prng(b"seed", 7, 500));
    }

    #[test]
    fn prng_varies_with_index() {
        let a = prng(b"seed", 0, 1_000_000);
        let b = prng(b"seed", 1, 1_000_000);
        assert_ne!(a, b);
    }

    #[test]
    fn generate_random_int_list_is_distinct_and_in_range() {
        let list = generate_random_int_list(b"ballot-box-seed", 37, 10);
        assert_eq!(list.len(), 10);
        let unique: HashSet<_> = list.iter().copied().collect();
        assert_eq!(unique.len(), 10);
        assert!(list.iter().all(|&v| v < 37));
    }

    #[test]
    fn generate_random_int_list_full_range_is_a_permutation_of_residues() {
        let list = generate_random_int_list(b"seed", 16, 16);
        let mut sorted = list.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..16).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "cannot draw")]
    fn generate_random_int_list_rejects_n_greater_than_modulus() {
        let _ = generate_random_int_list(b"seed", 3, 4);
    }
}
