//! Permutation algebra over partitioned, tree-structured permutations.
//!
//! Grounded on `data.py`'s `Permutation`, `walk_permutation_map`, `split_permutations`, and
//! `compose_lists_of_permutations`.

use thiserror::Error;

/// Errors raised by permutation operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PermutationError {
    /// An index was neither `-1` nor within `[0, n)` of the permutation's length.
    #[error("index {0} is out of range for a permutation")]
    IndexOutOfRange(i64),
    /// The values did not form a bijection on `[0, n)`, so no inverse exists.
    #[error("values do not form a bijection on [0, n)")]
    NotBijection,
    /// `split` consumed a different number of integers than were supplied.
    #[error("split consumed {expected} integers but {actual} were supplied")]
    SplitLengthMismatch {
        /// Number of integers the partition map's leaf counts sum to.
        expected: usize,
        /// Number of integers actually supplied.
        actual: usize,
    },
    /// The leaf counts in a partition map overflowed while being accumulated.
    #[error("partitioned leaf counts overflow when accumulated")]
    SplitOverflow,
    /// `compose_lists` was called with two lists of different lengths.
    #[error("compose_lists requires equal-length lists, got {left} and {right}")]
    ComposeLengthMismatch {
        /// Length of the left-hand list.
        left: usize,
        /// Length of the right-hand list.
        right: usize,
    },
}

/// A finite sequence that is (or is claimed to be) a bijection on `[0, n)`.
///
/// The sentinel value `-1` represents "no position" and is a fixed point under [`apply`]:
/// `π[-1] = -1`. Construction does not itself validate bijectivity — some permutation
/// fields (`p3`, `d3`) carry voter-selection encodings with `-1` padding rather than true
/// permutations, so the check is opt-in via [`Permutation::validate_bijection`].
///
/// [`apply`]: Permutation::apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    values: Vec<i64>,
}

impl Permutation {
    /// Wrap a raw array representation as a permutation.
    #[must_use]
    pub const fn new(values: Vec<i64>) -> Self {
        Self { values }
    }

    /// Length `n` of the permutation's domain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether this permutation has an empty domain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw array representation.
    #[must_use]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Look up position `i`. `π[-1]` is always `-1`.
    ///
    /// # Errors
    /// Returns an error if `i` is neither `-1` nor a valid index into this permutation.
    pub fn apply(&self, i: i64) -> Result<i64, PermutationError> {
        if i == -1 {
            return Ok(-1);
        }
        let idx = usize::try_from(i).map_err(|_| PermutationError::IndexOutOfRange(i))?;
        self.values
            .get(idx)
            .copied()
            .ok_or(PermutationError::IndexOutOfRange(i))
    }

    /// Compose `self` with `other`, reading left to right: `(self ∘ other)[i] = other[self[i]]`.
    ///
    /// # Errors
    /// Returns an error if any lookup in `self` or `other` is out of range.
    pub fn compose(&self, other: &Self) -> Result<Self, PermutationError> {
        let mut values = Vec::with_capacity(self.len());
        for i in 0..self.values.len() {
            let i_i64 = i64::try_from(i).expect("permutation length fits in i64");
            let mid = self.apply(i_i64)?;
            values.push(other.apply(mid)?);
        }
        Ok(Self::new(values))
    }

    /// Invert this permutation: `π⁻¹[π[i]] = i`.
    ///
    /// # Errors
    /// Returns [`PermutationError::NotBijection`] if the values are not a bijection on
    /// `[0, n)`.
    pub fn invert(&self) -> Result<Self, PermutationError> {
        let n = self.values.len();
        let mut inverted: Vec<Option<i64>> = vec![None; n];
        for (i, &value) in self.values.iter().enumerate() {
            let idx = usize::try_from(value).map_err(|_| PermutationError::NotBijection)?;
            let slot = inverted.get_mut(idx).ok_or(PermutationError::NotBijection)?;
            if slot.is_some() {
                return Err(PermutationError::NotBijection);
            }
            let i_i64 = i64::try_from(i).map_err(|_| PermutationError::NotBijection)?;
            *slot = Some(i_i64);
        }
        inverted
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .map(Self::new)
            .ok_or(PermutationError::NotBijection)
    }

    /// Map a list of values through this permutation.
    ///
    /// # Errors
    /// Returns an error if any element of `list` is out of range.
    pub fn permute_list(&self, list: &[i64]) -> Result<Vec<i64>, PermutationError> {
        list.iter().map(|&v| self.apply(v)).collect()
    }

    /// Whether the values form a bijection on `[0, n)` (ignoring the `-1` sentinel, which
    /// never appears in a well-formed permutation array).
    #[must_use]
    pub fn is_bijection(&self) -> bool {
        let n = self.values.len();
        let mut seen = vec![false; n];
        for &value in &self.values {
            let Ok(idx) = usize::try_from(value) else {
                return false;
            };
            let Some(slot) = seen.get_mut(idx) else {
                return false;
            };
            if *slot {
                return false;
            }
            *slot = true;
        }
        seen.into_iter().all(|b| b)
    }

    /// Validate that this permutation is a bijection, per the invariant in §3.
    ///
    /// # Errors
    /// Returns [`PermutationError::NotBijection`] if it is not.
    pub fn validate_bijection(&self) -> Result<(), PermutationError> {
        if self.is_bijection() {
            Ok(())
        } else {
            Err(PermutationError::NotBijection)
        }
    }
}

/// A partition map: for each partition, the leaf size (number of answers, or maximum
/// selections, depending on context) of each question in that partition, in partition
/// order.
pub type PartitionMap = Vec<Vec<usize>>;

/// A tree of permutations with the same shape as a [`PartitionMap`].
pub type PermTree = Vec<Vec<Permutation>>;

/// Split a concatenated stream of integers into a tree of permutations shaped like `map`.
///
/// Performs a deterministic depth-first traversal, consuming exactly `Σ kᵢ` integers from
/// `flat`.
///
/// # Errors
/// Returns [`PermutationError::SplitLengthMismatch`] if `flat` has a different length than
/// the sum of `map`'s leaf counts, or [`PermutationError::SplitOverflow`] if those leaf
/// counts overflow while being accumulated.
pub fn split(flat: &[i64], map: &PartitionMap) -> Result<PermTree, PermutationError> {
    let mut cursor = 0_usize;
    let mut result = Vec::with_capacity(map.len());
    for partition in map {
        let mut row = Vec::with_capacity(partition.len());
        for &leaf_size in partition {
            let end = cursor
                .checked_add(leaf_size)
                .ok_or(PermutationError::SplitOverflow)?;
            let slice = flat
                .get(cursor..end)
                .ok_or(PermutationError::SplitLengthMismatch {
                    expected: end,
                    actual: flat.len(),
                })?;
            row.push(Permutation::new(slice.to_vec()));
            cursor = end;
        }
        result.push(row);
    }
    if cursor == flat.len() {
        Ok(result)
    } else {
        Err(PermutationError::SplitLengthMismatch {
            expected: cursor,
            actual: flat.len(),
        })
    }
}

/// Split a concatenated stream of integers against the leaf counts of a single partition
/// (used for D-table fields, which are scoped to one partition rather than the whole
/// election).
///
/// # Errors
/// Same as [`split`].
pub fn split_single_partition(
    flat: &[i64],
    leaf_sizes: &[usize],
) -> Result<Vec<Permutation>, PermutationError> {
    let map = vec![leaf_sizes.to_vec()];
    split(flat, &map)?
        .into_iter()
        .next()
        .ok_or(PermutationError::SplitLengthMismatch {
            expected: 0,
            actual: flat.len(),
        })
}

/// Compose two equal-length lists of permutations element-wise.
///
/// # Errors
/// Returns [`PermutationError::ComposeLengthMismatch`] if the lists differ in length, or
/// any error [`Permutation::compose`] would return for a mismatched pair.
pub fn compose_lists(
    left: &[Permutation],
    right: &[Permutation],
) -> Result<Vec<Permutation>, PermutationError> {
    if left.len() != right.len() {
        return Err(PermutationError::ComposeLengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    left.iter()
        .zip(right.iter())
        .map(|(a, b)| a.compose(b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_sentinel_is_fixed_point() {
        let p = Permutation::new(vec![2, 0, 1]);
        assert_eq!(p.apply(-1).expect("sentinel always applies"), -1);
    }

    #[test]
    fn apply_rejects_out_of_range_index() {
        let p = Permutation::new(vec![2, 0, 1]);
        assert!(p.apply(3).is_err());
    }

    #[test]
    fn compose_matches_reading_direction() {
        // pi = [1, 2, 0] (0->1, 1->2, 2->0), sigma = [2, 0, 1] (0->2, 1->0, 2->1)
        // (pi ∘ sigma)[i] = sigma[pi[i]]
        let pi = Permutation::new(vec![1, 2, 0]);
        let sigma = Permutation::new(vec![2, 0, 1]);
        let composed = pi.compose(&sigma).expect("compose should succeed");
        assert_eq!(composed.values(), &[0, 1, 2]);
    }

    #[test]
    fn invert_round_trips() {
        let p = Permutation::new(vec![2, 0, 3, 1]);
        let inv = p.invert().expect("p is a bijection");
        let back = inv.invert().expect("inverse of a bijection is a bijection");
        assert_eq!(p, back);
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        let p = Permutation::new(vec![2, 0, 3, 1]);
        let inv = p.invert().expect("p is a bijection");
        let identity = p.compose(&inv).expect("compose should succeed");
        assert_eq!(identity.values(), &[0, 1, 2, 3]);
    }

    #[test]
    fn invert_rejects_non_bijection() {
        let p = Permutation::new(vec![0, 0, 1]);
        let err = p.invert().expect_err("not a bijection");
        assert_eq!(err, PermutationError::NotBijection);
    }

    #[test]
    fn split_matches_worked_example() {
        let flat: Vec<i64> = vec![0, 0, 1, 1, 0];
        let map: PartitionMap = vec![vec![1], vec![2], vec![2]];
        let tree = split(&flat, &map).expect("lengths agree");

        assert_eq!(tree.len(), 3);
        let first = tree.first().expect("partition 0 present");
        let second = tree.get(1).expect("partition 1 present");
        let third = tree.get(2).expect("partition 2 present");
        assert_eq!(
            first.first().expect("question 0 present").values(),
            &[0]
        );
        assert_eq!(
            second.first().expect("question 0 present").values(),
            &[0, 1]
        );
        assert_eq!(
            third.first().expect("question 0 present").values(),
            &[1, 0]
        );
    }

    #[test]
    fn split_rejects_length_mismatch() {
        let flat: Vec<i64> = vec![0, 0, 1, 1];
        let map: PartitionMap = vec![vec![1], vec![2], vec![2]];
        assert!(split(&flat, &map).is_err());
    }

    #[test]
    fn split_totality_round_trips_via_concatenation() {
        let flat: Vec<i64> = vec![1, 0, 0, 1, 2, 2, 1, 0];
        let map: PartitionMap = vec![vec![2], vec![3, 3]];
        let tree = split(&flat, &map).expect("lengths agree");

        let mut rejoined = Vec::new();
        for partition in &tree {
            for perm in partition {
                rejoined.extend_from_slice(perm.values());
            }
        }
        assert_eq!(rejoined, flat);
    }

    #[test]
    fn split_single_partition_matches_full_split() {
        let flat: Vec<i64> = vec![0, 1, 1, 0];
        let leaves = vec![2, 2];
        let via_single = split_single_partition(&flat, &leaves).expect("lengths agree");
        let via_full = split(&flat, &vec![leaves]).expect("lengths agree");
        let via_full_first = via_full.first().expect("one partition present");
        assert_eq!(&via_single, via_full_first);
    }

    #[test]
    fn compose_lists_rejects_length_mismatch() {
        let a = vec![Permutation::new(vec![0, 1])];
        let b = vec![Permutation::new(vec![0, 1]), Permutation::new(vec![1, 0])];
        assert!(compose_lists(&a, &b).is_err());
    }

    #[test]
    fn compose_lists_applies_elementwise() {
        let a = vec![Permutation::new(vec![1, 0]), Permutation::new(vec![0, 1])];
        let b = vec![Permutation::new(vec![1, 0]), Permutation::new(vec![1, 0])];
        let composed = compose_lists(&a, &b).expect("compose_lists should succeed");
        assert_eq!(
            composed.first().expect("element 0 present").values(),
            &[0, 1]
        );
        assert_eq!(
            composed.get(1).expect("element 1 present").values(),
            &[1, 0]
        );
    }
}
