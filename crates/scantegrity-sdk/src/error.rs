//! Errors raised while orchestrating a meeting verifier.

use scantegrity_core::base::PermutationError;
use scantegrity_core::schema::ModelError;
use thiserror::Error;

/// Errors raised while orchestrating a meeting verifier.
///
/// Fatal per the three-way taxonomy this verifier follows: a structural violation in the
/// underlying model, or a response artifact that cross-references a partition, D-table
/// instance, or row the committed artifacts never declared. Commitment and equation
/// mismatches are not modeled here — they are non-fatal and accumulate as [`crate::report::Finding`]s
/// on the returned [`crate::report::VerificationReport`] instead.
#[derive(Debug, Error)]
pub enum SdkError {
    /// A structural error from the election, table, or ballot model.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// A permutation operation failed while composing an opened row.
    #[error(transparent)]
    Permutation(#[from] PermutationError),
    /// A response artifact referenced a partition id the committed artifacts do not have.
    #[error("response referenced partition {partition_id}, which the committed tables do not have")]
    UnknownPartition {
        /// The referenced partition id.
        partition_id: u8,
    },
}
