//! Structural errors raised while building or checking the election/table/ballot model.

use thiserror::Error;

use crate::base::{CommitmentError, PermutationError};

/// Errors raised by the election, table, and ballot schema.
#[derive(Error, Debug)]
pub enum ModelError {
    /// `typeOfAnswerChoice` held a value other than `rank`, `one_answer`, or
    /// `multiple_answers`.
    #[error("unknown answer choice type: {0}")]
    UnknownAnswerChoiceType(String),
    /// The election id in the partition-info document and the election-spec document
    /// disagreed.
    #[error("election id mismatch: partition info says {partition_info}, spec says {spec}")]
    ElectionIdMismatch {
        /// Id from the partition-info document.
        partition_info: String,
        /// Id from the election-spec document.
        spec: String,
    },
    /// No `PartitionInfo` entries were supplied, so the partition count cannot be derived.
    #[error("partition info has no entries")]
    EmptyPartitionInfo,
    /// A partition number fell outside the dense range derived from the entries.
    #[error("partition index {0} is out of range")]
    PartitionIndexOutOfRange(usize),
    /// A `(section_id, question_id)` pair had no recorded partition.
    #[error("unknown question {question_id} in section {section_id}")]
    UnknownQuestion {
        /// The section id looked up.
        section_id: String,
        /// The question id looked up.
        question_id: String,
    },
    /// A symbol id was referenced that this ballot never committed to.
    #[error("unknown symbol {symbol_id} for question {question_id}")]
    UnknownSymbol {
        /// The question id the symbol was looked up under.
        question_id: String,
        /// The symbol id looked up.
        symbol_id: u64,
    },
    /// A row id was referenced that does not exist in the named table.
    #[error("unknown row {id} in {table} table")]
    UnknownRow {
        /// Which table (`"P"`, `"D"`, or `"R"`) was being looked up.
        table: &'static str,
        /// The row id looked up.
        id: u64,
    },
    /// A permutation value did not fit in a single byte when building a commitment message.
    #[error("value {0} does not fit in a single byte for a commitment message")]
    ByteRangeOverflow(i64),
    /// A permutation operation failed.
    #[error(transparent)]
    Permutation(#[from] PermutationError),
    /// A commitment computation failed.
    #[error(transparent)]
    Commitment(#[from] CommitmentError),
}
