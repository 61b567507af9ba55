//! Accumulated, non-fatal verification outcomes.
//!
//! Grounded on the accumulate-then-summarize pattern in
//! `zair-sdk/src/commands/claim_submission_verify.rs`: a verifier finishes checking
//! everything it can and reports every disagreement it found, rather than aborting at the
//! first one. Unlike that command (which just counts invalid entries and `ensure!`s at the
//! end), each disagreement here is specific enough to point at the offending row.

use std::collections::BTreeSet;

use thiserror::Error;

/// One specific, non-fatal disagreement found while verifying a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Finding {
    /// The regenerated challenge row ids did not match the ones declared in the artifact.
    #[error("challenge set mismatch: regenerated {expected:?}, declared {actual:?}")]
    ChallengeSetMismatch {
        /// The row ids regenerated from the published random seed.
        expected: BTreeSet<u64>,
        /// The row ids actually declared as challenged.
        actual: BTreeSet<u64>,
    },
    /// The opened P-table row ids did not match the challenge set.
    #[error("opened P-table rows {actual:?} do not match the challenge set {expected:?}")]
    RowSetMismatch {
        /// The challenge row ids.
        expected: BTreeSet<u64>,
        /// The row ids actually opened.
        actual: BTreeSet<u64>,
    },
    /// A P-row's `c1`/`c2` commitments did not re-verify against the revealed permutations.
    #[error("P-row {row_id} commitment does not re-verify")]
    PRowCommitmentMismatch {
        /// The row id.
        row_id: u64,
    },
    /// A D-row's `cl`/`cr` commitments did not re-verify against the revealed permutations.
    #[error("D-row {row_id} in partition {partition_id} instance {instance_id} commitment does not re-verify")]
    DRowCommitmentMismatch {
        /// The partition id.
        partition_id: u8,
        /// The D-table instance id.
        instance_id: u8,
        /// The row id.
        row_id: u64,
    },
    /// The set of `pid`s referenced by an opened D table did not match the opened P-row ids.
    #[error("D table in partition {partition_id} instance {instance_id} references a pid set that disagrees with the opened P rows")]
    DRowPidSetMismatch {
        /// The partition id.
        partition_id: u8,
        /// The D-table instance id.
        instance_id: u8,
    },
    /// The D-side and P-side permutation compositions disagreed for an opened row.
    #[error("permutation composition mismatch for pid {pid} in partition {partition_id} instance {instance_id}, D-row {row_id}")]
    PermutationCompositionMismatch {
        /// The partition id.
        partition_id: u8,
        /// The D-table instance id.
        instance_id: u8,
        /// The D-row id.
        row_id: u64,
        /// The P-row id (`pid`) the D-row referenced.
        pid: u64,
    },
    /// A response artifact opened a partition the committed artifacts do not have.
    #[error("response opened partition {partition_id}, absent from the committed tables")]
    MissingResponsePartition {
        /// The partition id.
        partition_id: u8,
    },
    /// A response artifact opened a D-table instance the committed artifacts do not have.
    #[error("response opened instance {instance_id} of partition {partition_id}, absent from the committed tables")]
    MissingResponseInstance {
        /// The partition id.
        partition_id: u8,
        /// The D-table instance id.
        instance_id: u8,
    },
    /// A row was opened in both Meeting 2 and Meeting 3, violating cut-and-choose soundness.
    #[error("row {row_id} in {table} table was opened in both Meeting 2 and Meeting 3")]
    OverlappingReveal {
        /// Which table (`"P"` or `"D"`) the row belongs to.
        table: &'static str,
        /// The row id opened twice.
        row_id: u64,
    },
    /// An R-row's commitment or shape did not re-verify.
    #[error("R-row {row_id} in partition {partition_id} does not re-verify")]
    RRowMismatch {
        /// The partition id.
        partition_id: u8,
        /// The row id.
        row_id: u64,
    },
    /// A partition's declared D-table instance count disagreed with the election header.
    #[error("partition {partition_id} has {actual} D-table instance(s), expected {expected}")]
    InstanceCountMismatch {
        /// The partition id.
        partition_id: u8,
        /// The instance count the election header declares.
        expected: usize,
        /// The instance count the committed tables actually have.
        actual: usize,
    },
}

/// The accumulated outcome of verifying one meeting.
#[derive(Debug, Default)]
pub struct VerificationReport {
    /// Which meeting this report is for (1, 2, or 3).
    pub meeting: u8,
    /// Every non-fatal disagreement found, in the order it was found.
    pub findings: Vec<Finding>,
    /// Whether the regenerated challenge row ids matched the declared ones, for meetings
    /// that check challenge reproducibility (Meeting 2 and, where applicable, Meeting 3).
    pub challenges_match_randomness: Option<bool>,
    /// Whether Meeting 3's structural tally consistency check passed (see the Meeting-3
    /// Open Question decision in `DESIGN.md`).
    pub tally_consistent: Option<bool>,
}

impl VerificationReport {
    /// Start an empty report for the given meeting number.
    #[must_use]
    pub fn new(meeting: u8) -> Self {
        Self {
            meeting,
            ..Self::default()
        }
    }

    /// Record a finding, logging it as a warning.
    pub fn push(&mut self, finding: Finding) {
        tracing::warn!(meeting = self.meeting, %finding, "verification finding");
        self.findings.push(finding);
    }

    /// Whether this report found no disagreements at all.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.findings.is_empty()
            && self.challenges_match_randomness != Some(false)
            && self.tally_consistent != Some(false)
    }

    /// A human-readable summary line, suitable for CLI output.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_success() {
            format!("Meeting {} Successful: no findings", self.meeting)
        } else {
            format!(
                "Meeting {} FAILED: {} finding(s)",
                self.meeting,
                self.findings.len()
            )
        }
    }
}
