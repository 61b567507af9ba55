//! Meeting 1: the election header and printed-ballot commitments are ingested, but nothing
//! is opened yet, so there is no commitment to re-verify. Only structural consistency
//! between the election header and the committed artifacts is checked.

use std::collections::BTreeMap;

use scantegrity_core::schema::{Ballot, Election};
use scantegrity_xml::parse::CommittedTables;

use crate::SdkError;
use crate::report::{Finding, VerificationReport};

/// Confirm Meeting-1 outputs are structurally consistent with the election header.
///
/// Meeting 1 performs no commitment check of its own: the P and D tables it receives are
/// still closed. This is purely a shape check. A missing or unexpected partition is a fatal
/// structural error, since nothing downstream can be verified without it; a D-table instance
/// count that disagrees with the header is recorded as a non-fatal [`Finding`] instead, since
/// Meeting 1 produces no cryptographic check of its own beyond fingerprinting.
///
/// # Errors
/// Returns [`SdkError::UnknownPartition`] if the committed tables declare a partition the
/// election header doesn't, or are missing one the header declares.
pub fn verify(
    election: &Election,
    tables: &CommittedTables,
    ballots: &BTreeMap<u64, Ballot>,
) -> Result<VerificationReport, SdkError> {
    let expected_partitions: Vec<u8> = (0..election.num_partitions())
        .map(|n| u8::try_from(n).unwrap_or(u8::MAX))
        .collect();

    let mut report = VerificationReport::new(1);
    report.tally_consistent = None;
    report.challenges_match_randomness = None;

    for &partition_id in &expected_partitions {
        let Some(instances) = tables.partitions.get(&partition_id) else {
            return Err(SdkError::UnknownPartition { partition_id });
        };
        if instances.len() != election.num_d_tables {
            report.push(Finding::InstanceCountMismatch {
                partition_id,
                expected: election.num_d_tables,
                actual: instances.len(),
            });
        }
    }
    for &partition_id in tables.partitions.keys() {
        if !expected_partitions.contains(&partition_id) {
            return Err(SdkError::UnknownPartition { partition_id });
        }
    }

    tracing::info!(
        num_ballots = ballots.len(),
        num_partitions = tables.partitions.len(),
        "Meeting 1 header is structurally consistent"
    );
    Ok(report)
}
