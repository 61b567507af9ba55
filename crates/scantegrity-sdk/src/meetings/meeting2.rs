//! Meeting 2, the central proof: challenge reproducibility, row-set agreement, P/D-row
//! reveals, and the permutation-composition equation linking a D-row to its P-row.
//!
//! Grounded on `meeting2.py`'s `verify_open_p_and_d_tables` and `verify`.

use std::collections::{BTreeMap, BTreeSet};

use scantegrity_core::base::{Permutation, compose_lists, generate_random_int_list};
use scantegrity_core::schema::{DTable, Election, PTable};

use crate::SdkError;
use crate::report::{Finding, VerificationReport};

/// Verify the central Meeting-2 proof.
///
/// `challenge_p_table` is `MeetingTwoIn.xml`'s declared challenge rows (only the row ids are
/// used). `response_p_table`/`response_partitions` are `MeetingTwoOut.xml`'s opened rows.
/// `committed_p_table`/`committed_partitions` are the closed commitments from
/// `MeetingOneOut.xml`. `random_data` is the raw bytes of the published random-seed
/// artifact.
///
/// # Errors
/// Propagates [`SdkError`] for structural violations: a response row referencing a
/// partition or D-table instance the committed tables don't have, or a non-bijective
/// permutation encountered while inverting. Commitment and equation disagreements are
/// non-fatal: they are accumulated as [`Finding`]s on the returned report instead.
pub fn verify(
    election: &Election,
    committed_p_table: &PTable,
    committed_partitions: &BTreeMap<u8, BTreeMap<u8, DTable>>,
    challenge_p_table: &PTable,
    response_p_table: &PTable,
    response_partitions: &BTreeMap<u8, BTreeMap<u8, DTable>>,
    random_data: &[u8],
) -> Result<VerificationReport, SdkError> {
    let mut report = VerificationReport::new(2);

    let challenge_row_ids: BTreeSet<u64> = challenge_p_table.rows().keys().copied().collect();
    let challenge_count = challenge_row_ids.len();
    let mut seed = random_data.to_vec();
    seed.extend_from_slice(&election.constant);
    let regenerated: BTreeSet<u64> =
        generate_random_int_list(&seed, election.num_ballots, challenge_row_ids.len())
            .into_iter()
            .collect();
    let challenges_match_randomness = regenerated == challenge_row_ids;
    report.challenges_match_randomness = Some(challenges_match_randomness);
    if !challenges_match_randomness {
        report.push(Finding::ChallengeSetMismatch {
            expected: regenerated,
            actual: challenge_row_ids.clone(),
        });
    }

    let response_row_ids: BTreeSet<u64> = response_p_table.rows().keys().copied().collect();
    if response_row_ids != challenge_row_ids {
        report.push(Finding::RowSetMismatch {
            expected: challenge_row_ids,
            actual: response_row_ids.clone(),
        });
    }

    for (&row_id, row) in response_p_table.rows() {
        let ok = committed_p_table.check_reveal(row_id, &row.p1, &row.s1, &row.p2, &row.s2, &election.constant)?;
        if !ok {
            report.push(Finding::PRowCommitmentMismatch { row_id });
        }
    }

    let partition_map = election.partition_map();
    let partition_map_choices = election.partition_map_choices();

    for (&partition_id, committed_instances) in committed_partitions {
        let Some(response_instances) = response_partitions.get(&partition_id) else {
            report.push(Finding::MissingResponsePartition { partition_id });
            continue;
        };
        let partition_index = usize::from(partition_id);
        let partition_leaves = partition_map.get(partition_index).cloned().unwrap_or_default();
        let partition_leaves_choices = partition_map_choices.get(partition_index).cloned().unwrap_or_default();

        for (&instance_id, committed_d_table) in committed_instances {
            let Some(response_d_table) = response_instances.get(&instance_id) else {
                report.push(Finding::MissingResponseInstance { partition_id, instance_id });
                continue;
            };

            let mut opened_pids = BTreeSet::new();
            for (&row_id, row) in response_d_table.rows() {
                let ok = committed_d_table.check_reveal(
                    row_id,
                    row.pid,
                    &row.d2,
                    &row.sl,
                    row.rid,
                    &row.d4,
                    &row.sr,
                    &election.constant,
                )?;
                if !ok {
                    report.push(Finding::DRowCommitmentMismatch { partition_id, instance_id, row_id });
                }
                opened_pids.insert(row.pid);
            }
            if opened_pids != response_row_ids {
                report.push(Finding::DRowPidSetMismatch { partition_id, instance_id });
            }

            for (&row_id, row) in response_d_table.rows() {
                let d_perms = response_d_table.permutations(row_id, &partition_leaves, &partition_leaves_choices)?;
                let (d_left, _d_mid, d_right) = &*d_perms;
                let d_composed = compose_lists(d_left, d_right)?;

                let p_perms = response_p_table.permutations(row.pid, &partition_map, &partition_map_choices)?;
                let (p1_tree, p2_tree, _p3_tree) = &*p_perms;
                let p1_partition = p1_tree.get(partition_index).cloned().unwrap_or_default();
                let p2_partition = p2_tree.get(partition_index).cloned().unwrap_or_default();
                let p1_inverted = p1_partition
                    .iter()
                    .map(Permutation::invert)
                    .collect::<Result<Vec<_>, _>>()?;
                let p_composed = compose_lists(&p2_partition, &p1_inverted)?;

                if d_composed != p_composed {
                    report.push(Finding::PermutationCompositionMismatch {
                        partition_id,
                        instance_id,
                        row_id,
                        pid: row.pid,
                    });
                }
            }
        }
    }

    tracing::info!(challenged = challenge_count, "Meeting 2 verification complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use scantegrity_core::base::{PartitionMap, commit};
    use scantegrity_core::schema::{AnswerChoiceType, DRow, ElectionSpec, PRow, PartitionInfo, QuestionInput};

    use super::*;

    const CONSTANT: [u8; 16] = *b"PrincetonElectio";
    const SALT: &str = "dWvJjTDof3YHWyOYvkIFoA==";

    fn one_partition_election(num_ballots: u64) -> Election {
        let partition_info = PartitionInfo::new("e1", vec![("s1".to_string(), "q0".to_string(), 0)]).expect("non-empty");
        let sections = vec![(
            "s1".to_string(),
            vec![QuestionInput {
                id: "q0".to_string(),
                position: 0,
                type_answer_choice: AnswerChoiceType::OneAnswer,
                max_num_answers: 1,
                answers: vec!["a".to_string(), "b".to_string()],
            }],
        )];
        let spec = ElectionSpec::new("e1", &partition_info, sections).expect("valid spec");
        Election::new(spec, 1, num_ballots, CONSTANT)
    }

    fn p_message(row_id: u64, values: &[u8]) -> Vec<u8> {
        let mut message = row_id.to_string().into_bytes();
        message.extend_from_slice(values);
        message
    }

    fn d_message(partition_id: u8, instance_id: u8, row_id: u64, external_id: u64, values: &[u8]) -> Vec<u8> {
        let mut message = vec![partition_id, instance_id];
        message.extend(row_id.to_string().into_bytes());
        message.extend(external_id.to_string().into_bytes());
        message.extend_from_slice(values);
        message
    }

    /// A single-ballot, single-partition fixture: P row 0 with a two-element identity
    /// permutation pair, and one D-row consistent with it.
    fn single_row_fixture() -> (PTable, BTreeMap<u8, BTreeMap<u8, DTable>>, PartitionMap, PartitionMap) {
        let p1 = vec![0_i64, 1];
        let p2 = vec![0_i64, 1];
        let c1 = commit(&p_message(0, &[0, 1]), SALT, &CONSTANT).expect("commit succeeds");
        let c2 = commit(&p_message(0, &[0, 1]), SALT, &CONSTANT).expect("commit succeeds");
        let mut p_rows = BTreeMap::new();
        p_rows.insert(0, PRow { id: 0, c1, c2, s1: SALT.to_string(), s2: SALT.to_string(), p1, p2, p3: vec![0] });
        let p_table = PTable::new(p_rows);

        let d2 = vec![0_i64, 1];
        let d4 = vec![0_i64, 1];
        let cl = commit(&d_message(0, 0, 0, 0, &[0, 1]), SALT, &CONSTANT).expect("commit succeeds");
        let cr = commit(&d_message(0, 0, 0, 0, &[0, 1]), SALT, &CONSTANT).expect("commit succeeds");
        let mut d_rows = BTreeMap::new();
        d_rows.insert(0, DRow { id: 0, pid: 0, rid: 0, cl, cr, sl: SALT.to_string(), sr: SALT.to_string(), d2, d3: vec![0], d4 });
        let d_table = DTable::new(0, 0, d_rows);
        let mut instances = BTreeMap::new();
        instances.insert(0, d_table);
        let mut partitions = BTreeMap::new();
        partitions.insert(0, instances);

        let partition_map: PartitionMap = vec![vec![2]];
        let partition_map_choices: PartitionMap = vec![vec![1]];
        (p_table, partitions, partition_map, partition_map_choices)
    }

    #[test]
    fn accepts_a_consistent_single_row_reveal() {
        let election = one_partition_election(1);
        let (p_table, partitions, _map, _map_choices) = single_row_fixture();

        let mut challenge_rows = BTreeMap::new();
        challenge_rows.insert(0, p_table.row(0).expect("row present").clone());
        let challenge_p_table = PTable::new(challenge_rows);

        let report = verify(
            &election,
            &p_table,
            &partitions,
            &challenge_p_table,
            &p_table,
            &partitions,
            b"",
        )
        .expect("structurally valid fixture");

        assert!(report.findings.is_empty());
    }

    #[test]
    fn flags_a_tampered_p_row_commitment() {
        let election = one_partition_election(1);
        let (mut p_table, partitions, _map, _map_choices) = single_row_fixture();

        let mut challenge_rows = BTreeMap::new();
        challenge_rows.insert(0, p_table.row(0).expect("row present").clone());
        let challenge_p_table = PTable::new(challenge_rows);

        {
            let rows = p_table.rows().clone();
            let mut tampered_row = rows.get(&0).expect("row present").clone();
            tampered_row.p1 = vec![1, 0];
            let mut tampered_rows = BTreeMap::new();
            tampered_rows.insert(0, tampered_row);
            p_table = PTable::new(tampered_rows);
        }

        let report = verify(
            &election,
            &p_table,
            &partitions,
            &challenge_p_table,
            &p_table,
            &partitions,
            b"",
        )
        .expect("structurally valid fixture");

        assert!(
            report
                .findings
                .iter()
                .any(|f| matches!(f, Finding::PRowCommitmentMismatch { row_id: 0 }))
        );
    }

    /// A four-ballot, single-partition, single-instance fixture with two challenged rows (2
    /// and 3), matching the published random seed `""` under `CONSTANT`.
    fn two_row_fixture() -> (PTable, BTreeMap<u8, BTreeMap<u8, DTable>>) {
        let mut p_rows = BTreeMap::new();
        let mut d_rows = BTreeMap::new();
        for (row_id, rid) in [(2_u64, 20_u64), (3_u64, 21_u64)] {
            let p1 = vec![0_i64, 1];
            let p2 = vec![0_i64, 1];
            let c1 = commit(&p_message(row_id, &[0, 1]), SALT, &CONSTANT).expect("commit succeeds");
            let c2 = commit(&p_message(row_id, &[0, 1]), SALT, &CONSTANT).expect("commit succeeds");
            p_rows.insert(
                row_id,
                PRow { id: row_id, c1, c2, s1: SALT.to_string(), s2: SALT.to_string(), p1, p2, p3: vec![0] },
            );

            let d2 = vec![0_i64, 1];
            let d4 = vec![0_i64, 1];
            let cl = commit(&d_message(0, 0, row_id, row_id, &[0, 1]), SALT, &CONSTANT).expect("commit succeeds");
            let cr = commit(&d_message(0, 0, row_id, rid, &[0, 1]), SALT, &CONSTANT).expect("commit succeeds");
            d_rows.insert(
                row_id,
                DRow { id: row_id, pid: row_id, rid, cl, cr, sl: SALT.to_string(), sr: SALT.to_string(), d2, d3: vec![0], d4 },
            );
        }
        let p_table = PTable::new(p_rows);
        let d_table = DTable::new(0, 0, d_rows);
        let mut instances = BTreeMap::new();
        instances.insert(0, d_table);
        let mut partitions = BTreeMap::new();
        partitions.insert(0, instances);
        (p_table, partitions)
    }

    #[test]
    fn accepts_a_four_ballot_two_row_challenge_matching_the_random_seed() {
        let election = one_partition_election(4);
        let (p_table, partitions) = two_row_fixture();

        let mut challenge_rows = BTreeMap::new();
        challenge_rows.insert(2, p_table.row(2).expect("row present").clone());
        challenge_rows.insert(3, p_table.row(3).expect("row present").clone());
        let challenge_p_table = PTable::new(challenge_rows);

        let report = verify(&election, &p_table, &partitions, &challenge_p_table, &p_table, &partitions, b"")
            .expect("structurally valid fixture");

        assert_eq!(report.challenges_match_randomness, Some(true));
        assert!(report.findings.is_empty());
    }

    #[test]
    fn flags_the_specific_row_whose_permutation_was_mutated() {
        let election = one_partition_election(4);
        let (p_table, mut partitions) = two_row_fixture();

        let mut challenge_rows = BTreeMap::new();
        challenge_rows.insert(2, p_table.row(2).expect("row present").clone());
        challenge_rows.insert(3, p_table.row(3).expect("row present").clone());
        let challenge_p_table = PTable::new(challenge_rows);

        {
            let instance = partitions.get(&0).expect("partition present").get(&0).expect("instance present");
            let mut rows = instance.rows().clone();
            let mut tampered_row = rows.get(&3).expect("row present").clone();
            tampered_row.d2 = vec![1, 0];
            rows.insert(3, tampered_row);
            let mut instances = BTreeMap::new();
            instances.insert(0, DTable::new(0, 0, rows));
            partitions = BTreeMap::new();
            partitions.insert(0, instances);
        }

        let report = verify(&election, &p_table, &partitions, &challenge_p_table, &p_table, &partitions, b"")
            .expect("structurally valid fixture");

        assert!(
            report
                .findings
                .iter()
                .any(|f| matches!(f, Finding::DRowCommitmentMismatch { row_id: 3, .. }))
        );
        assert!(
            !report
                .findings
                .iter()
                .any(|f| matches!(f, Finding::DRowCommitmentMismatch { row_id: 2, .. }))
        );
    }
}
