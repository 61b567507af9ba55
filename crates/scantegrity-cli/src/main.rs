//! Scantegrity election audit verifier CLI.

mod cli;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use cli::Cli;
use cli::constants::{
    ELECTION_SPEC_FILE, MEETING_ONE_IN_FILE, MEETING_ONE_OUT_FILE, MEETING_THREE_IN_FILE, MEETING_THREE_OUT_FILE,
    MEETING_TWO_IN_FILE, MEETING_TWO_OUT_COMMITMENTS_FILE, MEETING_TWO_OUT_FILE, PARTITIONS_FILE,
};
use clap::Parser as _;
use eyre::{Context as _, Result};
use scantegrity_core::base::sha1_hex;
use scantegrity_sdk::meetings::{meeting1, meeting2, meeting3};
use scantegrity_sdk::report::VerificationReport;
use scantegrity_xml::artifact::{FingerprintLedger, load_text};
use scantegrity_xml::parse::{
    parse_election_spec, parse_meeting_one_in, parse_meeting_one_out, parse_meeting_three_in, parse_meeting_three_out,
    parse_meeting_two_in, parse_meeting_two_out, parse_meeting_two_out_commitments, parse_partition_info,
};

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize tracing: {e:?}"))?;
    Ok(())
}

fn load_document(contents: &str) -> Result<roxmltree::Document<'_>> {
    roxmltree::Document::parse(contents).wrap_err("malformed XML")
}

fn wants(requested: Option<u8>, meeting: u8) -> bool {
    requested.map_or(true, |only| only == meeting)
}

/// Load every artifact for `data_dir`, run the meeting verifiers `cli.meeting` selects (or
/// every meeting whose artifacts are present, if unset), and return one report per meeting
/// run plus the fingerprint ledger covering every artifact read.
fn run(cli: &Cli) -> Result<(Vec<VerificationReport>, FingerprintLedger)> {
    let data_dir: &Path = cli.data_dir.as_path();
    let mut ledger = FingerprintLedger::new();
    let mut reports = Vec::new();

    let partitions_xml = load_text(data_dir, PARTITIONS_FILE, PARTITIONS_FILE, true, &mut ledger)?;
    let partition_info = parse_partition_info(&load_document(&partitions_xml)?)?;

    let spec_xml = load_text(data_dir, ELECTION_SPEC_FILE, ELECTION_SPEC_FILE, true, &mut ledger)?;
    let spec = parse_election_spec(&load_document(&spec_xml)?, &partition_info)?;

    let meeting_one_in_xml = load_text(data_dir, MEETING_ONE_IN_FILE, MEETING_ONE_IN_FILE, true, &mut ledger)?;
    let election = parse_meeting_one_in(&load_document(&meeting_one_in_xml)?, spec)?;

    let meeting_one_out_xml = load_text(data_dir, MEETING_ONE_OUT_FILE, MEETING_ONE_OUT_FILE, true, &mut ledger)?;
    let meeting_one_out = parse_meeting_one_out(&load_document(&meeting_one_out_xml)?)?;

    if wants(cli.meeting, 1) {
        reports.push(meeting1::verify(&election, &meeting_one_out.tables, &meeting_one_out.ballots)?);
    }

    let mut meeting_two_p_row_ids: BTreeSet<u64> = BTreeSet::new();
    let mut meeting_two_d_row_ids: BTreeMap<u8, BTreeMap<u8, BTreeSet<u64>>> = BTreeMap::new();

    if wants(cli.meeting, 2) && data_dir.join(MEETING_TWO_IN_FILE).is_file() {
        let meeting_two_in_xml = load_text(data_dir, MEETING_TWO_IN_FILE, MEETING_TWO_IN_FILE, true, &mut ledger)?;
        let challenge_p_table = parse_meeting_two_in(&load_document(&meeting_two_in_xml)?)?;

        let meeting_two_out_xml = load_text(data_dir, MEETING_TWO_OUT_FILE, MEETING_TWO_OUT_FILE, true, &mut ledger)?;
        let response = parse_meeting_two_out(&load_document(&meeting_two_out_xml)?)?;

        let commitments_xml = load_text(
            data_dir,
            MEETING_TWO_OUT_COMMITMENTS_FILE,
            MEETING_TWO_OUT_COMMITMENTS_FILE,
            true,
            &mut ledger,
        )?;
        parse_meeting_two_out_commitments(&load_document(&commitments_xml)?)?;

        let random_data_path = data_dir.join(&cli.random_data);
        let random_data = fs::read(&random_data_path).wrap_err_with(|| format!("failed to read {}", random_data_path.display()))?;
        ledger.record("Random Data", sha1_hex(&random_data));

        meeting_two_p_row_ids = response.p_table.rows().keys().copied().collect();
        for (&partition_id, instances) in &response.partitions {
            let instance_map = meeting_two_d_row_ids.entry(partition_id).or_default();
            for (&instance_id, d_table) in instances {
                instance_map.insert(instance_id, d_table.rows().keys().copied().collect());
            }
        }

        reports.push(meeting2::verify(
            &election,
            &meeting_one_out.tables.p_table,
            &meeting_one_out.tables.partitions,
            &challenge_p_table,
            &response.p_table,
            &response.partitions,
            &random_data,
        )?);
    }

    if wants(cli.meeting, 3) && data_dir.join(MEETING_THREE_IN_FILE).is_file() {
        let meeting_three_in_xml = load_text(data_dir, MEETING_THREE_IN_FILE, MEETING_THREE_IN_FILE, true, &mut ledger)?;
        let complement_p_table = parse_meeting_three_in(&load_document(&meeting_three_in_xml)?)?;

        let meeting_three_out_xml =
            load_text(data_dir, MEETING_THREE_OUT_FILE, MEETING_THREE_OUT_FILE, true, &mut ledger)?;
        let meeting_three_out = parse_meeting_three_out(&load_document(&meeting_three_out_xml)?)?;

        reports.push(meeting3::verify(
            &election,
            &meeting_one_out.tables.p_table,
            &meeting_one_out.tables.partitions,
            &meeting_two_p_row_ids,
            &meeting_two_d_row_ids,
            &complement_p_table,
            &meeting_three_out.tables.p_table,
            &meeting_three_out.tables.partitions,
            &meeting_three_out.r_tables,
        )?);
    }

    Ok((reports, ledger))
}

#[allow(
    clippy::print_stdout,
    reason = "the verifier's public verdict and fingerprint report are printed to stdout, per the CLI's reporting design"
)]
fn print_output(ledger: &FingerprintLedger, reports: &[VerificationReport]) {
    print!("{}", ledger.report());
    for report in reports {
        println!("{}", report.summary());
    }
}

fn try_main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let (reports, ledger) = run(&cli)?;
    print_output(&ledger, &reports);

    let success = reports.iter().all(VerificationReport::is_success);
    for report in &reports {
        tracing::info!(meeting = report.meeting, success = report.is_success(), "{}", report.summary());
    }

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn main() {
    if let Err(e) = try_main() {
        tracing::error!("Error: {:?}", e);
        std::process::exit(1);
    }
}
