//! Command-line interface for the `verify` binary.

pub mod constants;

use std::path::PathBuf;

use clap::Parser;
use eyre::{Result, eyre};

use self::constants::{DEFAULT_RANDOM_DATA_FILE, SCANTEGRITY_MEETING, SCANTEGRITY_RANDOM_DATA};

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = "verify", about = "Verify a Scantegrity election audit trail")]
pub struct Cli {
    /// Directory containing the nine audit artifacts. A trailing slash is rejected.
    #[arg(value_parser = parse_data_dir)]
    pub data_dir: PathBuf,

    /// Raw random-data artifact for Meeting 2, relative to `data_dir`.
    #[arg(default_value = DEFAULT_RANDOM_DATA_FILE, env = SCANTEGRITY_RANDOM_DATA)]
    pub random_data: PathBuf,

    /// Verify only this meeting (1, 2, or 3). Defaults to every meeting whose artifacts are
    /// present in `data_dir`.
    #[arg(long, env = SCANTEGRITY_MEETING, value_parser = parse_meeting)]
    pub meeting: Option<u8>,
}

fn parse_data_dir(s: &str) -> Result<PathBuf> {
    if s.ends_with('/') || s.ends_with('\\') {
        return Err(eyre!("data directory must not have a trailing slash: {s}"));
    }
    Ok(PathBuf::from(s))
}

fn parse_meeting(s: &str) -> Result<u8> {
    match s.parse::<u8>() {
        Ok(n) if (1..=3).contains(&n) => Ok(n),
        _ => Err(eyre!("meeting must be 1, 2, or 3, got {s}")),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::*;

    #[test]
    fn rejects_a_trailing_slash() {
        assert!(parse_data_dir("data/").is_err());
        assert!(parse_data_dir("data").is_ok());
    }

    #[test]
    fn rejects_an_out_of_range_meeting() {
        assert!(parse_meeting("0").is_err());
        assert!(parse_meeting("4").is_err());
        assert!(parse_meeting("2").is_ok());
    }

    #[test]
    fn parses_a_minimal_invocation() {
        let cli = Cli::try_parse_from(["verify", "data"]).expect("minimal invocation parses");
        assert_eq!(cli.data_dir, PathBuf::from("data"));
        assert_eq!(cli.random_data, PathBuf::from(DEFAULT_RANDOM_DATA_FILE));
        assert_eq!(cli.meeting, None);
    }
}
