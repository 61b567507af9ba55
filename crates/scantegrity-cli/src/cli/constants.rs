//! Shared constants for the CLI.

// -------------------------
// Environment variables
// -------------------------

pub const SCANTEGRITY_MEETING: &str = "SCANTEGRITY_MEETING";
pub const SCANTEGRITY_RANDOM_DATA: &str = "SCANTEGRITY_RANDOM_DATA";

// -------------------------
// Default values
// -------------------------

pub const DEFAULT_RANDOM_DATA_FILE: &str = "random_data.bin";

// -------------------------
// Artifact file names, relative to the data directory
// -------------------------

pub const PARTITIONS_FILE: &str = "partitions.xml";
pub const ELECTION_SPEC_FILE: &str = "ElectionSpec.xml";
pub const MEETING_ONE_IN_FILE: &str = "MeetingOneIn.xml";
pub const MEETING_ONE_OUT_FILE: &str = "MeetingOneOut.xml";
pub const MEETING_TWO_IN_FILE: &str = "MeetingTwoIn.xml";
pub const MEETING_TWO_OUT_FILE: &str = "MeetingTwoOut.xml";
pub const MEETING_TWO_OUT_COMMITMENTS_FILE: &str = "MeetingTwoOutCommitments.xml";
pub const MEETING_THREE_IN_FILE: &str = "MeetingThreeIn.xml";
pub const MEETING_THREE_OUT_FILE: &str = "MeetingThreeOut.xml";
