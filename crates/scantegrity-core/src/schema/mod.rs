//! Typed election, table, and ballot models.

mod ballot;
mod election;
mod error;
mod table;

pub use ballot::{Ballot, BallotQuestion, CodeOpening, OpenBallot, SerialOpening, verify_symbols};
pub use election::{
    AnswerChoiceType, Election, ElectionSpec, PartitionInfo, Question, QuestionInput, QuestionRef,
};
pub use error::ModelError;
pub use table::{DRow, DRowPermutations, DTable, PRow, PRowPermutations, PTable, RRow, RTable};
