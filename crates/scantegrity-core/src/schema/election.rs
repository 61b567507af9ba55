//! Typed election specification: partitions, questions, and the derived partition maps.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::base::PartitionMap;

use super::error::ModelError;

/// A `(section_id, question_id)` pair, as recorded in a [`PartitionInfo`] partition bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionRef {
    /// The section this question belongs to.
    pub section_id: String,
    /// The question's id within that section.
    pub question_id: String,
}

/// Maps each `(section_id, question_id)` pair to the partition it belongs to.
#[derive(Debug, Clone)]
pub struct PartitionInfo {
    id: String,
    sections: HashMap<String, HashMap<String, usize>>,
    partitions: Vec<Vec<QuestionRef>>,
}

impl PartitionInfo {
    /// Build a `PartitionInfo` from `(section_id, question_id, partition_num)` triples.
    /// Partition numbers must cover a dense range `0..num_partitions`; `num_partitions` is
    /// derived as `max(partition_num) + 1`.
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyPartitionInfo`] if `entries` is empty.
    pub fn new(
        id: impl Into<String>,
        entries: Vec<(String, String, usize)>,
    ) -> Result<Self, ModelError> {
        let max_partition = entries
            .iter()
            .map(|(_, _, partition_num)| *partition_num)
            .max()
            .ok_or(ModelError::EmptyPartitionInfo)?;
        let num_partitions = max_partition
            .checked_add(1)
            .ok_or(ModelError::PartitionIndexOutOfRange(max_partition))?;

        let mut sections: HashMap<String, HashMap<String, usize>> = HashMap::new();
        let mut partitions: Vec<Vec<QuestionRef>> = vec![Vec::new(); num_partitions];
        for (section_id, question_id, partition_num) in entries {
            sections
                .entry(section_id.clone())
                .or_default()
                .insert(question_id.clone(), partition_num);
            let bucket = partitions
                .get_mut(partition_num)
                .ok_or(ModelError::PartitionIndexOutOfRange(partition_num))?;
            bucket.push(QuestionRef {
                section_id,
                question_id,
            });
        }

        Ok(Self {
            id: id.into(),
            sections,
            partitions,
        })
    }

    /// The election id this partition map was parsed under.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of partitions.
    #[must_use]
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// The `(section_id, question_id)` pairs grouped by partition.
    #[must_use]
    pub fn partitions(&self) -> &[Vec<QuestionRef>] {
        &self.partitions
    }

    /// The partition number for a given `(section_id, question_id)` pair.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownQuestion`] if the pair was never recorded.
    pub fn partition_num(&self, section_id: &str, question_id: &str) -> Result<usize, ModelError> {
        self.sections
            .get(section_id)
            .and_then(|section| section.get(question_id))
            .copied()
            .ok_or_else(|| ModelError::UnknownQuestion {
                section_id: section_id.to_string(),
                question_id: question_id.to_string(),
            })
    }
}

/// How a question's marked symbols should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnswerChoiceType {
    /// Ranked-choice: each symbol encodes both a candidate and a rank.
    Rank,
    /// Single selection.
    OneAnswer,
    /// Multiple selections up to `max_num_answers`.
    MultipleAnswers,
}

impl AnswerChoiceType {
    /// Parse the XML `typeOfAnswerChoice` attribute value.
    ///
    /// # Errors
    /// Returns [`ModelError::UnknownAnswerChoiceType`] for anything other than `rank`,
    /// `one_answer`, or `multiple_answers`.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        match value {
            "rank" => Ok(Self::Rank),
            "one_answer" => Ok(Self::OneAnswer),
            "multiple_answers" => Ok(Self::MultipleAnswers),
            other => Err(ModelError::UnknownAnswerChoiceType(other.to_string())),
        }
    }
}

/// A question as it appears in the election spec, already sorted into its section and
/// partition order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    /// The question's id, unique within its section.
    pub id: String,
    /// Sort key (the XML authority spells the attribute `possition`).
    pub position: i64,
    /// How marked symbols should be interpreted.
    pub type_answer_choice: AnswerChoiceType,
    /// Maximum number of answers a voter may select.
    pub max_num_answers: usize,
    /// Answer ids, in position order.
    pub answers: Vec<String>,
    /// The section this question belongs to.
    pub section_id: String,
    /// Which partition this question was assigned to.
    pub partition_num: usize,
    /// This question's position within its partition's question list.
    pub position_in_partition: usize,
}

/// A question as supplied by the parser, before partition assignment is resolved.
#[derive(Debug, Clone)]
pub struct QuestionInput {
    /// The question's id, unique within its section.
    pub id: String,
    /// Sort key (the XML authority spells the attribute `possition`).
    pub position: i64,
    /// How marked symbols should be interpreted.
    pub type_answer_choice: AnswerChoiceType,
    /// Maximum number of answers a voter may select.
    pub max_num_answers: usize,
    /// Answer ids, in position order.
    pub answers: Vec<String>,
}

/// The full election specification: sections of position-ordered questions.
#[derive(Debug, Clone)]
pub struct ElectionSpec {
    id: String,
    questions_by_id: HashMap<String, Question>,
    questions: Vec<Question>,
    questions_by_partition: Vec<Vec<Question>>,
}

impl ElectionSpec {
    /// Build an `ElectionSpec` from its sections, cross-checking `id` against
    /// `partition_info`'s id and assigning each question's partition and
    /// position-in-partition.
    ///
    /// # Errors
    /// Returns [`ModelError::ElectionIdMismatch`] if `id` disagrees with `partition_info`'s
    /// id, or propagates [`ModelError::UnknownQuestion`] / [`ModelError::PartitionIndexOutOfRange`]
    /// if a question references a partition `partition_info` does not know about.
    pub fn new(
        id: impl Into<String>,
        partition_info: &PartitionInfo,
        sections: Vec<(String, Vec<QuestionInput>)>,
    ) -> Result<Self, ModelError> {
        let id = id.into();
        if id != partition_info.id() {
            return Err(ModelError::ElectionIdMismatch {
                partition_info: partition_info.id().to_string(),
                spec: id,
            });
        }

        let mut questions_by_partition: Vec<Vec<Question>> =
            vec![Vec::new(); partition_info.num_partitions()];
        let mut questions = Vec::new();
        let mut questions_by_id = HashMap::new();

        for (section_id, mut inputs) in sections {
            inputs.sort_by_key(|question| question.position);
            for input in inputs {
                let partition_num = partition_info.partition_num(&section_id, &input.id)?;
                let position_in_partition = questions_by_partition
                    .get(partition_num)
                    .ok_or(ModelError::PartitionIndexOutOfRange(partition_num))?
                    .len();

                let question = Question {
                    id: input.id.clone(),
                    position: input.position,
                    type_answer_choice: input.type_answer_choice,
                    max_num_answers: input.max_num_answers,
                    answers: input.answers,
                    section_id: section_id.clone(),
                    partition_num,
                    position_in_partition,
                };

                questions_by_partition
                    .get_mut(partition_num)
                    .ok_or(ModelError::PartitionIndexOutOfRange(partition_num))?
                    .push(question.clone());
                questions_by_id.insert(question.id.clone(), question.clone());
                questions.push(question);
            }
        }

        Ok(Self {
            id,
            questions_by_id,
            questions,
            questions_by_partition,
        })
    }

    /// The election id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Look up a question by id.
    #[must_use]
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions_by_id.get(id)
    }

    /// All questions, in the order they were parsed.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Questions grouped by partition, each partition's list in `position_in_partition`
    /// order.
    #[must_use]
    pub fn questions_by_partition(&self) -> &[Vec<Question>] {
        &self.questions_by_partition
    }
}

/// The election as fully assembled after Meeting 1: the spec plus its commitment-scheme
/// constant and size parameters.
#[derive(Debug, Clone)]
pub struct Election {
    /// The underlying election specification.
    pub spec: ElectionSpec,
    /// Number of D-table mix instances per partition.
    pub num_d_tables: usize,
    /// Number of printed ballots.
    pub num_ballots: u64,
    /// The 16-byte AES plaintext constant shared by the whole election.
    pub constant: [u8; 16],
}

impl Election {
    /// Construct an `Election` from its spec and Meeting-1 header values.
    #[must_use]
    pub const fn new(
        spec: ElectionSpec,
        num_d_tables: usize,
        num_ballots: u64,
        constant: [u8; 16],
    ) -> Self {
        Self {
            spec,
            num_d_tables,
            num_ballots,
            constant,
        }
    }

    /// The partition map with leaves equal to each question's number of answers.
    #[must_use]
    pub fn partition_map(&self) -> PartitionMap {
        self.spec
            .questions_by_partition()
            .iter()
            .map(|partition| partition.iter().map(|question| question.answers.len()).collect())
            .collect()
    }

    /// The partition map with leaves equal to each question's `max_num_answers`, used to
    /// split voter-selection fields (`p3`, `d3`).
    #[must_use]
    pub fn partition_map_choices(&self) -> PartitionMap {
        self.spec
            .questions_by_partition()
            .iter()
            .map(|partition| partition.iter().map(|question| question.max_num_answers).collect())
            .collect()
    }

    /// Number of partitions.
    #[must_use]
    pub fn num_partitions(&self) -> usize {
        self.spec.questions_by_partition().len()
    }

    /// Questions assigned to the given partition, in partition order.
    #[must_use]
    pub fn questions_in_partition(&self, partition_num: usize) -> &[Question] {
        self.spec
            .questions_by_partition()
            .get(partition_num)
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_partition_info() -> PartitionInfo {
        PartitionInfo::new(
            "election-1",
            vec![
                ("s1".to_string(), "q1".to_string(), 0),
                ("s1".to_string(), "q2".to_string(), 1),
            ],
        )
        .expect("entries are non-empty")
    }

    fn sample_question(id: &str, position: i64, max_num_answers: usize, answers: usize) -> QuestionInput {
        QuestionInput {
            id: id.to_string(),
            position,
            type_answer_choice: AnswerChoiceType::Rank,
            max_num_answers,
            answers: (0..answers).map(|n| format!("answer-{n}")).collect(),
        }
    }

    #[test]
    fn answer_choice_type_parses_known_values() {
        assert_eq!(AnswerChoiceType::parse("rank").expect("valid"), AnswerChoiceType::Rank);
        assert_eq!(
            AnswerChoiceType::parse("one_answer").expect("valid"),
            AnswerChoiceType::OneAnswer
        );
        assert_eq!(
            AnswerChoiceType::parse("multiple_answers").expect("valid"),
            AnswerChoiceType::MultipleAnswers
        );
        assert!(AnswerChoiceType::parse("bogus").is_err());
    }

    #[test]
    fn partition_info_groups_by_partition_num() {
        let info = sample_partition_info();
        assert_eq!(info.num_partitions(), 2);
        assert_eq!(info.partition_num("s1", "q1").expect("known question"), 0);
        assert_eq!(info.partition_num("s1", "q2").expect("known question"), 1);
        assert!(info.partition_num("s1", "missing").is_err());
    }

    #[test]
    fn election_spec_rejects_id_mismatch() {
        let info = sample_partition_info();
        let err = ElectionSpec::new("other-election", &info, vec![]).expect_err("ids disagree");
        assert!(matches!(err, ModelError::ElectionIdMismatch { .. }));
    }

    #[test]
    fn election_spec_sorts_by_position_and_derives_partition_maps() {
        let info = sample_partition_info();
        let sections = vec![(
            "s1".to_string(),
            vec![
                sample_question("q2", 1, 2, 3),
                sample_question("q1", 0, 1, 4),
            ],
        )];
        let spec = ElectionSpec::new("election-1", &info, sections).expect("valid spec");

        let q1 = spec.question("q1").expect("q1 present");
        assert_eq!(q1.position_in_partition, 0);
        let q2 = spec.question("q2").expect("q2 present");
        assert_eq!(q2.position_in_partition, 0);

        let election = Election::new(spec, 3, 100, [0_u8; 16]);
        assert_eq!(election.partition_map(), vec![vec![4], vec![3]]);
        assert_eq!(election.partition_map_choices(), vec![vec![1], vec![2]]);
    }
}
