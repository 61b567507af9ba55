//! `ElectionSpec.xml` → [`ElectionSpec`].

use roxmltree::Node;
use scantegrity_core::schema::{AnswerChoiceType, ElectionSpec, PartitionInfo, QuestionInput};

use super::{attr, attr_i64, attr_usize, children, required_path};
use crate::error::ParseError;

/// Parse `ElectionSpec.xml`'s sections of questions into an [`ElectionSpec`], cross-checked
/// against `partition_info`.
///
/// # Errors
/// Returns [`ParseError`] if the document is missing an expected element or attribute, or
/// wraps a model error if the election id disagrees with `partition_info`'s, or a question
/// references a partition `partition_info` doesn't know about.
pub fn parse_election_spec(
    doc: &roxmltree::Document<'_>,
    partition_info: &PartitionInfo,
) -> Result<ElectionSpec, ParseError> {
    let root = doc.root_element();
    let election_info = required_path(root, "electionInfo")?;
    let id = attr(election_info, "id")?.to_string();
    let sections_node = required_path(election_info, "sections")?;

    let mut sections = Vec::new();
    for section in children(sections_node, "section") {
        let section_id = attr(section, "id")?.to_string();
        let questions_node = required_path(section, "questions")?;
        let mut inputs = Vec::new();
        for question in children(questions_node, "question") {
            inputs.push(parse_question(question)?);
        }
        sections.push((section_id, inputs));
    }

    Ok(ElectionSpec::new(id, partition_info, sections)?)
}

fn parse_question(node: Node<'_, '_>) -> Result<QuestionInput, ParseError> {
    let answers_node = required_path(node, "answers")?;
    let mut answers: Vec<(i64, String)> = children(answers_node, "answer")
        .map(|answer| -> Result<(i64, String), ParseError> {
            Ok((attr_i64(answer, "possition")?, attr(answer, "id")?.to_string()))
        })
        .collect::<Result<_, _>>()?;
    answers.sort_by_key(|&(position, _)| position);

    Ok(QuestionInput {
        id: attr(node, "id")?.to_string(),
        position: attr_i64(node, "possition")?,
        type_answer_choice: AnswerChoiceType::parse(attr(node, "typeOfAnswerChoice")?)?,
        max_num_answers: attr_usize(node, "max_number_of_answers_selected")?,
        answers: answers.into_iter().map(|(_, id)| id).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ELECTION_SPEC_XML: &str = r#"
        <root>
            <electionInfo id="election-1">
                <sections>
                    <section id="s1">
                        <questions>
                            <question id="q1" possition="0" typeOfAnswerChoice="one_answer" max_number_of_answers_selected="1">
                                <answers>
                                    <answer id="a1" possition="1" />
                                    <answer id="a0" possition="0" />
                                </answers>
                            </question>
                        </questions>
                    </section>
                </sections>
            </electionInfo>
        </root>
    "#;

    fn sample_partition_info() -> PartitionInfo {
        PartitionInfo::new("election-1", vec![("s1".to_string(), "q1".to_string(), 0)]).expect("valid entries")
    }

    #[test]
    fn parses_questions_and_sorts_answers_by_position() {
        let doc = roxmltree::Document::parse(ELECTION_SPEC_XML).expect("well-formed");
        let info = sample_partition_info();
        let spec = parse_election_spec(&doc, &info).expect("valid spec");

        let question = spec.question("q1").expect("q1 present");
        assert_eq!(question.answers, vec!["a0".to_string(), "a1".to_string()]);
        assert_eq!(question.type_answer_choice, AnswerChoiceType::OneAnswer);
    }

    #[test]
    fn rejects_election_id_mismatch() {
        let doc = roxmltree::Document::parse(ELECTION_SPEC_XML).expect("well-formed");
        let info = PartitionInfo::new("other-election", vec![("s1".to_string(), "q1".to_string(), 0)])
            .expect("valid entries");
        assert!(parse_election_spec(&doc, &info).is_err());
    }
}
