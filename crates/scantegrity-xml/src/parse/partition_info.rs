//! `partitions.xml` → [`PartitionInfo`].

use scantegrity_core::schema::PartitionInfo;

use super::{attr, attr_usize, children, required_path};
use crate::error::ParseError;

/// Parse `partitions.xml`'s `electionInfo/sections/section/questions/question` tree into a
/// [`PartitionInfo`].
///
/// # Errors
/// Returns [`ParseError`] if the document is missing an expected element or attribute, or
/// wraps a [`scantegrity_core::schema::ModelError`] if the declared partition numbers don't
/// form a dense `0..n` range.
pub fn parse_partition_info(doc: &roxmltree::Document<'_>) -> Result<PartitionInfo, ParseError> {
    let root = doc.root_element();
    let election_info = required_path(root, "electionInfo")?;
    let id = attr(election_info, "id")?.to_string();
    let sections = required_path(election_info, "sections")?;

    let mut entries = Vec::new();
    for section in children(sections, "section") {
        let section_id = attr(section, "id")?.to_string();
        let questions = required_path(section, "questions")?;
        for question in children(questions, "question") {
            let question_id = attr(question, "id")?.to_string();
            let partition_num = attr_usize(question, "partitionNo")?;
            entries.push((section_id.clone(), question_id, partition_num));
        }
    }

    Ok(PartitionInfo::new(id, entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARTITIONS_XML: &str = r#"
        <root>
            <electionInfo id="election-1">
                <sections>
                    <section id="s1">
                        <questions>
                            <question id="q1" partitionNo="0" />
                            <question id="q2" partitionNo="1" />
                        </questions>
                    </section>
                </sections>
            </electionInfo>
        </root>
    "#;

    #[test]
    fn parses_sections_into_partition_buckets() {
        let doc = roxmltree::Document::parse(PARTITIONS_XML).expect("well-formed");
        let info = parse_partition_info(&doc).expect("valid partitions");
        assert_eq!(info.id(), "election-1");
        assert_eq!(info.num_partitions(), 2);
        assert_eq!(info.partition_num("s1", "q1").expect("known"), 0);
        assert_eq!(info.partition_num("s1", "q2").expect("known"), 1);
    }

    #[test]
    fn missing_sections_is_a_parse_error() {
        let doc = roxmltree::Document::parse(r#"<root><electionInfo id="e" /></root>"#).expect("well-formed");
        let err = parse_partition_info(&doc).expect_err("sections element is missing");
        assert!(matches!(err, ParseError::MissingElement { .. }));
    }
}
