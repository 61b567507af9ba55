//! `database/printCommitments/ballot` elements → committed [`Ballot`]s.

use std::collections::{BTreeMap, HashMap};

use roxmltree::Node;
use scantegrity_core::schema::Ballot;

use super::{attr, attr_u64, children, required_path};
use crate::error::ParseError;

/// Parse `database/printCommitments/ballot` elements under `root` into committed [`Ballot`]s,
/// keyed by `pid`.
///
/// # Errors
/// Returns [`ParseError`] on a missing or malformed attribute.
pub fn parse_ballots(root: Node<'_, '_>) -> Result<BTreeMap<u64, Ballot>, ParseError> {
    let database = required_path(root, "database")?;
    let print_commitments = required_path(database, "printCommitments")?;

    let mut ballots = BTreeMap::new();
    for ballot_node in children(print_commitments, "ballot") {
        let pid = attr_u64(ballot_node, "pid")?;
        let barcode_serial_commitment =
            ballot_node.attribute("barcodeSerialCommitment").map(str::to_string);

        let mut questions = HashMap::new();
        for question_node in children(ballot_node, "question") {
            let question_id = attr(question_node, "id")?.to_string();
            let mut symbols = HashMap::new();
            for symbol_node in children(question_node, "symbol") {
                let symbol_id = attr_u64(symbol_node, "id")?;
                symbols.insert(symbol_id, attr(symbol_node, "c")?.to_string());
            }
            questions.insert(question_id, symbols);
        }

        ballots.insert(
            pid,
            Ballot {
                pid,
                web_serial_commitment: attr(ballot_node, "webSerialCommitment")?.to_string(),
                barcode_serial_commitment,
                questions,
            },
        );
    }
    Ok(ballots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ballots_with_nested_symbol_commitments() {
        let doc = roxmltree::Document::parse(
            r#"
            <root>
                <database>
                    <printCommitments>
                        <ballot pid="1" webSerialCommitment="web-c" barcodeSerialCommitment="bar-c">
                            <question id="q1">
                                <symbol id="3" c="sym-c" />
                            </question>
                        </ballot>
                    </printCommitments>
                </database>
            </root>
            "#,
        )
        .expect("well-formed");
        let ballots = parse_ballots(doc.root_element()).expect("valid ballots");

        let ballot = ballots.get(&1).expect("ballot present");
        assert_eq!(ballot.web_serial_commitment, "web-c");
        assert_eq!(ballot.barcode_serial_commitment.as_deref(), Some("bar-c"));
        let symbols = ballot.questions.get("q1").expect("question present");
        assert_eq!(symbols.get(&3).map(String::as_str), Some("sym-c"));
    }
}
