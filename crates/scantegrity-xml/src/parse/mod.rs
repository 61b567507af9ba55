//! roxmltree-based parsers for the nine audit artifacts.
//!
//! Each function below walks a small, fixed element/attribute path (per the XML schema
//! essentials) and returns a typed `scantegrity_core::schema` value or a [`ParseError`].
//! Path lookups only ever search direct children, mirroring the semantics of
//! `ElementTree.find` in `data.py`'s original parsers.

mod ballots;
mod election_spec;
mod meetings;
mod partition_info;
mod tables;

pub use ballots::parse_ballots;
pub use election_spec::parse_election_spec;
pub use meetings::{
    CommittedTables, MeetingOneOut, MeetingThreeOut, parse_meeting_one_in, parse_meeting_one_out,
    parse_meeting_three_in, parse_meeting_three_out, parse_meeting_two_in, parse_meeting_two_out,
    parse_meeting_two_out_commitments,
};
pub use partition_info::parse_partition_info;
pub use tables::{parse_d_tables, parse_p_table, parse_r_tables};

use roxmltree::Node;

use crate::error::ParseError;

fn child<'a, 'i>(node: Node<'a, 'i>, tag: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|candidate| candidate.is_element() && candidate.tag_name().name() == tag)
}

fn children<'a, 'i>(node: Node<'a, 'i>, tag: &str) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children()
        .filter(move |candidate| candidate.is_element() && candidate.tag_name().name() == tag)
}

/// Walk a `/`-separated chain of direct-child tag names, starting at `node`.
fn find_path<'a, 'i>(node: Node<'a, 'i>, path: &str) -> Option<Node<'a, 'i>> {
    let mut current = node;
    for segment in path.split('/') {
        current = child(current, segment)?;
    }
    Some(current)
}

fn required_path<'a, 'i>(node: Node<'a, 'i>, path: &str) -> Result<Node<'a, 'i>, ParseError> {
    find_path(node, path).ok_or_else(|| ParseError::MissingElement {
        parent: node.tag_name().name().to_string(),
        child: path.to_string(),
    })
}

fn attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, ParseError> {
    node.attribute(name).ok_or_else(|| ParseError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
    })
}

fn required_text<'a>(node: Node<'a, '_>) -> Result<&'a str, ParseError> {
    node.text().ok_or_else(|| ParseError::MissingText {
        element: node.tag_name().name().to_string(),
    })
}

fn attr_i64(node: Node<'_, '_>, name: &str) -> Result<i64, ParseError> {
    let value = attr(node, name)?;
    value.parse().map_err(|_| ParseError::InvalidInteger {
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
        value: value.to_string(),
    })
}

fn attr_u64(node: Node<'_, '_>, name: &str) -> Result<u64, ParseError> {
    let value = attr(node, name)?;
    value.parse().map_err(|_| ParseError::InvalidInteger {
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
        value: value.to_string(),
    })
}

fn attr_u8(node: Node<'_, '_>, name: &str) -> Result<u8, ParseError> {
    let value = attr(node, name)?;
    value.parse().map_err(|_| ParseError::InvalidInteger {
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
        value: value.to_string(),
    })
}

fn attr_usize(node: Node<'_, '_>, name: &str) -> Result<usize, ParseError> {
    let value = attr(node, name)?;
    value.parse().map_err(|_| ParseError::InvalidInteger {
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
        value: value.to_string(),
    })
}

/// Tokenize a whitespace-separated list of integers, as the protocol represents every
/// permutation attribute (`p1`, `p2`, `p3`, `d2`, `d3`, `d4`, `r`).
fn attr_ints(node: Node<'_, '_>, name: &str) -> Result<Vec<i64>, ParseError> {
    let value = attr(node, name)?;
    value
        .split_whitespace()
        .map(|token| {
            token.parse::<i64>().map_err(|_| ParseError::InvalidInteger {
                element: node.tag_name().name().to_string(),
                attribute: name.to_string(),
                value: token.to_string(),
            })
        })
        .collect()
}
