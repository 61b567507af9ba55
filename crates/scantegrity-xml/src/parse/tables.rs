//! `print`, `partition/decrypt/instance`, and `partition/results` elements → [`PTable`] /
//! [`DTable`] / [`RTable`].

use std::collections::BTreeMap;

use roxmltree::Node;
use scantegrity_core::schema::{DRow, DTable, PRow, PTable, RRow, RTable};

use super::{attr, attr_ints, attr_u64, attr_u8, children, required_path};
use crate::error::ParseError;

/// Parse a `print` element's `row` children into a [`PTable`].
///
/// # Errors
/// Returns [`ParseError`] on a missing or malformed attribute.
pub fn parse_p_table(node: Node<'_, '_>) -> Result<PTable, ParseError> {
    let mut rows = BTreeMap::new();
    for row in children(node, "row") {
        let id = attr_u64(row, "id")?;
        rows.insert(
            id,
            PRow {
                id,
                c1: attr(row, "c1")?.to_string(),
                c2: attr(row, "c2")?.to_string(),
                s1: attr(row, "s1")?.to_string(),
                s2: attr(row, "s2")?.to_string(),
                p1: attr_ints(row, "p1")?,
                p2: attr_ints(row, "p2")?,
                p3: attr_ints(row, "p3")?,
            },
        );
    }
    Ok(PTable::new(rows))
}

/// Parse every `database/partition/decrypt/instance` element under `root` into [`DTable`]s,
/// keyed by `(partition_id, instance_id)`.
///
/// # Errors
/// Returns [`ParseError`] on a missing or malformed attribute.
pub fn parse_d_tables(root: Node<'_, '_>) -> Result<BTreeMap<u8, BTreeMap<u8, DTable>>, ParseError> {
    let database = required_path(root, "database")?;
    let mut partitions = BTreeMap::new();
    for partition in children(database, "partition") {
        let partition_id = attr_u8(partition, "id")?;
        let decrypt = required_path(partition, "decrypt")?;
        let mut instances = BTreeMap::new();
        for instance in children(decrypt, "instance") {
            let instance_id = attr_u8(instance, "id")?;
            instances.insert(instance_id, parse_d_table(partition_id, instance_id, instance)?);
        }
        partitions.insert(partition_id, instances);
    }
    Ok(partitions)
}

fn parse_d_table(partition_id: u8, instance_id: u8, node: Node<'_, '_>) -> Result<DTable, ParseError> {
    let mut rows = BTreeMap::new();
    for row in children(node, "row") {
        let id = attr_u64(row, "id")?;
        rows.insert(
            id,
            DRow {
                id,
                pid: attr_u64(row, "pid")?,
                rid: attr_u64(row, "rid")?,
                cl: attr(row, "cl")?.to_string(),
                cr: attr(row, "cr")?.to_string(),
                sl: attr(row, "sl")?.to_string(),
                sr: attr(row, "sr")?.to_string(),
                d2: attr_ints(row, "d2")?,
                d3: attr_ints(row, "d3")?,
                d4: attr_ints(row, "d4")?,
            },
        );
    }
    Ok(DTable::new(partition_id, instance_id, rows))
}

/// Parse every `database/partition/results` element under `root` into [`RTable`]s, keyed by
/// `partition_id`.
///
/// # Errors
/// Returns [`ParseError`] on a missing or malformed attribute.
pub fn parse_r_tables(root: Node<'_, '_>) -> Result<BTreeMap<u8, RTable>, ParseError> {
    let database = required_path(root, "database")?;
    let mut tables = BTreeMap::new();
    for partition in children(database, "partition") {
        let partition_id = attr_u8(partition, "id")?;
        let results = required_path(partition, "results")?;
        let mut rows = BTreeMap::new();
        for row in children(results, "row") {
            let id = attr_u64(row, "id")?;
            rows.insert(
                id,
                RRow {
                    id,
                    r: attr_ints(row, "r")?,
                },
            );
        }
        tables.insert(partition_id, RTable::new(partition_id, rows));
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_print_rows_with_whitespace_separated_permutations() {
        let doc = roxmltree::Document::parse(
            r#"<print><row id="0" c1="c1" c2="c2" s1="s1" s2="s2" p1="0 1 1 0" p2="1 0 0 1" p3="0 1" /></print>"#,
        )
        .expect("well-formed");
        let table = parse_p_table(doc.root_element()).expect("valid table");
        let row = table.row(0).expect("row present");
        assert_eq!(row.p1, vec![0, 1, 1, 0]);
        assert_eq!(row.p3, vec![0, 1]);
    }

    #[test]
    fn parses_partitioned_d_and_r_tables() {
        let doc = roxmltree::Document::parse(
            r#"
            <root>
                <database>
                    <partition id="3">
                        <decrypt>
                            <instance id="1">
                                <row id="7" pid="42" rid="9" cl="cl" cr="cr" sl="sl" sr="sr" d2="0 1" d3="" d4="1 0" />
                            </instance>
                        </decrypt>
                        <results>
                            <row id="9" r="1 0" />
                        </results>
                    </partition>
                </database>
            </root>
            "#,
        )
        .expect("well-formed");
        let root = doc.root_element();

        let d_tables = parse_d_tables(root).expect("valid d tables");
        let instance = d_tables.get(&3).and_then(|instances| instances.get(&1)).expect("instance present");
        assert_eq!(instance.partition_id, 3);
        assert_eq!(instance.row(7).expect("row present").pid, 42);

        let r_tables = parse_r_tables(root).expect("valid r tables");
        let r_table = r_tables.get(&3).expect("partition present");
        assert_eq!(r_table.row(9).expect("row present").r, vec![1, 0]);
    }
}
