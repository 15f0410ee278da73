//! The [`Report`] snapshot and its renders.

use alloy_primitives::B256;
use headwatch_nodes::NodeStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabled::{builder::Builder, settings::Style};

/// One node's column header in a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeColumn {
    /// The last known client version.
    pub version: String,
    /// The node name.
    pub name: String,
    /// The node status when the report was built.
    pub status: NodeStatus,
    /// Unix time of the node's last head change, zero if it never progressed.
    pub last_progress: u64,
}

/// How the nodes of a [`Report`] relate at one height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum RowStatus {
    /// No node reported a block.
    #[display("empty")]
    Empty,
    /// Exactly one node reported a block.
    #[display("single")]
    Single,
    /// Several nodes reported a block and all hashes are equal.
    #[display("consensus")]
    Consensus,
    /// At least two nodes reported different hashes.
    #[display("divergence")]
    Divergence,
}

/// A snapshot of what a set of nodes reported at a list of heights.
///
/// `rows[n][i]` is the hash node `cols[i]` reported at height `n`, or an empty string if
/// it had none. `hashes` holds every distinct hash in the snapshot, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Report {
    /// One column per node, in the order the nodes were added.
    pub cols: Vec<NodeColumn>,
    /// The reported hashes per height.
    pub rows: BTreeMap<u64, Vec<String>>,
    /// The requested heights, in the requested order.
    pub numbers: Vec<u64>,
    /// The distinct hashes seen across all rows.
    pub hashes: Vec<B256>,
}

impl Report {
    /// Classifies the row at `number`.
    pub fn classify(&self, number: u64) -> RowStatus {
        let Some(row) = self.rows.get(&number) else {
            return RowStatus::Empty;
        };

        let mut reported = row.iter().filter(|cell| !cell.is_empty());
        let Some(first) = reported.next() else {
            return RowStatus::Empty;
        };

        let mut count = 1;
        for cell in reported {
            if cell != first {
                return RowStatus::Divergence;
            }
            count += 1;
        }
        if count == 1 { RowStatus::Single } else { RowStatus::Consensus }
    }

    /// Returns the requested heights whose row is divergent.
    pub fn divergent_rows(&self) -> Vec<u64> {
        self.numbers
            .iter()
            .copied()
            .filter(|number| self.classify(*number) == RowStatus::Divergence)
            .collect()
    }

    /// Renders the report as a markdown table with one row per requested height.
    pub fn to_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(
            std::iter::once("number".to_string()).chain(self.cols.iter().map(|c| c.name.clone())),
        );
        for number in &self.numbers {
            let cells = self.rows.get(number).map(Vec::as_slice).unwrap_or_default();
            builder.push_record(std::iter::once(number.to_string()).chain(cells.iter().cloned()));
        }

        let mut table = builder.build();
        table.with(Style::markdown());
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const AA: &str = "0xaa";
    const BB: &str = "0xbb";

    fn report_with_row(cells: &[&str]) -> Report {
        let mut report = Report { numbers: vec![100], ..Default::default() };
        report.rows.insert(100, cells.iter().map(|cell| cell.to_string()).collect());
        report
    }

    #[rstest]
    #[case::no_nodes(&[], RowStatus::Empty)]
    #[case::all_empty(&["", ""], RowStatus::Empty)]
    #[case::single(&["", AA, ""], RowStatus::Single)]
    #[case::consensus(&[AA, AA, ""], RowStatus::Consensus)]
    #[case::divergence(&[AA, AA, AA, BB], RowStatus::Divergence)]
    #[case::divergence_with_gaps(&["", BB, "", AA], RowStatus::Divergence)]
    fn test_classify(#[case] cells: &[&str], #[case] expected: RowStatus) {
        assert_eq!(report_with_row(cells).classify(100), expected);
    }

    #[test]
    fn test_classify_unknown_height() {
        assert_eq!(report_with_row(&[AA]).classify(7), RowStatus::Empty);
    }

    #[test]
    fn test_divergent_rows() {
        let mut report = report_with_row(&[AA, BB]);
        report.numbers.push(99);
        report.rows.insert(99, vec![AA.to_string(), AA.to_string()]);

        assert_eq!(report.divergent_rows(), vec![100]);
    }

    #[test]
    fn test_to_table() {
        let mut report = report_with_row(&[AA, ""]);
        report.cols = ["geth", "infura"]
            .into_iter()
            .map(|name| NodeColumn {
                version: "n/a".to_string(),
                name: name.to_string(),
                status: NodeStatus::Ok,
                last_progress: 0,
            })
            .collect();

        let table = report.to_table();
        let mut lines = table.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("number"));
        assert!(header.contains("geth"));
        assert!(header.contains("infura"));
        assert!(lines.next().unwrap().starts_with("|-"));
        let row = lines.next().unwrap();
        assert!(row.contains("100"));
        assert!(row.contains(AA));
    }
}
