//! Result sets returned by read statements.

use crate::event::RowImage;
use crate::value::SqlValue;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// A result set whose rows do not all have one value per column.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("row {row} has {found} values but the result set has {width} columns")]
pub struct RaggedRowError {
    pub row: usize,
    pub found: usize,
    pub width: usize,
}

/// How two result sets are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    /// Rows must appear in the same order.
    Ordered,
    /// Rows are compared as a multiset: order is ignored, duplicates count.
    #[default]
    Unordered,
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordered => f.write_str("ordered"),
            Self::Unordered => f.write_str("unordered"),
        }
    }
}

/// Column names plus rows of values.
///
/// Every row has exactly as many values as there are columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

/// Borrowed view of one row with access by position or column name.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [String],
    values: &'a [SqlValue],
}

impl<'a> RowView<'a> {
    /// Value at `index`.
    pub fn at(&self, index: usize) -> Option<&'a SqlValue> {
        self.values.get(index)
    }

    /// Value of the column called `name`.
    pub fn get(&self, name: &str) -> Option<&'a SqlValue> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    pub fn values(&self) -> &'a [SqlValue] {
        self.values
    }

    /// Copy the row into an owned, ordered column → value mapping.
    pub fn to_image(&self) -> RowImage {
        self.columns
            .iter()
            .zip(self.values)
            .map(|(c, v)| (c.clone(), v.clone()))
            .collect()
    }
}

impl ResultSet {
    /// Build a result set, rejecting rows whose width differs from the
    /// number of columns.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Result<Self, RaggedRowError> {
        let width = columns.len();
        if let Some(row) = rows.iter().position(|values| values.len() != width) {
            return Err(RaggedRowError {
                row,
                found: rows[row].len(),
                width,
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RowView<'_>> {
        self.rows.get(index).map(|values| RowView {
            columns: &self.columns,
            values,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|values| RowView {
            columns: &self.columns,
            values,
        })
    }

    /// Position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// `true` if both result sets hold the same data under `mode`.
    pub fn equals(&self, other: &ResultSet, mode: CompareMode) -> bool {
        self.first_difference(other, mode).is_none()
    }

    /// Describe the first difference between `self` and `other`, if any.
    pub fn first_difference(&self, other: &ResultSet, mode: CompareMode) -> Option<String> {
        if self.columns != other.columns {
            return Some(format!(
                "column names differ: [{}] vs [{}]",
                self.columns.join(", "),
                other.columns.join(", ")
            ));
        }

        match mode {
            CompareMode::Ordered => self.first_ordered_difference(other),
            CompareMode::Unordered => self.first_multiset_difference(other),
        }
    }

    fn first_ordered_difference(&self, other: &ResultSet) -> Option<String> {
        let mismatch = self
            .rows
            .iter()
            .zip(&other.rows)
            .position(|(left, right)| left != right);

        match mismatch {
            Some(i) => Some(format!(
                "row {i} differs: ({}) vs ({})",
                render_row(&self.rows[i]),
                render_row(&other.rows[i])
            )),
            None if self.rows.len() != other.rows.len() => Some(format!(
                "row count differs: {} vs {}",
                self.rows.len(),
                other.rows.len()
            )),
            None => None,
        }
    }

    fn first_multiset_difference(&self, other: &ResultSet) -> Option<String> {
        let mut counts: HashMap<&[SqlValue], i64> = HashMap::new();
        for row in &self.rows {
            *counts.entry(row.as_slice()).or_default() += 1;
        }
        for row in &other.rows {
            *counts.entry(row.as_slice()).or_default() -= 1;
        }

        let mut only_left = 0i64;
        let mut only_right = 0i64;
        let mut example: Option<(&[SqlValue], bool)> = None;
        for (&row, &count) in &counts {
            if count > 0 {
                only_left += count;
                example.get_or_insert((row, true));
            } else if count < 0 {
                only_right -= count;
                example.get_or_insert((row, false));
            }
        }

        let (row, left_side) = example?;
        Some(format!(
            "{only_left} row(s) only on the left, {only_right} row(s) only on the right; e.g. {} ({})",
            if left_side { "left" } else { "right" },
            render_row(row)
        ))
    }

    /// Render as an ASCII table in the style of the MySQL client.
    pub fn format_table(&self) -> String {
        if self.rows.is_empty() {
            return "Empty set".to_string();
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let separator: String = widths.iter().fold("+".to_string(), |mut acc, w| {
            acc.push_str(&"-".repeat(w + 2));
            acc.push('+');
            acc
        });
        let line = |values: &[String]| -> String {
            let padded: Vec<String> = values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{v:<w$}", w = *w))
                .collect();
            format!("| {} |", padded.join(" | "))
        };

        let mut out = vec![separator.clone(), line(&self.columns), separator.clone()];
        out.extend(cells.iter().map(|row| line(row)));
        out.push(separator);
        out.push(format!(
            "{} row{} in set",
            self.rows.len(),
            if self.rows.len() == 1 { "" } else { "s" }
        ));
        out.join("\n")
    }
}

fn render_row(row: &[SqlValue]) -> String {
    row.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rs(rows: &[(i64, &str)]) -> ResultSet {
        ResultSet::new(
            vec!["id".into(), "name".into()],
            rows.iter()
                .map(|(id, name)| vec![SqlValue::Int(*id), SqlValue::from(*name)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_field_access() {
        let result = rs(&[(1, "a"), (2, "b")]);
        assert_eq!(result.width(), 2);
        assert_eq!(result.len(), 2);
        let row = result.row(1).unwrap();
        assert_eq!(row.get("name"), Some(&SqlValue::Text("b".into())));
        assert_eq!(row.at(0), Some(&SqlValue::Int(2)));
        assert_eq!(row.get("nope"), None);
        assert_eq!(row.to_image().get("id"), Some(&SqlValue::Int(2)));
    }

    #[test]
    fn test_reordered_rows_equal_only_unordered() {
        let left = rs(&[(1, "a"), (2, "b")]);
        let right = rs(&[(2, "b"), (1, "a")]);
        assert!(left.equals(&right, CompareMode::Unordered));
        assert!(!left.equals(&right, CompareMode::Ordered));
    }

    #[test]
    fn test_duplicates_are_counted() {
        let left = rs(&[(1, "a"), (1, "a"), (2, "b")]);
        let right = rs(&[(1, "a"), (2, "b"), (2, "b")]);
        let diff = left.first_difference(&right, CompareMode::Unordered).unwrap();
        assert!(diff.starts_with("1 row(s) only on the left, 1 row(s) only on the right"));
    }

    #[test]
    fn test_column_names_must_match() {
        let left = rs(&[(1, "a")]);
        let right = ResultSet::new(
            vec!["id".into(), "title".into()],
            vec![vec![SqlValue::Int(1), SqlValue::from("a")]],
        )
        .unwrap();
        let diff = left.first_difference(&right, CompareMode::Unordered).unwrap();
        assert_eq!(diff, "column names differ: [id, name] vs [id, title]");
    }

    #[test]
    fn test_ordered_length_difference() {
        let left = rs(&[(1, "a")]);
        let right = rs(&[(1, "a"), (2, "b")]);
        assert_eq!(
            left.first_difference(&right, CompareMode::Ordered).unwrap(),
            "row count differs: 1 vs 2"
        );
    }

    #[test]
    fn test_format_table() {
        let table = rs(&[(1, "alice")]).format_table();
        let expected = "\
+----+-------+
| id | name  |
+----+-------+
| 1  | alice |
+----+-------+
1 row in set";
        assert_eq!(table, expected);
        assert_eq!(ResultSet::default().format_table(), "Empty set");
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = ResultSet::new(
            vec!["a".into(), "b".into()],
            vec![vec![SqlValue::Null, SqlValue::Null], vec![SqlValue::Null]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            RaggedRowError {
                row: 1,
                found: 1,
                width: 2
            }
        );
        assert_eq!(err.to_string(), "row 1 has 1 values but the result set has 2 columns");
    }
}
