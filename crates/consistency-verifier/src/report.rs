//! Verification report types.

use replay_core::CompareMode;
use std::fmt;

/// Outcome for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableResult {
    pub table: String,
    /// `true` if both stores hold the same data for this table.
    pub equal: bool,
    /// What differed, or why an error on both sides was accepted.
    pub diagnostic: Option<String>,
}

impl TableResult {
    pub fn matched(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            equal: true,
            diagnostic: None,
        }
    }

    pub fn mismatched(table: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            equal: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

impl fmt::Display for TableResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.equal { "OK" } else { "MISMATCH" };
        write!(f, "{status:<8} {}", self.table)?;
        if let Some(diagnostic) = &self.diagnostic {
            write!(f, ": {diagnostic}")?;
        }
        Ok(())
    }
}

/// Per-table results of a verification run, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub mode: CompareMode,
    pub tables: Vec<TableResult>,
}

impl VerificationReport {
    pub fn new(mode: CompareMode) -> Self {
        Self {
            mode,
            tables: Vec::new(),
        }
    }

    /// Tables whose contents differ.
    pub fn mismatched(&self) -> impl Iterator<Item = &TableResult> {
        self.tables.iter().filter(|t| !t.equal)
    }

    /// `true` if every table matched. A report with no tables is consistent.
    pub fn is_consistent(&self) -> bool {
        self.tables.iter().all(|t| t.equal)
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        let mismatched = self.mismatched().count();
        if mismatched == 0 {
            format!(
                "Verification PASSED: {} table(s) identical ({} comparison)",
                self.tables.len(),
                self.mode
            )
        } else {
            format!(
                "Verification FAILED: {mismatched} of {} table(s) differ ({} comparison)",
                self.tables.len(),
                self.mode
            )
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for table in &self.tables {
            writeln!(f, "{table}")?;
        }
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_consistent() {
        let report = VerificationReport::new(CompareMode::Unordered);
        assert!(report.is_consistent());
        assert_eq!(
            report.summary(),
            "Verification PASSED: 0 table(s) identical (unordered comparison)"
        );
    }

    #[test]
    fn test_mismatches_are_listed() {
        let report = VerificationReport {
            mode: CompareMode::Ordered,
            tables: vec![
                TableResult::matched("a"),
                TableResult::mismatched("b", "row count differs: 1 vs 2"),
            ],
        };

        assert!(!report.is_consistent());
        let mismatched: Vec<_> = report.mismatched().map(|t| t.table.as_str()).collect();
        assert_eq!(mismatched, vec!["b"]);
        assert_eq!(
            report.to_string(),
            "OK       a\nMISMATCH b: row count differs: 1 vs 2\n\
             Verification FAILED: 1 of 2 table(s) differ (ordered comparison)"
        );
    }
}
