//! Parameterized statements.
//!
//! A [`SqlStatement`] is a template using `?` as positional placeholder plus
//! the ordered list of values bound to those placeholders. Values are never
//! part of the template text.

use crate::value::SqlValue;
use std::fmt;
use thiserror::Error;

/// Error building a statement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatementError {
    #[error("statement has {placeholders} placeholder(s) but {parameters} parameter(s)")]
    ParameterCount {
        placeholders: usize,
        parameters: usize,
    },
}

/// A statement template plus its parameters.
///
/// The number of placeholders in `sql` always equals `params.len()`; the only
/// constructors check it.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlStatement {
    /// Create a statement, checking that every placeholder has a parameter.
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Result<Self, StatementError> {
        let sql = sql.into();
        let placeholders = placeholder_positions(&sql).len();
        if placeholders != params.len() {
            return Err(StatementError::ParameterCount {
                placeholders,
                parameters: params.len(),
            });
        }
        Ok(Self { sql, params })
    }

    /// Create a statement that is sent as-is.
    ///
    /// The text is not scanned for placeholders: a raw statement from the
    /// change log may legitimately contain `?` (for example inside a
    /// `PREPARE` body) and is never bound.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if self.has_params() {
            let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
            write!(f, " [{}]", params.join(", "))?;
        }
        Ok(())
    }
}

/// Incremental builder that keeps placeholders and parameters in step.
///
/// Every [`param`](Self::param) call writes one `?` and records one value,
/// and identifiers are always backtick-quoted, so the finished statement
/// satisfies the placeholder invariant by construction.
#[derive(Debug, Default)]
pub struct StatementBuilder {
    sql: String,
    params: Vec<SqlValue>,
}

impl StatementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append SQL keywords or punctuation. Must not contain values.
    pub fn sql(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    /// Append a backtick-quoted identifier.
    pub fn identifier(&mut self, name: &str) -> &mut Self {
        self.sql.push_str(&quote_identifier(name));
        self
    }

    /// Append a placeholder bound to `value`.
    pub fn param(&mut self, value: SqlValue) -> &mut Self {
        self.sql.push('?');
        self.params.push(value);
        self
    }

    pub fn build(self) -> SqlStatement {
        SqlStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Quote an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    Quoted(u8),
    LineComment,
    BlockComment,
}

/// Byte offsets of every `?` placeholder in `sql`.
///
/// Question marks inside string literals (`'...'`, `"..."`), quoted
/// identifiers (`` `...` ``) and comments are not placeholders. Backslash
/// escapes are honoured inside string literals, doubled quote characters
/// close and reopen the literal and so need no special case.
pub fn placeholder_positions(sql: &str) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut positions = Vec::new();
    let mut state = ScanState::Normal;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            ScanState::Normal => match b {
                b'?' => positions.push(i),
                b'\'' | b'"' | b'`' => state = ScanState::Quoted(b),
                b'#' => state = ScanState::LineComment,
                b'-' if bytes.get(i + 1) == Some(&b'-')
                    && bytes.get(i + 2).map_or(true, |c| c.is_ascii_whitespace()) =>
                {
                    state = ScanState::LineComment;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    state = ScanState::BlockComment;
                    i += 1;
                }
                _ => {}
            },
            ScanState::Quoted(quote) => {
                if b == b'\\' && quote != b'`' {
                    i += 1;
                } else if b == quote {
                    state = ScanState::Normal;
                }
            }
            ScanState::LineComment => {
                if b == b'\n' {
                    state = ScanState::Normal;
                }
            }
            ScanState::BlockComment => {
                if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    state = ScanState::Normal;
                    i += 1;
                }
            }
        }
        i += 1;
    }

    positions
}
