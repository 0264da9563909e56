//! Reply values
//!
//! Represents one decoded reply from the server.

use std::fmt;

use bytes::Bytes;

/// A decoded reply
///
/// An error reply is a value like any other; it only becomes a
/// [`ClientError`](crate::ClientError) when narrowed into a typed target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultValue {
    /// `$-1` or `*-1`
    Nil,

    /// `:<n>`
    Integer(i64),

    /// `+<text>`
    Status(String),

    /// `$<len>` followed by the payload
    Bulk(Bytes),

    /// `*<count>` followed by the elements (may nest)
    Array(Vec<ResultValue>),

    /// `-<text>`
    Error(String),
}

impl ResultValue {
    /// Short name of the active variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ResultValue::Nil => "nil",
            ResultValue::Integer(_) => "integer",
            ResultValue::Status(_) => "status",
            ResultValue::Bulk(_) => "bulk",
            ResultValue::Array(_) => "array",
            ResultValue::Error(_) => "error",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, ResultValue::Nil)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultValue::Error(_))
    }

    /// Bulk reply from anything byte-like
    pub fn bulk(bytes: impl Into<Bytes>) -> Self {
        ResultValue::Bulk(bytes.into())
    }

    /// Status reply from text
    pub fn status(text: impl Into<String>) -> Self {
        ResultValue::Status(text.into())
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            ResultValue::Nil => write!(f, "(nil)"),
            ResultValue::Integer(n) => write!(f, "(integer) {}", n),
            ResultValue::Status(text) => write!(f, "{}", text),
            ResultValue::Error(text) => write!(f, "(error) {}", text),
            ResultValue::Bulk(bytes) => write!(f, "\"{}\"", bytes.escape_ascii()),
            ResultValue::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            ResultValue::Array(items) => {
                let width = items.len().to_string().len();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                        write!(f, "{:indent$}", "", indent = indent)?;
                    }
                    let label = format!("{:>width$}) ", i + 1, width = width);
                    write!(f, "{}", label)?;
                    item.fmt_indented(f, indent + label.len())?;
                }
                Ok(())
            }
        }
    }
}

/// Renders like redis-cli does
impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl From<i64> for ResultValue {
    fn from(n: i64) -> Self {
        ResultValue::Integer(n)
    }
}

impl From<Vec<ResultValue>> for ResultValue {
    fn from(items: Vec<ResultValue>) -> Self {
        ResultValue::Array(items)
    }
}
