//! Conversions from reply values into Rust types
//!
//! Every conversion is a pure narrowing: it never stringifies integers, never
//! drops elements it cannot represent, and never accepts an error reply.

use std::collections::HashMap;

use super::ResultValue;
use crate::error::{ClientError, Result};

impl ResultValue {
    /// Bulk (UTF-8 checked) or status reply as text
    pub fn as_text(&self) -> Result<String> {
        match self {
            ResultValue::Bulk(bytes) => Ok(std::str::from_utf8(bytes)?.to_string()),
            ResultValue::Status(text) => Ok(text.clone()),
            other => Err(mismatch("text", other)),
        }
    }

    /// Bulk or status reply as raw bytes
    pub fn as_bytes(&self) -> Result<Vec<u8>> {
        match self {
            ResultValue::Bulk(bytes) => Ok(bytes.to_vec()),
            ResultValue::Status(text) => Ok(text.as_bytes().to_vec()),
            other => Err(mismatch("bytes", other)),
        }
    }

    /// Integer reply, or a bulk/status reply holding a decimal number
    pub fn as_integer(&self) -> Result<i64> {
        match self {
            ResultValue::Integer(n) => Ok(*n),
            ResultValue::Bulk(bytes) => Ok(std::str::from_utf8(bytes)?.parse()?),
            ResultValue::Status(text) => Ok(text.parse()?),
            other => Err(mismatch("integer", other)),
        }
    }

    /// Array of bulk/status replies as a list of text
    pub fn as_text_sequence(&self) -> Result<Vec<String>> {
        match self {
            ResultValue::Array(items) => items.iter().map(element_text).collect(),
            other => Err(mismatch("text sequence", other)),
        }
    }

    /// Array of alternating keys and values as a map
    ///
    /// A later duplicate key overwrites an earlier one.
    pub fn as_text_mapping(&self) -> Result<HashMap<String, String>> {
        let items = match self {
            ResultValue::Array(items) => items,
            other => return Err(mismatch("text mapping", other)),
        };
        if items.len() % 2 != 0 {
            return Err(ClientError::OddMappingLength(items.len()));
        }

        items
            .chunks_exact(2)
            .map(|pair| -> Result<(String, String)> {
                Ok((element_text(&pair[0])?, element_text(&pair[1])?))
            })
            .collect()
    }
}

fn element_text(value: &ResultValue) -> Result<String> {
    match value {
        ResultValue::Bulk(_) | ResultValue::Status(_) => value.as_text(),
        other => Err(mismatch("text element", other)),
    }
}

fn mismatch(target: &'static str, found: &ResultValue) -> ClientError {
    match found {
        ResultValue::Error(msg) => ClientError::Server(msg.clone()),
        other => ClientError::TypeMismatch {
            target,
            found: other.kind(),
        },
    }
}

// =============================================================================
// Generic Conversion
// =============================================================================

/// Types a reply can be narrowed into
pub trait FromResultValue: Sized {
    fn from_result_value(value: ResultValue) -> Result<Self>;
}

impl FromResultValue for ResultValue {
    fn from_result_value(value: ResultValue) -> Result<Self> {
        Ok(value)
    }
}

impl FromResultValue for String {
    fn from_result_value(value: ResultValue) -> Result<Self> {
        match value {
            ResultValue::Status(text) => Ok(text),
            other => other.as_text(),
        }
    }
}

impl FromResultValue for Vec<u8> {
    fn from_result_value(value: ResultValue) -> Result<Self> {
        value.as_bytes()
    }
}

impl FromResultValue for i64 {
    fn from_result_value(value: ResultValue) -> Result<Self> {
        value.as_integer()
    }
}

impl FromResultValue for Vec<String> {
    fn from_result_value(value: ResultValue) -> Result<Self> {
        value.as_text_sequence()
    }
}

impl FromResultValue for HashMap<String, String> {
    fn from_result_value(value: ResultValue) -> Result<Self> {
        value.as_text_mapping()
    }
}

/// Nil becomes `None`; error replies still fail
impl<T: FromResultValue> FromResultValue for Option<T> {
    fn from_result_value(value: ResultValue) -> Result<Self> {
        match value {
            ResultValue::Nil => Ok(None),
            other => T::from_result_value(other).map(Some),
        }
    }
}

impl ResultValue {
    /// Narrow into any supported target
    pub fn convert<T: FromResultValue>(self) -> Result<T> {
        T::from_result_value(self)
    }
}
