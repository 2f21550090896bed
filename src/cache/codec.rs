//! Value Codec Module
//!
//! Converts between the primitive value kinds and the store's byte form.
//!
//! The store keeps no type tags, so the kind must be named again at decode
//! time. Integers and floats are written as 8 big-endian bytes.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

// == Decode Error ==
/// Failure to turn stored bytes back into a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No bytes were stored under the key
    #[error("no value stored under key")]
    Absent,

    /// Fixed-width kind read from bytes of the wrong size
    #[error("cannot decode {kind}: expected {expected} bytes, found {actual}")]
    InvalidLength {
        kind: ValueKind,
        expected: usize,
        actual: usize,
    },

    /// Text kind read from bytes that are not UTF-8
    #[error("stored bytes are not valid UTF-8")]
    InvalidUtf8,

    /// Textual number that does not parse
    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

// == Value Kind ==
/// The kinds of value the cache can round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    Binary,
    Integer,
    Float,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Binary => "binary",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
        };
        f.write_str(name)
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ValueKind::Text),
            "binary" => Ok(ValueKind::Binary),
            "integer" => Ok(ValueKind::Integer),
            "float" => Ok(ValueKind::Float),
            other => Err(format!("unknown value kind '{}'", other)),
        }
    }
}

// == Stored Value ==
/// A value as handed to the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Text(String),
    Binary(Vec<u8>),
    Integer(i64),
    Float(f64),
}

impl StoredValue {
    /// The kind this value decodes back as.
    pub fn kind(&self) -> ValueKind {
        match self {
            StoredValue::Text(_) => ValueKind::Text,
            StoredValue::Binary(_) => ValueKind::Binary,
            StoredValue::Integer(_) => ValueKind::Integer,
            StoredValue::Float(_) => ValueKind::Float,
        }
    }

    /// Encodes the value into its stored byte form.
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    /// Renders the value as an argument in call history.
    ///
    /// Text is quoted and escaped, binary is shown as `b"..."`.
    pub fn repr(&self) -> String {
        match self {
            StoredValue::Text(text) => format!("{:?}", text),
            StoredValue::Binary(bytes) => format!("b\"{}\"", bytes.escape_ascii()),
            StoredValue::Integer(value) => value.to_string(),
            StoredValue::Float(value) => format!("{:?}", value),
        }
    }

    /// Builds a value of `kind` from its textual form.
    ///
    /// Binary takes the UTF-8 bytes of `input` as-is.
    pub fn parse(kind: ValueKind, input: &str) -> Result<Self, DecodeError> {
        match kind {
            ValueKind::Text => Ok(StoredValue::Text(input.to_string())),
            ValueKind::Binary => Ok(StoredValue::Binary(input.as_bytes().to_vec())),
            ValueKind::Integer => input
                .trim()
                .parse()
                .map(StoredValue::Integer)
                .map_err(|_| DecodeError::InvalidNumber(input.to_string())),
            ValueKind::Float => input
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(StoredValue::Float)
                .ok_or_else(|| DecodeError::InvalidNumber(input.to_string())),
        }
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::Text(value.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        StoredValue::Text(value)
    }
}

impl From<Vec<u8>> for StoredValue {
    fn from(value: Vec<u8>) -> Self {
        StoredValue::Binary(value)
    }
}

impl From<i64> for StoredValue {
    fn from(value: i64) -> Self {
        StoredValue::Integer(value)
    }
}

impl From<f64> for StoredValue {
    fn from(value: f64) -> Self {
        StoredValue::Float(value)
    }
}

// == Encode ==
/// Encodes `value` into bytes for the store.
pub fn encode(value: &StoredValue) -> Vec<u8> {
    match value {
        StoredValue::Text(text) => text.as_bytes().to_vec(),
        StoredValue::Binary(bytes) => bytes.clone(),
        StoredValue::Integer(int) => int.to_be_bytes().to_vec(),
        StoredValue::Float(float) => float.to_bits().to_be_bytes().to_vec(),
    }
}

// == Decode ==
/// Decodes stored bytes as `kind`.
///
/// `None` means the key was absent and always fails with [`DecodeError::Absent`].
pub fn decode(bytes: Option<&[u8]>, kind: ValueKind) -> Result<StoredValue, DecodeError> {
    match kind {
        ValueKind::Text => as_text(bytes).map(StoredValue::Text),
        ValueKind::Binary => as_binary(bytes).map(StoredValue::Binary),
        ValueKind::Integer => as_int(bytes).map(StoredValue::Integer),
        ValueKind::Float => as_float(bytes).map(StoredValue::Float),
    }
}

/// Decodes UTF-8 text.
pub fn as_text(bytes: Option<&[u8]>) -> Result<String, DecodeError> {
    let bytes = bytes.ok_or(DecodeError::Absent)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
}

/// Returns the bytes unchanged.
pub fn as_binary(bytes: Option<&[u8]>) -> Result<Vec<u8>, DecodeError> {
    bytes.map(<[u8]>::to_vec).ok_or(DecodeError::Absent)
}

/// Decodes a big-endian 64-bit signed integer.
pub fn as_int(bytes: Option<&[u8]>) -> Result<i64, DecodeError> {
    fixed_width(bytes, ValueKind::Integer).map(i64::from_be_bytes)
}

/// Decodes a big-endian IEEE-754 double.
pub fn as_float(bytes: Option<&[u8]>) -> Result<f64, DecodeError> {
    fixed_width(bytes, ValueKind::Float).map(|raw| f64::from_bits(u64::from_be_bytes(raw)))
}

/// Decodes a counter written by the store's increment (decimal text).
pub fn as_counter(bytes: Option<&[u8]>) -> Result<u64, DecodeError> {
    let text = as_text(bytes)?;
    text.trim()
        .parse()
        .map_err(|_| DecodeError::InvalidNumber(text.clone()))
}

fn fixed_width(bytes: Option<&[u8]>, kind: ValueKind) -> Result<[u8; 8], DecodeError> {
    let bytes = bytes.ok_or(DecodeError::Absent)?;
    bytes.try_into().map_err(|_| DecodeError::InvalidLength {
        kind,
        expected: 8,
        actual: bytes.len(),
    })
}
