//! Extra binary data attached to characters
//!
//! Extra data files are TOML documents keyed by character index. Each index
//! may declare a `data` list (bytes written from offset 0) and a `metadata`
//! list (bytes written to the reserved region at offset 54). Every list entry
//! is a single-key table naming how its value is encoded:
//!
//! ```toml
//! [150]
//! metadata = [{ u8 = 5 }, { lu16 = "0x012c" }]
//!
//! [255]
//! data = [{ s = "INAV" }, { bi32 = -2 }]
//! ```
//!
//! | Key | Encoding |
//! |-----|----------|
//! | `s` | string bytes, verbatim |
//! | `u8`, `i8` | 1 byte |
//! | `lu16`, `bu16`, `li16`, `bi16` | 2 bytes, little/big endian |
//! | `lu32`, `bu32`, `li32`, `bi32` | 4 bytes |
//! | `lu64`, `bu64`, `li64`, `bi64` | 8 bytes |
//!
//! Integers may be given as TOML integers, decimal strings, `0x` prefixed hex
//! strings or one-character strings (the character's code point).

use std::fmt;
use std::path::Path;

use hashbrown::HashMap;
use max7456_mcm::{CHAR_BYTES, Char, METADATA_BYTES, MIN_CHAR_BYTES, TRANSPARENT_BYTE};
use toml::Value;

/// Byte order of a multi-byte field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// A typed value appended to a character's data or metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Str(String),
    U8(u8),
    I8(i8),
    U16(u16, Endian),
    I16(i16, Endian),
    U32(u32, Endian),
    I32(i32, Endian),
    U64(u64, Endian),
    I64(i64, Endian),
}

macro_rules! ordered_bytes {
    ($value:expr, $endian:expr) => {
        match $endian {
            Endian::Little => $value.to_le_bytes(),
            Endian::Big => $value.to_be_bytes(),
        }
    };
}

impl Field {
    /// Parse the value of a single-key record
    pub fn parse(key: &str, value: &Value) -> Result<Self, FieldError> {
        use Endian::{Big, Little};

        let field = match key {
            "s" => match value {
                Value::String(s) => Field::Str(s.clone()),
                other => return Err(FieldError::ExpectedString(other.type_str())),
            },
            "u8" => Field::U8(ranged(key, value)?),
            "i8" => Field::I8(ranged(key, value)?),
            "lu16" => Field::U16(ranged(key, value)?, Little),
            "bu16" => Field::U16(ranged(key, value)?, Big),
            "li16" => Field::I16(ranged(key, value)?, Little),
            "bi16" => Field::I16(ranged(key, value)?, Big),
            "lu32" => Field::U32(ranged(key, value)?, Little),
            "bu32" => Field::U32(ranged(key, value)?, Big),
            "li32" => Field::I32(ranged(key, value)?, Little),
            "bi32" => Field::I32(ranged(key, value)?, Big),
            "lu64" => Field::U64(ranged(key, value)?, Little),
            "bu64" => Field::U64(ranged(key, value)?, Big),
            "li64" => Field::I64(ranged(key, value)?, Little),
            "bi64" => Field::I64(ranged(key, value)?, Big),
            _ => return Err(FieldError::UnknownKind(key.to_string())),
        };
        Ok(field)
    }

    /// Append the encoded value to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Field::Str(s) => out.extend_from_slice(s.as_bytes()),
            Field::U8(v) => out.push(*v),
            Field::I8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Field::U16(v, e) => out.extend_from_slice(&ordered_bytes!(v, e)),
            Field::I16(v, e) => out.extend_from_slice(&ordered_bytes!(v, e)),
            Field::U32(v, e) => out.extend_from_slice(&ordered_bytes!(v, e)),
            Field::I32(v, e) => out.extend_from_slice(&ordered_bytes!(v, e)),
            Field::U64(v, e) => out.extend_from_slice(&ordered_bytes!(v, e)),
            Field::I64(v, e) => out.extend_from_slice(&ordered_bytes!(v, e)),
        }
    }
}

fn ranged<T: TryFrom<i128>>(kind: &str, value: &Value) -> Result<T, FieldError> {
    let v = integer(value)?;
    T::try_from(v).map_err(|_| FieldError::OutOfRange {
        kind: kind.to_string(),
        value: v,
    })
}

fn integer(value: &Value) -> Result<i128, FieldError> {
    match value {
        Value::Integer(i) => Ok(i128::from(*i)),
        Value::String(s) => parse_integer(s),
        other => Err(FieldError::NotAnInteger(other.type_str())),
    }
}

/// Parse a decimal, `0x` hex or single-character integer
pub fn parse_integer(s: &str) -> Result<i128, FieldError> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(i128::from(u32::from(c)));
    }
    let invalid = || FieldError::InvalidNumber(s.to_string());
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if digits.starts_with(['+', '-']) {
        return Err(invalid());
    }
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16),
        None => digits.parse::<i128>(),
    }
    .map_err(|_| invalid())?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Which buffer of a character a list appends to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Data,
    Metadata,
}

impl Section {
    fn key(self) -> &'static str {
        match self {
            Section::Data => "data",
            Section::Metadata => "metadata",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "data" => Some(Section::Data),
            "metadata" => Some(Section::Metadata),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error parsing a single value
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("can't encode value with key {0:?}")]
    UnknownKind(String),

    #[error("entry must be a table with exactly one key, found {0}")]
    NotARecord(String),

    #[error("argument to s must be a string, found {0}")]
    ExpectedString(&'static str),

    #[error("can't convert {0} to an integer")]
    NotAnInteger(&'static str),

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("can't encode {value} as {kind}")]
    OutOfRange { kind: String, value: i128 },
}

/// Error turning accumulated bytes into a character
#[derive(Debug, thiserror::Error)]
pub enum CharDataError {
    #[error("character is empty")]
    Empty,

    #[error("character has too many bytes ({data}+{metadata})={total} > {max}", total = data + metadata, max = CHAR_BYTES)]
    TooLarge { data: usize, metadata: usize },

    #[error("character metadata with {0} bytes exceeds the maximum {max}", max = METADATA_BYTES)]
    MetadataTooLarge(usize),

    #[error("character has both visible pixels and extra data")]
    Conflict,
}

/// Error loading or applying extra data
#[derive(Debug, thiserror::Error)]
pub enum ExtraDataError {
    #[error("failed to read extra data from {origin}: {source}")]
    Read {
        origin: String,
        source: std::io::Error,
    },

    #[error("failed to parse extra data from {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },

    #[error("{origin}: invalid character index {key:?}")]
    InvalidIndex { origin: String, key: String },

    #[error("{origin}: character {index} must be a table, found {found}")]
    NotATable {
        origin: String,
        index: usize,
        found: &'static str,
    },

    #[error("{origin}: character {index} has unknown key {key:?} (expected data or metadata)")]
    UnknownSection {
        origin: String,
        index: usize,
        key: String,
    },

    #[error("{origin}: character {index}, {section} must be a list, found {found}")]
    NotAList {
        origin: String,
        index: usize,
        section: Section,
        found: &'static str,
    },

    #[error("{origin}: character {index}, {section} entry {entry}: {source}")]
    Field {
        origin: String,
        index: usize,
        section: Section,
        entry: usize,
        source: FieldError,
    },

    #[error("character {index}: {source}")]
    Char {
        index: usize,
        source: CharDataError,
    },
}

/// Data and metadata accumulated for one character
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharExtraData {
    pub data: Vec<u8>,
    pub metadata: Vec<u8>,
}

impl CharExtraData {
    pub fn push(&mut self, section: Section, field: &Field) {
        match section {
            Section::Data => field.write_to(&mut self.data),
            Section::Metadata => field.write_to(&mut self.metadata),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.metadata.is_empty()
    }

    /// Build a character made only of this data. Data starts at offset 0,
    /// metadata at offset 54 and the rest is transparent fill.
    pub fn char(&self) -> Result<Char, CharDataError> {
        let total = self.data.len() + self.metadata.len();
        if total == 0 {
            return Err(CharDataError::Empty);
        }
        if total > CHAR_BYTES {
            return Err(CharDataError::TooLarge {
                data: self.data.len(),
                metadata: self.metadata.len(),
            });
        }
        if self.metadata.len() > METADATA_BYTES {
            return Err(CharDataError::MetadataTooLarge(self.metadata.len()));
        }
        let mut buf = [TRANSPARENT_BYTE; CHAR_BYTES];
        buf[..self.data.len()].copy_from_slice(&self.data);
        let start = self.data.len().max(MIN_CHAR_BYTES);
        buf[start..start + self.metadata.len()].copy_from_slice(&self.metadata);
        Ok(Char::from_bytes(buf))
    }

    /// Overlay the metadata onto an existing character, keeping its pixels.
    /// Fails if there is data too, since the character already has visible
    /// pixels.
    pub fn merge_to(&self, existing: &Char) -> Result<Char, CharDataError> {
        if !self.data.is_empty() {
            return Err(CharDataError::Conflict);
        }
        if self.metadata.len() > METADATA_BYTES {
            return Err(CharDataError::MetadataTooLarge(self.metadata.len()));
        }
        let mut buf = existing.data();
        let meta = &mut buf[MIN_CHAR_BYTES..];
        meta.fill(TRANSPARENT_BYTE);
        meta[..self.metadata.len()].copy_from_slice(&self.metadata);
        Ok(Char::from_bytes(buf))
    }
}

/// The fields declared for one character in one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharFields {
    pub index: usize,
    pub data: Vec<Field>,
    pub metadata: Vec<Field>,
}

/// Parse an extra data document into typed fields, rejecting anything that
/// can't be encoded. `origin` names the document in errors.
pub fn parse_document(text: &str, origin: &str) -> Result<Vec<CharFields>, ExtraDataError> {
    let doc: toml::Table = toml::from_str(text).map_err(|source| ExtraDataError::Parse {
        origin: origin.to_string(),
        source,
    })?;
    let mut chars = Vec::with_capacity(doc.len());
    for (key, value) in &doc {
        let index = key
            .parse::<usize>()
            .map_err(|_| ExtraDataError::InvalidIndex {
                origin: origin.to_string(),
                key: key.clone(),
            })?;
        let table = value.as_table().ok_or_else(|| ExtraDataError::NotATable {
            origin: origin.to_string(),
            index,
            found: value.type_str(),
        })?;
        let mut fields = CharFields {
            index,
            ..Default::default()
        };
        for (section_key, list) in table {
            let section =
                Section::from_key(section_key).ok_or_else(|| ExtraDataError::UnknownSection {
                    origin: origin.to_string(),
                    index,
                    key: section_key.clone(),
                })?;
            let parsed = parse_list(list).map_err(|e| match e {
                ListError::NotAList(found) => ExtraDataError::NotAList {
                    origin: origin.to_string(),
                    index,
                    section,
                    found,
                },
                ListError::Entry(entry, source) => ExtraDataError::Field {
                    origin: origin.to_string(),
                    index,
                    section,
                    entry,
                    source,
                },
            })?;
            match section {
                Section::Data => fields.data.extend(parsed),
                Section::Metadata => fields.metadata.extend(parsed),
            }
        }
        chars.push(fields);
    }
    Ok(chars)
}

enum ListError {
    NotAList(&'static str),
    /// 1-based entry number and the error
    Entry(usize, FieldError),
}

fn parse_list(list: &Value) -> Result<Vec<Field>, ListError> {
    let entries = list
        .as_array()
        .ok_or_else(|| ListError::NotAList(list.type_str()))?;
    let mut fields = Vec::with_capacity(entries.len());
    for (ii, entry) in entries.iter().enumerate() {
        let field = parse_record(entry).map_err(|e| ListError::Entry(ii + 1, e))?;
        fields.push(field);
    }
    Ok(fields)
}

fn parse_record(entry: &Value) -> Result<Field, FieldError> {
    let record = entry
        .as_table()
        .ok_or_else(|| FieldError::NotARecord(entry.type_str().to_string()))?;
    let mut iter = record.iter();
    match (iter.next(), iter.next()) {
        (Some((key, value)), None) => Field::parse(key, value),
        _ => Err(FieldError::NotARecord(format!(
            "a table with {} keys",
            record.len()
        ))),
    }
}

/// Extra data for a set of characters, accumulated from one or more
/// documents. Later documents append to earlier ones, they never overwrite.
#[derive(Debug, Clone, Default)]
pub struct ExtraDataSet {
    entries: HashMap<usize, CharExtraData>,
}

impl ExtraDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&CharExtraData> {
        self.entries.get(&index)
    }

    /// Entries in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &CharExtraData)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        entries.into_iter()
    }

    /// Append parsed fields, in declaration order
    pub fn add(&mut self, chars: &[CharFields]) {
        for fields in chars {
            let entry = self.entries.entry(fields.index).or_default();
            for field in &fields.data {
                entry.push(Section::Data, field);
            }
            for field in &fields.metadata {
                entry.push(Section::Metadata, field);
            }
        }
    }

    /// Parse a document and append it. Nothing is appended if the document
    /// has errors.
    pub fn parse_str(&mut self, text: &str, origin: &str) -> Result<(), ExtraDataError> {
        let chars = parse_document(text, origin)?;
        self.add(&chars);
        Ok(())
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<(), ExtraDataError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ExtraDataError::Read {
            origin: origin.clone(),
            source,
        })?;
        self.parse_str(&text, &origin)
    }
}
