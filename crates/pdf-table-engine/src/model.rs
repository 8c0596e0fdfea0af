use std::fmt::{Display, Formatter};
use std::path::Path;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Input document: raw bytes or a path on disk.
#[derive(Debug, Clone, Copy)]
pub enum PdfSource<'a> {
    Bytes(&'a [u8]),
    Path(&'a Path),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// A tabular region as detected in page text, before header handling.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
    pub confidence: f32,
}

/// A single cell of an extracted table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// Types raw cell text. Thousands separators are ignored when deciding
    /// whether the cell is numeric.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }

        match trimmed.replace(',', "").parse::<f64>() {
            Ok(number) if number.is_finite() => Self::Number(number),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    // i64::MAX is not representable as f64; stay strictly inside the range.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn as_integer(number: f64) -> Option<i64> {
        if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
            Some(number as i64)
        } else {
            None
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => match Self::as_integer(*number) {
                Some(integer) => write!(f, "{integer}"),
                None => write!(f, "{number}"),
            },
            Self::Empty => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(number) => match Self::as_integer(*number) {
                Some(integer) => serializer.serialize_i64(integer),
                None => serializer.serialize_f64(*number),
            },
            Self::Empty => serializer.serialize_none(),
        }
    }
}

/// A candidate table: named columns and rows of typed cells.
///
/// Every row holds exactly one cell per column. Serializes as a JSON array of
/// objects keyed by column name, keys in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub page: u32,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Encodes the table as a JSON array of row objects.
    ///
    /// # Errors
    /// Returns the serializer error; cells never produce one in practice.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

struct Record<'a>(&'a [String], &'a [CellValue]);

impl Serialize for Record<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, cell) in self.0.iter().zip(self.1) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Record(&self.columns, row))?;
        }
        seq.end()
    }
}
