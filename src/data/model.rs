use std::fmt;

// ---------------------------------------------------------------------------
// MetadataValue – a single typed cell in a manifest column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Numeric columns sort by it, so `MetadataValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so rows can be sorted by any column --

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 3,
                Date(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed int/float columns compare numerically.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Date(d) => write!(f, "{d}"),
            MetadataValue::Null => Ok(()),
        }
    }
}

/// Cell texts a dataframe reader treats as missing.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl MetadataValue {
    /// Guess the type of a CSV cell the way a dataframe reader would.
    pub fn guess(s: &str) -> MetadataValue {
        if NA_TOKENS.contains(&s) {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            if !f.is_nan() {
                return MetadataValue::Float(f);
            }
        }
        if s == "true" || s == "false" || s == "True" || s == "False" {
            return MetadataValue::Bool(s.eq_ignore_ascii_case("true"));
        }
        MetadataValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Cell / ManifestRow – one row of the manifest
// ---------------------------------------------------------------------------

/// One manifest cell: the text exactly as stored, plus its typed value.
///
/// Identifiers and filter comparisons use `raw`. Sorting uses `value` in
/// numeric columns and `raw` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub raw: String,
    pub value: MetadataValue,
}

impl Cell {
    pub fn from_text(raw: &str) -> Self {
        Cell {
            raw: raw.to_string(),
            value: MetadataValue::guess(raw),
        }
    }

    pub fn from_value(value: MetadataValue) -> Self {
        Cell {
            raw: value.to_string(),
            value,
        }
    }
}

/// A single manifest row. Cells are positionally aligned with
/// [`Manifest::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRow {
    pub cells: Vec<Cell>,
}

// ---------------------------------------------------------------------------
// Manifest – the complete loaded table
// ---------------------------------------------------------------------------

/// The parsed manifest: column names in file order and every row.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub columns: Vec<String>,
    pub rows: Vec<ManifestRow>,
}

impl Manifest {
    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the manifest has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether every non-null cell of a column holds a number.
    ///
    /// A single text cell makes the whole column text, the same way a
    /// dataframe reader falls back to an object column.
    pub fn column_is_numeric(&self, idx: usize) -> bool {
        self.rows
            .iter()
            .filter_map(|row| row.cells.get(idx))
            .all(|cell| {
                matches!(
                    cell.value,
                    MetadataValue::Integer(_) | MetadataValue::Float(_) | MetadataValue::Null
                )
            })
    }
}
