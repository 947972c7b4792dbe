use std::cmp::Ordering;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::model::{Cell, Manifest, MetadataValue};

// ---------------------------------------------------------------------------
// Query: which rows are selected and how they are ordered
// ---------------------------------------------------------------------------

/// Named-column selection over a [`Manifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestQuery {
    /// Column holding the audio identifier.
    pub identifier_column: String,
    /// Column compared against `filter_value`.
    pub filter_column: String,
    /// Exact text a row's filter cell must equal to be kept.
    pub filter_value: String,
    /// Column used for the ascending sort.
    pub sort_column: String,
}

impl Default for ManifestQuery {
    fn default() -> Self {
        Self {
            identifier_column: "Name".into(),
            filter_column: "Set".into(),
            filter_value: crate::config::DEFAULT_SET.into(),
            sort_column: "Name".into(),
        }
    }
}

/// Return the identifiers of rows that pass the query, in sort order.
///
/// * Rows are kept when the filter cell's text equals `filter_value`.
/// * Ordering is ascending. The sort column is typed once over all rows:
///   numbers compare by value only if every non-null cell is numeric,
///   otherwise cells compare by their text. Nulls go last. The sort is
///   stable, so ties keep manifest order.
/// * No matching rows yields an empty list, not an error.
pub fn select_identifiers(manifest: &Manifest, query: &ManifestQuery) -> Result<Vec<String>> {
    let column = |name: &str| {
        manifest
            .column_index(name)
            .with_context(|| format!("manifest missing '{name}' column"))
    };
    let id_idx = column(&query.identifier_column)?;
    let filter_idx = column(&query.filter_column)?;
    let sort_idx = column(&query.sort_column)?;
    let numeric = manifest.column_is_numeric(sort_idx);

    let mut selected: Vec<_> = manifest
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            row.cells
                .get(filter_idx)
                .is_some_and(|cell| cell.raw == query.filter_value)
        })
        .map(|(row_no, row)| {
            let id = row
                .cells
                .get(id_idx)
                .with_context(|| format!("row {row_no} has no '{}' cell", query.identifier_column))?;
            let key = row
                .cells
                .get(sort_idx)
                .with_context(|| format!("row {row_no} has no '{}' cell", query.sort_column))?;
            Ok((key, id.raw.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    selected.sort_by(|(a, _), (b, _)| compare_sort_keys(a, b, numeric));

    Ok(selected.into_iter().map(|(_, id)| id).collect())
}

fn is_missing(value: &MetadataValue) -> bool {
    match value {
        MetadataValue::Null => true,
        MetadataValue::Float(f) => f.is_nan(),
        _ => false,
    }
}

fn compare_sort_keys(a: &Cell, b: &Cell, numeric: bool) -> Ordering {
    match (is_missing(&a.value), is_missing(&b.value)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ if numeric => a.value.cmp(&b.value),
        _ => a.raw.cmp(&b.raw),
    }
}
