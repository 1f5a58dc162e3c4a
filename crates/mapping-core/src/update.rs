//! Column rewriting and merging

use crate::convert::{format_number, to_float, FloatKey};
use crate::error::{Error, Result};
use crate::table::MappingTable;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Key values that are never converted before lookup
pub const DEFAULT_IGNORE_VALUES: &[&str] = &["Unknown", "NULL", "unknown"];

/// Update keys a field can be looked up as without conversion.
///
/// Ignored key values skip the converter and go through `from_raw` instead.
pub trait RawKey: Sized {
    fn from_raw(field: &str) -> Option<Self>;
}

impl RawKey for String {
    fn from_raw(field: &str) -> Option<Self> {
        Some(field.to_string())
    }
}

// A float-keyed map has no entry for text like "Unknown"
impl RawKey for FloatKey {
    fn from_raw(_field: &str) -> Option<Self> {
        None
    }
}

impl RawKey for i64 {
    fn from_raw(field: &str) -> Option<Self> {
        field.parse().ok()
    }
}

impl MappingTable {
    /// Overwrite `target_column` in every row whose `key_column` value maps to an update.
    ///
    /// The key value is converted with `convert` before lookup, unless it is in
    /// `ignore_values`, in which case it is looked up as-is. Rows whose key does
    /// not convert, and rows with no matching update, keep their current value.
    pub fn update_column<K, V, F>(
        &mut self,
        target_column: &str,
        key_column: &str,
        updates: &HashMap<K, V>,
        convert: F,
        ignore_values: &[&str],
    ) -> Result<&mut Self>
    where
        K: Eq + Hash + RawKey,
        V: Display,
        F: Fn(&str) -> Option<K>,
    {
        let key_idx = self.column_index(key_column)?;
        let target_idx = self.column_index(target_column)?;

        let mut changed = 0usize;
        for row in &mut self.rows {
            let raw = row[key_idx].as_str();
            let key = if ignore_values.contains(&raw) {
                K::from_raw(raw)
            } else {
                convert(raw)
            };
            let Some(update) = key.and_then(|key| updates.get(&key)) else {
                continue;
            };
            row[target_idx] = update.to_string();
            changed += 1;
        }

        log::debug!(
            "updated {} rows of '{}' keyed on '{}'",
            changed,
            target_column,
            key_column
        );
        Ok(self)
    }

    /// Fill `target_column` with values interpolated over `reference_column`
    pub fn update_column_by_interpolation(
        &mut self,
        target_column: &str,
        reference_column: &str,
    ) -> Result<&mut Self> {
        let interpolation = self.interpolate(target_column, reference_column)?;
        let updates: HashMap<FloatKey, String> = interpolation
            .points()
            .map(|(x, y)| (FloatKey::new(x), format_number(y)))
            .collect();

        self.update_column(
            target_column,
            reference_column,
            &updates,
            |field| to_float(field).map(FloatKey::new),
            DEFAULT_IGNORE_VALUES,
        )
    }

    /// Lines mapping each row to its requested column values joined by `join_delimiter`.
    ///
    /// The first line joins the column names. Every line ends with `\n`.
    pub fn merged_columns_as_text<'a>(
        &'a self,
        columns: &[&str],
        join_delimiter: &str,
    ) -> Result<impl Iterator<Item = String> + 'a> {
        let indices = self.column_indices(columns)?;
        let header = format!("{}\n", columns.join(join_delimiter));
        let join_delimiter = join_delimiter.to_string();

        let rows = self.rows.iter().map(move |row| {
            let values: Vec<&str> = indices.iter().map(|&i| row[i].as_str()).collect();
            format!("{}\n", values.join(join_delimiter.as_str()))
        });
        Ok(std::iter::once(header).chain(rows))
    }

    /// Append a column whose values join the requested columns.
    ///
    /// The new column is named by joining the column names with `join_delimiter`.
    pub fn add_merged_column(&mut self, columns: &[&str], join_delimiter: &str) -> Result<&mut Self> {
        let indices = self.column_indices(columns)?;
        let name = columns.join(join_delimiter);
        if self.has_column(&name) {
            return Err(Error::InvalidArgument(format!(
                "column '{}' already exists",
                name
            )));
        }

        for row in &mut self.rows {
            let merged = indices
                .iter()
                .map(|&i| row[i].as_str())
                .collect::<Vec<_>>()
                .join(join_delimiter);
            row.push(merged);
        }
        self.column_index.insert(name.clone(), self.header_fields.len());
        self.header_fields.push(name);
        Ok(self)
    }
}
