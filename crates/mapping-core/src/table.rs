//! Core table types for representing mapping files

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single data row: one string field per header column
pub type Row = Vec<String>;

fn default_field_delimiter() -> char {
    '\t'
}

fn default_comment_prefix() -> String {
    "#".to_string()
}

/// Options recognized when a mapping file is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Separator between fields on a line
    #[serde(default = "default_field_delimiter")]
    pub field_delimiter: char,
    /// Marker at the start of the header and comment lines
    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            field_delimiter: default_field_delimiter(),
            comment_prefix: default_comment_prefix(),
        }
    }
}

impl LoadOptions {
    /// Create options with a custom delimiter and comment prefix
    pub fn new(field_delimiter: char, comment_prefix: impl Into<String>) -> Self {
        Self {
            field_delimiter,
            comment_prefix: comment_prefix.into(),
        }
    }

    /// The delimiter as a single byte, as required by the csv reader
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.field_delimiter.is_ascii() {
            Ok(self.field_delimiter as u8)
        } else {
            Err(Error::InvalidDelimiter(self.field_delimiter))
        }
    }

    /// Whether a line is a comment under these options
    pub fn is_comment(&self, line: &str) -> bool {
        !self.comment_prefix.is_empty() && line.starts_with(&self.comment_prefix)
    }
}

/// A loaded mapping file
///
/// Every row holds exactly one field per header column; the loader rejects
/// anything else. Values are always kept as text and converted on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingTable {
    pub(crate) options: LoadOptions,
    pub(crate) header_fields: Vec<String>,
    pub(crate) column_index: HashMap<String, usize>,
    pub(crate) row_ids: Vec<String>,
    pub(crate) row_index: HashMap<String, usize>,
    pub(crate) rows: Vec<Row>,
    pub(crate) comments: Vec<String>,
}

impl MappingTable {
    /// Build a table from already split parts, computing the indices.
    ///
    /// Rows are trusted to match the header width.
    pub(crate) fn from_parts(
        options: LoadOptions,
        header_fields: Vec<String>,
        comments: Vec<String>,
        rows: Vec<Row>,
    ) -> Self {
        let column_index = index_columns(&header_fields);

        let mut row_ids = Vec::with_capacity(rows.len());
        let mut row_index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let id = row.first().cloned().unwrap_or_default();
            row_index.insert(id.clone(), i);
            row_ids.push(id);
        }

        Self {
            options,
            header_fields,
            column_index,
            row_ids,
            row_index,
            rows,
            comments,
        }
    }

    /// Options the table was loaded with
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Column names, in header order
    pub fn header_fields(&self) -> &[String] {
        &self.header_fields
    }

    /// Comment lines other than the header, without line terminators
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Row identifiers, in row order
    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    /// All rows, in file order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.header_fields.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a column with this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    /// Position of a column, failing with the list of valid columns
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.column_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownColumn {
                name: name.to_string(),
                valid: self.header_fields.clone(),
            })
    }

    /// Positions of several columns, in the order given
    pub fn column_indices(&self, names: &[&str]) -> Result<Vec<usize>> {
        names.iter().map(|name| self.column_index(name)).collect()
    }

    /// Find a row by its identifier
    pub fn row(&self, id: &str) -> Option<&[String]> {
        self.row_index.get(id).map(|&i| self.rows[i].as_slice())
    }

    /// Read one cell; `Ok(None)` when the row id is unknown
    pub fn cell(&self, id: &str, column: &str) -> Result<Option<&str>> {
        let col = self.column_index(column)?;
        Ok(self.row(id).map(|row| row[col].as_str()))
    }
}

/// Map each header name to its position; a repeated name keeps the last one
pub(crate) fn index_columns(header_fields: &[String]) -> HashMap<String, usize> {
    header_fields
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}
