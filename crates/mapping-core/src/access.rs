//! Row and column traversal over a loaded table

use crate::error::Result;
use crate::table::MappingTable;
use std::collections::{BTreeMap, HashSet};

/// Exact-match criteria: column name -> required value
pub type Criteria = BTreeMap<String, String>;

impl MappingTable {
    /// Iterate `(row_id, fields)` pairs in file order.
    ///
    /// With `row_ids`, only rows whose id is listed are yielded; the table's
    /// order is kept regardless of the order of the list.
    pub fn iter_rows<'a>(
        &'a self,
        row_ids: Option<&[&str]>,
    ) -> impl Iterator<Item = (&'a str, &'a [String])> + 'a {
        let wanted: Option<HashSet<String>> =
            row_ids.map(|ids| ids.iter().map(|id| id.to_string()).collect());

        self.row_ids
            .iter()
            .zip(&self.rows)
            .filter(move |(id, _)| wanted.as_ref().map_or(true, |w| w.contains(id.as_str())))
            .map(|(id, row)| (id.as_str(), row.as_slice()))
    }

    /// Iterate the fields of each (optionally filtered) row
    pub fn iter_row_data<'a>(
        &'a self,
        row_ids: Option<&[&str]>,
    ) -> impl Iterator<Item = &'a [String]> + 'a {
        self.iter_rows(row_ids).map(|(_, row)| row)
    }

    /// Iterate `(column_name, values)` for the requested columns.
    ///
    /// Without `columns` every column is produced in header order. Unknown
    /// column names fail before anything is yielded.
    pub fn iter_columns<'a>(
        &'a self,
        columns: Option<&[&str]>,
        row_ids: Option<&[&str]>,
    ) -> Result<impl Iterator<Item = (&'a str, Vec<&'a str>)> + 'a> {
        let selected: Vec<(&'a str, usize)> = match columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    let idx = self.column_index(name)?;
                    Ok((self.header_fields[idx].as_str(), idx))
                })
                .collect::<Result<_>>()?,
            None => self
                .header_fields
                .iter()
                .enumerate()
                .map(|(i, name)| (name.as_str(), i))
                .collect(),
        };
        let owned_ids: Option<Vec<String>> =
            row_ids.map(|ids| ids.iter().map(|id| id.to_string()).collect());

        Ok(selected.into_iter().map(move |(name, idx)| {
            let ids: Option<Vec<&str>> = owned_ids
                .as_ref()
                .map(|ids| ids.iter().map(String::as_str).collect());
            let values = self
                .iter_row_data(ids.as_deref())
                .map(|row| row[idx].as_str())
                .collect();
            (name, values)
        }))
    }

    /// Iterate only the values of the requested columns
    pub fn iter_column_data<'a>(
        &'a self,
        columns: Option<&[&str]>,
        row_ids: Option<&[&str]>,
    ) -> Result<impl Iterator<Item = Vec<&'a str>> + 'a> {
        Ok(self.iter_columns(columns, row_ids)?.map(|(_, values)| values))
    }

    /// True when every criterion's column holds exactly the required value.
    ///
    /// An empty criteria map matches every row.
    pub fn row_matches(&self, row: &[String], criteria: &Criteria) -> Result<bool> {
        for (column, value) in criteria {
            let idx = self.column_index(column)?;
            if row.get(idx).map(String::as_str) != Some(value.as_str()) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Iterate `(row_id, fields)` for rows matching all criteria
    pub fn rows_matching<'a>(
        &'a self,
        criteria: &Criteria,
    ) -> Result<impl Iterator<Item = (&'a str, &'a [String])> + 'a> {
        let checks: Vec<(usize, String)> = criteria
            .iter()
            .map(|(column, value)| Ok((self.column_index(column)?, value.clone())))
            .collect::<Result<_>>()?;

        Ok(self
            .iter_rows(None)
            .filter(move |(_, row)| checks.iter().all(|(idx, value)| row[*idx] == *value)))
    }
}
