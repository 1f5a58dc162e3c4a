//! Numeric / non-numeric partitioning of rows

use crate::error::Result;
use crate::table::MappingTable;

/// A field that either converted or was kept as its raw text
#[derive(Debug, Clone, PartialEq)]
pub enum MaybeNumeric<T> {
    Numeric(T),
    Raw(String),
}

impl<T> MaybeNumeric<T> {
    /// The converted value, if any
    pub fn numeric(&self) -> Option<&T> {
        match self {
            MaybeNumeric::Numeric(value) => Some(value),
            MaybeNumeric::Raw(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, MaybeNumeric::Numeric(_))
    }
}

/// Row ids split by whether every requested column converted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumericPartition {
    /// Rows where all requested columns converted
    pub numeric: Vec<String>,
    /// Rows with at least one unconvertible value
    pub non_numeric: Vec<String>,
}

impl MappingTable {
    /// Yield the converted values of `columns` for rows where all of them convert.
    ///
    /// Values come in the order the columns were requested. Rows with any
    /// unconvertible value are skipped.
    pub fn iter_numeric_rows<'a, T, F>(
        &'a self,
        columns: &[&str],
        convert: F,
    ) -> Result<impl Iterator<Item = Vec<T>> + 'a>
    where
        F: Fn(&str) -> Option<T> + 'a,
        T: 'a,
    {
        let indices = self.column_indices(columns)?;
        Ok(self.rows.iter().filter_map(move |row| {
            indices
                .iter()
                .map(|&i| convert(&row[i]))
                .collect::<Option<Vec<T>>>()
        }))
    }

    /// Yield per-row values of `columns` for rows where at least one does not convert.
    ///
    /// Each value is converted when possible and kept raw otherwise. This is
    /// the complement of [`MappingTable::iter_numeric_rows`].
    pub fn iter_non_numeric_rows<'a, T, F>(
        &'a self,
        columns: &[&str],
        convert: F,
    ) -> Result<impl Iterator<Item = Vec<MaybeNumeric<T>>> + 'a>
    where
        F: Fn(&str) -> Option<T> + 'a,
        T: 'a,
    {
        let indices = self.column_indices(columns)?;
        Ok(self.rows.iter().filter_map(move |row| {
            let fields: Vec<MaybeNumeric<T>> = indices
                .iter()
                .map(|&i| match convert(&row[i]) {
                    Some(value) => MaybeNumeric::Numeric(value),
                    None => MaybeNumeric::Raw(row[i].clone()),
                })
                .collect();
            if fields.iter().all(MaybeNumeric::is_numeric) {
                None
            } else {
                Some(fields)
            }
        }))
    }

    /// Yield `(column, values)` for each requested column whose values all convert
    pub fn iter_numeric_columns<'a, T, F>(
        &'a self,
        columns: &[&str],
        convert: F,
    ) -> Result<impl Iterator<Item = (&'a str, Vec<T>)> + 'a>
    where
        F: Fn(&str) -> Option<T> + 'a,
        T: 'a,
    {
        let indices = self.column_indices(columns)?;
        Ok(indices.into_iter().filter_map(move |i| {
            let values = self
                .rows
                .iter()
                .map(|row| convert(&row[i]))
                .collect::<Option<Vec<T>>>();
            if values.is_none() {
                log::debug!("column '{}' has unconvertible values", self.header_fields[i]);
            }
            values.map(|v| (self.header_fields[i].as_str(), v))
        }))
    }

    /// Split row ids by whether every value in `columns` converts
    pub fn partition_numeric<T, F>(&self, columns: &[&str], convert: F) -> Result<NumericPartition>
    where
        F: Fn(&str) -> Option<T>,
    {
        let indices = self.column_indices(columns)?;
        let mut partition = NumericPartition::default();
        for (id, row) in self.row_ids.iter().zip(&self.rows) {
            if indices.iter().all(|&i| convert(&row[i]).is_some()) {
                partition.numeric.push(id.clone());
            } else {
                partition.non_numeric.push(id.clone());
            }
        }
        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{to_float, to_int};
    use crate::parser::parse_str;
    use crate::table::LoadOptions;

    const INTERPOLATION: &str = "#SampleID\tTemp\tGrowthRate\tDescription\n\
        #Comment line, full of crazy comments\n\
        S.1\t1.0\t3.0\tSample.1.Description\n\
        S.2\t2.0\t2.0\tSample.2.Description\n\
        S.3\t3.0\t0.0\tSample.3.Description\n\
        S.4\t0.0\tUnknown\tSample.4.Description\n\
        S.5\t1.0\tUnknown\tSample.5.Description\n\
        S.6\t1.5\tUnknown\tSample.6.Description\n\
        S.7\t2.72\tUnknown\tSample.7.Description\n\
        S.8\t3.14\tUnknown\tSample.8.Description\n";

    fn table() -> MappingTable {
        parse_str(INTERPOLATION, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_numeric_rows_skip_unconvertible() {
        let table = table();
        let rows: Vec<Vec<f64>> = table
            .iter_numeric_rows(&["Temp", "GrowthRate"], to_float)
            .unwrap()
            .collect();
        assert_eq!(rows, vec![vec![1.0, 3.0], vec![2.0, 2.0], vec![3.0, 0.0]]);
    }

    #[test]
    fn test_numeric_rows_follow_requested_order() {
        let table = table();
        let first = table
            .iter_numeric_rows(&["GrowthRate", "Temp"], to_float)
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(first, vec![3.0, 1.0]);
    }

    #[test]
    fn test_non_numeric_rows_with_custom_conversion() {
        let table = table();
        let rows: Vec<Vec<MaybeNumeric<i64>>> = table
            .iter_non_numeric_rows(&["Temp", "GrowthRate"], to_int)
            .unwrap()
            .collect();

        let unknown = || MaybeNumeric::Raw("Unknown".to_string());
        assert_eq!(
            rows,
            vec![
                vec![MaybeNumeric::Numeric(0), unknown()],
                vec![MaybeNumeric::Numeric(1), unknown()],
                vec![MaybeNumeric::Numeric(1), unknown()],
                vec![MaybeNumeric::Numeric(2), unknown()],
                vec![MaybeNumeric::Numeric(3), unknown()],
            ]
        );
    }

    #[test]
    fn test_non_numeric_rows_expose_converted_values() {
        let table = table();
        let temps: Vec<f64> = table
            .iter_non_numeric_rows(&["Temp", "GrowthRate"], to_float)
            .unwrap()
            .filter_map(|fields| fields[0].numeric().copied())
            .collect();
        assert_eq!(temps.len(), 5);
        assert_eq!(temps[..4], [0.0, 1.0, 1.5, 2.72]);

        let growth = MaybeNumeric::<f64>::Raw("Unknown".to_string());
        assert_eq!(growth.numeric(), None);
        assert!(!growth.is_numeric());
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let table = table();
        let partition = table.partition_numeric(&["Temp", "GrowthRate"], to_float).unwrap();
        assert_eq!(partition.numeric, vec!["S.1", "S.2", "S.3"]);
        assert_eq!(partition.non_numeric, vec!["S.4", "S.5", "S.6", "S.7", "S.8"]);

        let numeric_count = table
            .iter_numeric_rows(&["Temp", "GrowthRate"], to_float)
            .unwrap()
            .count();
        let non_numeric_count = table
            .iter_non_numeric_rows(&["Temp", "GrowthRate"], to_float)
            .unwrap()
            .count();
        assert_eq!(numeric_count + non_numeric_count, table.row_count());
    }

    #[test]
    fn test_numeric_columns() {
        let table = parse_str(
            "#SampleID\tDOB\tTreatment\nPC.354\t20061218\tControl\nPC.355\t20060817\tControl\n",
            &LoadOptions::default(),
        )
        .unwrap();
        let cols: Vec<(&str, Vec<i64>)> = table
            .iter_numeric_columns(&["DOB", "Treatment"], to_int)
            .unwrap()
            .collect();
        assert_eq!(cols, vec![("DOB", vec![20061218, 20060817])]);
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let table = table();
        assert!(table.iter_numeric_rows(&["pH"], to_float).is_err());
        assert!(table.iter_non_numeric_rows(&["Temp", "pH"], to_float).is_err());
    }
}
