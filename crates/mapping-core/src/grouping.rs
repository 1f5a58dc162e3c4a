//! Splitting a table into independent sub-tables by column values

use crate::error::Result;
use crate::table::{MappingTable, Row};
use std::collections::BTreeMap;

/// Values of the split columns shared by every row of a group, in column order
pub type GroupKey = Vec<String>;

impl MappingTable {
    /// Partition the table into one new table per distinct key of `columns`.
    ///
    /// Each group carries the source header, delimiter options and comment
    /// lines, and its own copy of the matching rows in source order. Groups
    /// are ordered by key.
    pub fn split_by_columns(&self, columns: &[&str]) -> Result<BTreeMap<GroupKey, MappingTable>> {
        let indices = self.column_indices(columns)?;

        let mut grouped: BTreeMap<GroupKey, Vec<Row>> = BTreeMap::new();
        for row in &self.rows {
            let key: GroupKey = indices.iter().map(|&i| row[i].clone()).collect();
            grouped.entry(key).or_default().push(row.clone());
        }

        log::debug!(
            "split {} rows on [{}] into {} groups",
            self.rows.len(),
            columns.join(", "),
            grouped.len()
        );

        Ok(grouped
            .into_iter()
            .map(|(key, rows)| {
                let table = MappingTable::from_parts(
                    self.options.clone(),
                    self.header_fields.clone(),
                    self.comments.clone(),
                    rows,
                );
                (key, table)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputOptions;
    use crate::parser::parse_str;
    use crate::table::LoadOptions;
    use std::collections::HashSet;

    const INTERPOLATION: &str = "#SampleID\tTemp\tGrowthRate\tDescription\n\
        #Comment line, full of crazy comments\n\
        #Another comment line\n\
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

    fn key(values: &[&str]) -> GroupKey {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_split_keys() {
        let groups = table().split_by_columns(&["Temp"]).unwrap();
        let keys: Vec<&GroupKey> = groups.keys().collect();
        assert_eq!(
            keys,
            vec![
                &key(&["0.0"]),
                &key(&["1.0"]),
                &key(&["1.5"]),
                &key(&["2.0"]),
                &key(&["2.72"]),
                &key(&["3.0"]),
                &key(&["3.14"]),
            ]
        );
    }

    #[test]
    fn test_split_group_contents() {
        let groups = table().split_by_columns(&["Temp"]).unwrap();

        let lines = groups[&key(&["1.0"])].delimited_lines(None, &OutputOptions::default());
        assert_eq!(
            lines,
            vec![
                "#SampleID\tTemp\tGrowthRate\tDescription\n",
                "#Comment line, full of crazy comments\n",
                "#Another comment line\n",
                "S.1\t1.0\t3.0\tSample.1.Description\n",
                "S.5\t1.0\tUnknown\tSample.5.Description\n",
            ]
        );

        let lines = groups[&key(&["2.72"])].delimited_lines(None, &OutputOptions::default());
        assert_eq!(lines.last().unwrap(), "S.7\t2.72\tUnknown\tSample.7.Description\n");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_split_partitions_every_row_once() {
        let source = table();
        let groups = source.split_by_columns(&["GrowthRate", "Description"]).unwrap();

        let mut seen = HashSet::new();
        let mut total = 0;
        for (key, group) in &groups {
            for (id, row) in group.iter_rows(None) {
                assert!(seen.insert(id.to_string()), "row {id} in two groups");
                assert_eq!(&row[2], &key[0]);
                assert_eq!(&row[3], &key[1]);
                total += 1;
            }
        }
        assert_eq!(total, source.row_count());
    }

    #[test]
    fn test_groups_are_independent_copies() {
        let source = table();
        let mut groups = source.split_by_columns(&["Temp"]).unwrap();
        let group = groups.get_mut(&key(&["1.0"])).unwrap();

        let updates = [("S.5".to_string(), "9.9".to_string())].into_iter().collect();
        group
            .update_column("GrowthRate", "SampleID", &updates, crate::convert::as_text, &[])
            .unwrap();

        assert_eq!(group.cell("S.5", "GrowthRate").unwrap(), Some("9.9"));
        assert_eq!(source.cell("S.5", "GrowthRate").unwrap(), Some("Unknown"));
    }

    #[test]
    fn test_split_unknown_column() {
        assert!(table().split_by_columns(&["pH"]).is_err());
    }
}
