//! Interpolation job files
//!
//! A job (JSON) names an input mapping file, the columns to fill in, the
//! reference column to interpolate over and, optionally, the columns that
//! split the data into groups interpolated separately. The groups are merged
//! back into a single output file.

use crate::error::{Error, Result};
use crate::grouping::GroupKey;
use crate::output::write_tables;
use crate::parser::parse_file;
use crate::table::{LoadOptions, MappingTable};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn default_min_rows() -> usize {
    5
}

/// An interpolation run over one mapping file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpolationJob {
    /// Mapping file to read
    pub input: PathBuf,
    /// File to write the updated mapping to
    pub output: PathBuf,
    /// Columns whose missing values are interpolated (the y axis)
    pub value_columns: Vec<String>,
    /// Column interpolated over (the x axis)
    pub reference_column: String,
    /// Interpolate only within rows sharing values of these columns
    #[serde(default)]
    pub split_columns: Vec<String>,
    /// Groups with fewer rows are written out unchanged
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
    /// How to read the input file
    #[serde(default)]
    pub load: LoadOptions,
}

impl InterpolationJob {
    /// Create a job with default split, threshold and load options
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        value_columns: Vec<String>,
        reference_column: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            value_columns,
            reference_column: reference_column.into(),
            split_columns: Vec::new(),
            min_rows: default_min_rows(),
            load: LoadOptions::default(),
        }
    }

    /// Load a job file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the job file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Interpolate every value column within each group of `table`
    pub fn apply(&self, table: MappingTable) -> Result<JobResult> {
        if self.value_columns.is_empty() {
            return Err(Error::InvalidArgument(
                "no columns to interpolate".to_string(),
            ));
        }
        table.column_index(&self.reference_column)?;
        for column in &self.value_columns {
            table.column_index(column)?;
        }

        let groups: Vec<(GroupKey, MappingTable)> = if self.split_columns.is_empty() {
            vec![(Vec::new(), table)]
        } else {
            let split: Vec<&str> = self.split_columns.iter().map(String::as_str).collect();
            table.split_by_columns(&split)?.into_iter().collect()
        };

        let mut result = JobResult::default();
        for (key, mut group) in groups {
            if group.row_count() < self.min_rows {
                log::warn!(
                    "skipping group [{}]: {} rows, need at least {}",
                    key.join(", "),
                    group.row_count(),
                    self.min_rows
                );
                result.skipped_groups.push(key);
                result.tables.push(group);
                continue;
            }

            for column in &self.value_columns {
                group.update_column_by_interpolation(column, &self.reference_column)?;
            }
            result.interpolated_groups += 1;
            result.tables.push(group);
        }

        Ok(result)
    }

    /// Read the input, apply the job and write the merged output
    pub fn run(&self) -> Result<JobResult> {
        let table = parse_file(&self.input, &self.load)?;
        let result = self.apply(table)?;

        let file = File::create(&self.output)?;
        let mut writer = BufWriter::new(file);
        result.write_to(&mut writer)?;
        writer.flush()?;

        Ok(result)
    }
}

/// Outcome of applying a job
#[derive(Debug, Clone, Default)]
pub struct JobResult {
    /// Groups after interpolation, in group order
    pub tables: Vec<MappingTable>,
    /// Number of groups that were interpolated
    pub interpolated_groups: usize,
    /// Keys of groups left unchanged for having too few rows
    pub skipped_groups: Vec<GroupKey>,
}

impl JobResult {
    /// Total rows across all groups
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(MappingTable::row_count).sum()
    }

    /// Write all groups as one mapping file
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_tables(writer, &self.tables)
    }
}
