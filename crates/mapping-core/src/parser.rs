//! Loader for delimited, commented mapping files

use crate::error::{Error, Result};
use crate::table::{index_columns, LoadOptions, MappingTable, Row};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Parse a mapping file from disk
pub fn parse_file<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<MappingTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let table = parse_reader(file, options)?;
    log::debug!(
        "loaded {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

/// Parse a mapping file from any reader, line by line as [`parse_lines`] does
pub fn parse_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<MappingTable> {
    let mut builder = TableBuilder::new(options);
    for (line_no, line) in BufReader::new(reader).lines().enumerate() {
        builder.push_line(line_no + 1, &line?)?;
    }
    builder.finish()
}

/// Parse a mapping file held in memory (useful for testing)
pub fn parse_str(content: &str, options: &LoadOptions) -> Result<MappingTable> {
    parse_lines(content.lines(), options)
}

/// Build a table from text lines.
///
/// Line 0 is the header even when it carries the comment prefix. Later
/// comment lines are kept verbatim, blank lines are skipped, and every other
/// line is a data row keyed by its first field.
pub fn parse_lines<I, S>(lines: I, options: &LoadOptions) -> Result<MappingTable>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = TableBuilder::new(options);
    for (line_no, line) in lines.into_iter().enumerate() {
        builder.push_line(line_no + 1, line.as_ref())?;
    }
    builder.finish()
}

struct TableBuilder<'a> {
    options: &'a LoadOptions,
    header_fields: Option<Vec<String>>,
    comments: Vec<String>,
    row_ids: Vec<String>,
    row_index: HashMap<String, usize>,
    rows: Vec<Row>,
}

impl<'a> TableBuilder<'a> {
    fn new(options: &'a LoadOptions) -> Self {
        Self {
            options,
            header_fields: None,
            comments: Vec::new(),
            row_ids: Vec::new(),
            row_index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    fn split(&self, line: &str) -> Vec<String> {
        line.split(self.options.field_delimiter)
            .map(|f| f.trim().to_string())
            .collect()
    }

    fn push_line(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let line = raw.trim_end_matches(['\r', '\n']);

        let Some(expected) = self.header_fields.as_ref().map(Vec::len) else {
            let stripped = if self.options.comment_prefix.is_empty() {
                line
            } else {
                line.trim_start_matches(self.options.comment_prefix.as_str())
            };
            let header = self.split(stripped);
            if header.first().map_or(true, |f| f.is_empty()) {
                return Err(Error::MissingHeader);
            }
            self.header_fields = Some(header);
            return Ok(());
        };

        if line.trim().is_empty() {
            return Ok(());
        }

        if self.options.is_comment(line) {
            self.comments.push(line.to_string());
            return Ok(());
        }

        let fields = self.split(line);
        if fields.len() != expected {
            return Err(Error::RowShape {
                line: line_no,
                expected,
                found: fields.len(),
            });
        }

        let id = fields[0].clone();
        self.row_index.insert(id.clone(), self.rows.len());
        self.row_ids.push(id);
        self.rows.push(fields);
        Ok(())
    }

    fn finish(self) -> Result<MappingTable> {
        let header_fields = self.header_fields.ok_or(Error::EmptyInput)?;
        let column_index = index_columns(&header_fields);

        Ok(MappingTable {
            options: self.options.clone(),
            header_fields,
            column_index,
            row_ids: self.row_ids,
            row_index: self.row_index,
            rows: self.rows,
            comments: self.comments,
        })
    }
}
