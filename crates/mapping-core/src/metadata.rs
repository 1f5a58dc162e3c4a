//! Joining external metadata tables onto a mapping file

use crate::error::{Error, Result};
use crate::table::{LoadOptions, MappingTable, Row};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Marks a match column built by merging mapping columns, e.g. `Treatment&&DOB`
pub const MERGE_MARKER: &str = "&&";

/// How a metadata join lays out its output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplementOptions {
    /// Columns placed first, in this order, when present
    pub first_columns: Vec<String>,
    /// Columns placed last, in this order, when present
    pub last_columns: Vec<String>,
    /// Value for columns a row has no metadata for
    pub default_value: String,
    /// Joins the parts of a `&&` match column
    pub merged_delimiter: String,
}

impl Default for SupplementOptions {
    fn default() -> Self {
        Self {
            first_columns: ["SampleID", "BarcodeSequence", "LinkerPrimerSequence"]
                .map(String::from)
                .to_vec(),
            last_columns: vec!["Description".to_string()],
            default_value: "Unknown".to_string(),
            merged_delimiter: "_".to_string(),
        }
    }
}

/// Parse a metadata table file.
///
/// See [`parse_metadata_reader`].
pub fn parse_metadata_file<P: AsRef<Path>>(path: P, delimiter: char) -> Result<MappingTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_metadata_reader(file, delimiter)
}

/// Parse a metadata table exported from a spreadsheet.
///
/// Unlike mapping files, fields may be double-quoted. The first record is the
/// header (a leading `#` is dropped) and every later record is data.
pub fn parse_metadata_reader<R: Read>(reader: R, delimiter: char) -> Result<MappingTable> {
    let options = LoadOptions::new(delimiter, "#");
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(options.delimiter_byte()?)
        .from_reader(reader);

    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<Row> = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();

        let Some(expected) = header.as_ref().map(Vec::len) else {
            let mut fields = fields;
            if let Some(first) = fields.first_mut() {
                *first = first.trim_start_matches('#').trim().to_string();
            }
            if fields.first().map_or(true, |f| f.is_empty()) {
                return Err(Error::MissingHeader);
            }
            header = Some(fields);
            continue;
        };

        if fields.len() != expected {
            return Err(Error::RowShape {
                line: record.position().map_or(0, |p| p.line() as usize),
                expected,
                found: fields.len(),
            });
        }
        rows.push(fields);
    }

    let header = header.ok_or(Error::EmptyInput)?;
    Ok(MappingTable::from_parts(options, header, Vec::new(), rows))
}

/// Order `fields` with `first` at the front and `last` at the back.
///
/// Duplicates are dropped and the remaining fields keep their order. Names in
/// `first` or `last` that are not in `fields` are ignored.
pub fn order_columns<S: AsRef<str>>(fields: &[String], first: &[S], last: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let unique: Vec<&String> = fields.iter().filter(|f| seen.insert(f.as_str())).collect();

    let first: Vec<&str> = first
        .iter()
        .map(|f| f.as_ref())
        .filter(|f| seen.contains(f))
        .collect();
    let last: Vec<&str> = last
        .iter()
        .map(|f| f.as_ref())
        .filter(|f| seen.contains(f) && !first.contains(f))
        .collect();

    let middle = unique
        .into_iter()
        .map(String::as_str)
        .filter(|f| !first.contains(f) && !last.contains(f));

    first
        .iter()
        .copied()
        .chain(middle)
        .chain(last.iter().copied())
        .map(str::to_string)
        .collect()
}

impl MappingTable {
    /// Join `metadata` onto this table by `match_column`.
    ///
    /// Each row gains the metadata columns of the metadata row with the same
    /// match value. Values already in the mapping row win. Rows without a
    /// match get `default_value`. A match column written `A&&B` is first added
    /// as a merged column of `A` and `B`.
    pub fn supplement(
        &self,
        metadata: &MappingTable,
        match_column: &str,
        options: &SupplementOptions,
    ) -> Result<MappingTable> {
        let mut base = Cow::Borrowed(self);
        let match_column = if match_column.contains(MERGE_MARKER) {
            let parts: Vec<&str> = match_column.split(MERGE_MARKER).collect();
            let merged = parts.join(options.merged_delimiter.as_str());
            if !base.has_column(&merged) {
                base.to_mut()
                    .add_merged_column(&parts, &options.merged_delimiter)?;
                log::debug!("added merged column '{}'", merged);
            }
            merged
        } else {
            match_column.to_string()
        };

        let match_idx = base.column_index(&match_column)?;
        let key_idx = metadata.column_index(&match_column)?;

        // last metadata row wins on duplicate keys
        let by_key: HashMap<&str, &Row> = metadata
            .rows
            .iter()
            .map(|row| (row[key_idx].as_str(), row))
            .collect();

        let combined: Vec<String> = base
            .header_fields
            .iter()
            .chain(
                metadata
                    .header_fields
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != key_idx)
                    .map(|(_, name)| name),
            )
            .cloned()
            .collect();
        let header = order_columns(&combined, &options.first_columns, &options.last_columns);

        let mut matched = 0usize;
        let mut rows: Vec<Row> = Vec::with_capacity(base.rows.len());
        for row in &base.rows {
            let extra = by_key.get(row[match_idx].as_str()).copied();
            if extra.is_some() {
                matched += 1;
            }
            let fields = header
                .iter()
                .map(|name| {
                    if let Some(&i) = base.column_index.get(name) {
                        return row[i].clone();
                    }
                    extra
                        .zip(metadata.column_index.get(name))
                        .map(|(meta_row, &i)| meta_row[i].clone())
                        .unwrap_or_else(|| options.default_value.clone())
                })
                .collect();
            rows.push(fields);
        }

        if matched < base.rows.len() {
            log::warn!(
                "{} of {} rows have no metadata for '{}'",
                base.rows.len() - matched,
                base.rows.len(),
                match_column
            );
        }

        Ok(MappingTable::from_parts(
            base.options.clone(),
            header,
            base.comments.clone(),
            rows,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    const MAPPING: &str = "#SampleID\tBarcodeSequence\tTreatment\tDOB\tDescription\n\
        #Example mapping file for a study of mouse cardiac physiology\n\
        PC.354\tAGCACGAGCCTA\tControl\t20061218\tControl_mouse__I.D._354\n\
        PC.355\tAACTCGTCGATG\tFast\t20060817\tFast_mouse__I.D._355\n\
        PC.356\tACAGACCACTCA\tOther\t20060305\tOther_mouse__I.D._356\n";

    const DIETS: &str = "#Treatment\tDiet\tDose\n\
        Control\tChow\t0\n\
        Fast\tNone\t5\n";

    fn load(text: &str) -> MappingTable {
        parse_str(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_supplement_adds_metadata_columns() {
        let result = load(MAPPING)
            .supplement(&load(DIETS), "Treatment", &SupplementOptions::default())
            .unwrap();

        assert_eq!(
            result.header_fields(),
            &["SampleID", "BarcodeSequence", "Treatment", "DOB", "Diet", "Dose", "Description"]
        );
        assert_eq!(result.cell("PC.354", "Diet").unwrap(), Some("Chow"));
        assert_eq!(result.cell("PC.355", "Dose").unwrap(), Some("5"));
        assert_eq!(result.cell("PC.356", "Diet").unwrap(), Some("Unknown"));
        assert_eq!(result.cell("PC.356", "Description").unwrap(), Some("Other_mouse__I.D._356"));
        assert_eq!(result.comments(), load(MAPPING).comments());
    }

    #[test]
    fn test_mapping_values_win_over_metadata() {
        let metadata = load("#Treatment\tDescription\tDiet\nControl\toverwritten\tChow\n");
        let result = load(MAPPING)
            .supplement(&metadata, "Treatment", &SupplementOptions::default())
            .unwrap();

        assert_eq!(result.column_count(), 6);
        assert_eq!(
            result.cell("PC.354", "Description").unwrap(),
            Some("Control_mouse__I.D._354")
        );
        assert_eq!(result.cell("PC.354", "Diet").unwrap(), Some("Chow"));
    }

    #[test]
    fn test_supplement_on_merged_match_column() {
        let metadata = load("#Treatment_DOB\tWeight\nControl_20061218\t20.1\n");
        let options = SupplementOptions {
            default_value: "NA".to_string(),
            ..SupplementOptions::default()
        };
        let source = load(MAPPING);
        let result = source.supplement(&metadata, "Treatment&&DOB", &options).unwrap();

        assert_eq!(result.cell("PC.354", "Treatment_DOB").unwrap(), Some("Control_20061218"));
        assert_eq!(result.cell("PC.354", "Weight").unwrap(), Some("20.1"));
        assert_eq!(result.cell("PC.355", "Weight").unwrap(), Some("NA"));
        assert!(!source.has_column("Treatment_DOB"));
    }

    #[test]
    fn test_supplement_unknown_match_column() {
        let err = load(MAPPING)
            .supplement(&load(DIETS), "Diet", &SupplementOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { ref name, .. } if name == "Diet"));
    }

    #[test]
    fn test_order_columns() {
        let fields: Vec<String> = ["Treatment", "Description", "SampleID", "Dose", "Treatment"]
            .map(String::from)
            .to_vec();
        let ordered = order_columns(&fields, &["SampleID", "BarcodeSequence"], &["Description"]);
        assert_eq!(ordered, vec!["SampleID", "Treatment", "Dose", "Description"]);
    }

    #[test]
    fn test_parse_metadata_reader_handles_quotes() {
        let text = "#Treatment,Note\nControl,\"chow, standard\"\nFast, none \n";
        let table = parse_metadata_reader(text.as_bytes(), ',').unwrap();

        assert_eq!(table.header_fields(), &["Treatment", "Note"]);
        assert_eq!(table.cell("Control", "Note").unwrap(), Some("chow, standard"));
        assert_eq!(table.cell("Fast", "Note").unwrap(), Some("none"));
    }

    #[test]
    fn test_parse_metadata_reader_errors() {
        assert!(matches!(
            parse_metadata_reader("Treatment,Note\nControl\n".as_bytes(), ','),
            Err(Error::RowShape { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            parse_metadata_reader("".as_bytes(), ','),
            Err(Error::EmptyInput)
        ));
        assert!(matches!(
            parse_metadata_reader("a,b\n".as_bytes(), '§'),
            Err(Error::InvalidDelimiter('§'))
        ));
    }
}
