//! Writing tables back out as delimited text

use crate::error::Result;
use crate::table::MappingTable;
use serde::{Deserialize, Serialize};
use std::io::Write;

fn default_true() -> bool {
    true
}

/// Which parts of a table to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Emit the comment-prefixed header line
    #[serde(default = "default_true")]
    pub write_header: bool,
    /// Emit the preserved comment lines
    #[serde(default = "default_true")]
    pub write_comments: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            write_header: true,
            write_comments: true,
        }
    }
}

impl OutputOptions {
    /// Data rows only, for appending to an already started output
    pub fn data_only() -> Self {
        Self {
            write_header: false,
            write_comments: false,
        }
    }
}

impl MappingTable {
    /// Render the table as lines, each ending with `\n`.
    ///
    /// With `limit_to_rows`, only those rows are written (in table order).
    pub fn delimited_lines(&self, limit_to_rows: Option<&[&str]>, options: &OutputOptions) -> Vec<String> {
        let delimiter = self.options.field_delimiter.to_string();
        let mut lines = Vec::with_capacity(self.rows.len() + self.comments.len() + 1);

        if options.write_header {
            lines.push(format!(
                "{}{}\n",
                self.options.comment_prefix,
                self.header_fields.join(delimiter.as_str())
            ));
        }

        if options.write_comments {
            lines.extend(self.comments.iter().map(|c| format!("{}\n", c)));
        }

        lines.extend(
            self.iter_row_data(limit_to_rows)
                .map(|fields| format!("{}\n", fields.join(delimiter.as_str()))),
        );
        lines
    }

    /// Write the table to `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W, options: &OutputOptions) -> Result<()> {
        for line in self.delimited_lines(None, options) {
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}

/// Write several tables as one file: the header and comments of the first, then every row
pub fn write_tables<'a, W, I>(writer: &mut W, tables: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a MappingTable>,
{
    for (i, table) in tables.into_iter().enumerate() {
        let options = if i == 0 {
            OutputOptions::default()
        } else {
            OutputOptions::data_only()
        };
        table.write_to(writer, &options)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::table::LoadOptions;

    const MAPPING: &str = "#SampleID\tTreatment\tDOB\n\
        #Example mapping file\n\
        #Second comment\n\
        PC.354\tControl\t20061218\n\
        PC.355\tFast\t20060817\n\
        PC.356\tControl\t20060305\n";

    fn table() -> MappingTable {
        parse_str(MAPPING, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_round_trip() {
        assert_eq!(table().delimited_lines(None, &OutputOptions::default()).concat(), MAPPING);
    }

    #[test]
    fn test_round_trip_with_other_delimiter() {
        let text = "#SampleID,Temp\n#note\nS.1,1.0\nS.2,2.0\n";
        let table = parse_str(text, &LoadOptions::new(',', "#")).unwrap();
        let mut out = Vec::new();
        table.write_to(&mut out, &OutputOptions::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), text);
    }

    #[test]
    fn test_limit_to_rows() {
        let lines = table().delimited_lines(Some(&["PC.356"]), &OutputOptions::data_only());
        assert_eq!(lines, vec!["PC.356\tControl\t20060305\n"]);
    }

    #[test]
    fn test_header_only_without_comments() {
        let options = OutputOptions {
            write_header: true,
            write_comments: false,
        };
        let lines = table().delimited_lines(None, &options);
        assert_eq!(lines[0], "#SampleID\tTreatment\tDOB\n");
        assert_eq!(lines[1], "PC.354\tControl\t20061218\n");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_write_tables_concatenates_data() {
        let groups = table().split_by_columns(&["Treatment"]).unwrap();
        let mut out = Vec::new();
        write_tables(&mut out, groups.values()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let reloaded = parse_str(&text, &LoadOptions::default()).unwrap();
        assert_eq!(reloaded.comments().len(), 2);
        assert_eq!(reloaded.row_ids(), &["PC.354", "PC.356", "PC.355"]);
    }
}
