//! mapping-core: Core library for sample mapping files
//!
//! This library provides functionality to:
//! - Load delimited, commented mapping files into tables indexed by row id and column name
//! - Iterate and filter rows and columns, and match rows on exact criteria
//! - Split a table into independent sub-tables by column values
//! - Partition rows into numeric and non-numeric subsets
//! - Interpolate missing values over a reference column and select nearest rows
//! - Rewrite and merge columns, and write tables back out
//! - Join external metadata tables and derive date-based metadata

pub mod access;
pub mod convert;
pub mod error;
pub mod grouping;
pub mod interpolate;
pub mod job;
pub mod metadata;
pub mod numeric;
pub mod output;
pub mod parser;
pub mod table;
pub mod timeline;
pub mod update;

pub use access::Criteria;
pub use error::{Error, Result};
pub use grouping::GroupKey;
pub use interpolate::{average_points_by_x, interp, Interpolation, Side};
pub use job::{InterpolationJob, JobResult};
pub use metadata::{order_columns, parse_metadata_file, parse_metadata_reader, SupplementOptions};
pub use numeric::{MaybeNumeric, NumericPartition};
pub use output::{write_tables, OutputOptions};
pub use parser::{parse_file, parse_lines, parse_reader, parse_str};
pub use table::{LoadOptions, MappingTable, Row};
pub use timeline::{Event, PhaseSuffixes};
pub use update::{RawKey, DEFAULT_IGNORE_VALUES};
