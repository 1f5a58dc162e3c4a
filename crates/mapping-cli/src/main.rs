//! Mapping file CLI
//!
//! Command-line drivers over sample mapping files.

use clap::{Args, Parser, Subcommand};
use mapping_core::convert::{to_float, yyyymmdd_to_days};
use mapping_core::{
    parse_file, parse_metadata_file, Event, InterpolationJob, LoadOptions, MappingTable,
    OutputOptions, PhaseSuffixes, Side, SupplementOptions,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mapping-cli")]
#[command(about = "Query, split and interpolate sample mapping files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// How to read the input mapping file
#[derive(Args)]
struct LoadArgs {
    /// Field delimiter ("tab" or a single character)
    #[arg(long, default_value = "tab", value_parser = parse_delimiter)]
    delimiter: char,

    /// Prefix marking the header and comment lines
    #[arg(long, default_value = "#")]
    comment_prefix: String,
}

impl LoadArgs {
    fn options(&self) -> LoadOptions {
        LoadOptions::new(self.delimiter, self.comment_prefix.clone())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and display a single mapping file
    Parse {
        /// Path to the mapping file
        #[arg(short = 'm', long)]
        mapping: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Write one mapping file per distinct value of the split columns
    Split {
        /// Path to the mapping file
        #[arg(short = 'm', long)]
        mapping: PathBuf,

        /// Columns to split on (comma-separated)
        #[arg(short, long)]
        columns: String,

        /// Output directory for the group files
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Interpolate missing values of columns over a reference column
    Interpolate {
        /// Path to the mapping file
        #[arg(short = 'm', long)]
        mapping: PathBuf,

        /// Columns to interpolate (comma-separated, the y axis)
        #[arg(short = 'y', long)]
        columns: String,

        /// Reference column to interpolate over (the x axis)
        #[arg(short = 'x', long)]
        reference: String,

        /// Interpolate only within rows sharing these columns (comma-separated)
        #[arg(short, long)]
        split: Option<String>,

        /// Groups with fewer rows are written unchanged
        #[arg(long, default_value_t = 5)]
        min_rows: usize,

        /// Output file path
        #[arg(short, long, default_value = "interpolated_vals.txt")]
        output: PathBuf,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Print the row ids whose reference value is closest to a target
    Select {
        /// Path to the mapping file
        #[arg(short = 'm', long)]
        mapping: PathBuf,

        /// Reference column to compare
        #[arg(short = 'x', long)]
        reference: String,

        /// Target value (a yyyymmdd date with --date)
        #[arg(short, long)]
        target: String,

        /// Restrict candidates to one side of the target
        #[arg(long, default_value = "both", value_parser = parse_side)]
        sides: Side,

        /// Compare the reference column as yyyymmdd dates
        #[arg(long)]
        date: bool,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Merge columns into one text key
    MergeColumns {
        /// Path to the mapping file
        #[arg(short = 'm', long)]
        mapping: PathBuf,

        /// Columns to merge (comma-separated)
        #[arg(short, long)]
        columns: String,

        /// Delimiter placed between merged values
        #[arg(long, default_value = "_")]
        merged_delimiter: String,

        /// Append the merged column and write the whole mapping file
        #[arg(long)]
        append: bool,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Join metadata tables onto a mapping file by a match column
    MergeMetadata {
        /// Path to the mapping file
        #[arg(short = 'm', long)]
        mapping: PathBuf,

        /// Metadata files to join, in order (comma-separated)
        #[arg(short = 'd', long)]
        metadata: String,

        /// Column to match on, one for all files or one per file (comma-separated).
        /// Write A&&B to match on columns A and B merged.
        #[arg(short = 'c', long)]
        match_columns: String,

        /// Field delimiter of the metadata files ("tab" or a single character)
        #[arg(long, default_value = "tab", value_parser = parse_delimiter)]
        metadata_delimiter: char,

        /// Columns to place first in the output (comma-separated)
        #[arg(long, default_value = "SampleID,BarcodeSequence,LinkerPrimerSequence")]
        first_cols: String,

        /// Columns to place last in the output (comma-separated)
        #[arg(long, default_value = "Description,DESCRIPTION")]
        last_cols: String,

        /// Value for rows without matching metadata
        #[arg(long, default_value = "Unknown")]
        default_value: String,

        /// Delimiter joining the parts of an A&&B match column
        #[arg(long, default_value = "_")]
        merged_delimiter: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Write days and weeks from each sample to the first event of its individual
    TimeToEvent {
        /// Path to the mapping file
        #[arg(short = 'm', long)]
        mapping: PathBuf,

        /// Column holding each sample's yyyymmdd date
        #[arg(long)]
        time_column: String,

        /// Event of interest as column:state, e.g. HealthState:Diseased
        #[arg(long, value_parser = parse_event)]
        event: Event,

        /// Column identifying the individual each sample came from
        #[arg(long, default_value = "Individual")]
        individual_column: String,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Label samples as before, during or after treatment by date
    TreatmentPhase {
        /// Path to the mapping file
        #[arg(short = 'm', long)]
        mapping: PathBuf,

        /// Treatment column whose values are labelled
        #[arg(long, default_value = "Treatment")]
        treatment_column: String,

        /// Column holding each sample's yyyymmdd date
        #[arg(long)]
        sample_time_column: String,

        /// Column holding the treatment start date
        #[arg(long)]
        start_time_column: String,

        /// Column holding the treatment end date
        #[arg(long)]
        end_time_column: String,

        /// Name of the labelled output column
        #[arg(long, default_value = "TreatmentPhase")]
        new_column: String,

        /// Suffix for samples before treatment
        #[arg(long, default_value = "_pretreatment")]
        pre_suffix: String,

        /// Suffix for samples after treatment
        #[arg(long, default_value = "_posttreatment")]
        post_suffix: String,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Run an interpolation job file
    Job {
        /// Path to the job file (JSON)
        #[arg(short, long)]
        job: PathBuf,
    },

    /// Create an interpolation job template
    CreateJob {
        /// Output path for the job file
        #[arg(short, long)]
        output: PathBuf,

        /// Mapping file the job reads
        #[arg(short = 'm', long, default_value = "mapping.txt")]
        mapping: PathBuf,

        /// Columns to interpolate (comma-separated)
        #[arg(short = 'y', long, default_value = "ColumnToFill")]
        columns: String,

        /// Reference column
        #[arg(short = 'x', long, default_value = "ReferenceColumn")]
        reference: String,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> mapping_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            mapping,
            limit,
            load,
        } => cmd_parse(&mapping, limit, &load.options()),
        Commands::Split {
            mapping,
            columns,
            output,
            load,
        } => cmd_split(&mapping, &columns, &output, &load.options()),
        Commands::Interpolate {
            mapping,
            columns,
            reference,
            split,
            min_rows,
            output,
            load,
        } => {
            let mut job = InterpolationJob::new(mapping, output, split_list(&columns), reference);
            job.split_columns = split.as_deref().map(split_list).unwrap_or_default();
            job.min_rows = min_rows;
            job.load = load.options();
            cmd_job(&job)
        }
        Commands::Select {
            mapping,
            reference,
            target,
            sides,
            date,
            load,
        } => cmd_select(&mapping, &reference, &target, sides, date, &load.options()),
        Commands::MergeColumns {
            mapping,
            columns,
            merged_delimiter,
            append,
            output,
            load,
        } => cmd_merge_columns(
            &mapping,
            &columns,
            &merged_delimiter,
            append,
            output.as_deref(),
            &load.options(),
        ),
        Commands::MergeMetadata {
            mapping,
            metadata,
            match_columns,
            metadata_delimiter,
            first_cols,
            last_cols,
            default_value,
            merged_delimiter,
            output,
            load,
        } => {
            let options = SupplementOptions {
                first_columns: split_list(&first_cols),
                last_columns: split_list(&last_cols),
                default_value,
                merged_delimiter,
            };
            cmd_merge_metadata(
                &mapping,
                &metadata,
                &match_columns,
                metadata_delimiter,
                &options,
                &output,
                &load.options(),
            )
        }
        Commands::TimeToEvent {
            mapping,
            time_column,
            event,
            individual_column,
            output,
            load,
        } => {
            let table = parse_file(&mapping, &load.options())?;
            let offsets = table.time_to_event(&time_column, &event, &individual_column)?;
            write_output(output.as_deref(), &offsets)
        }
        Commands::TreatmentPhase {
            mapping,
            treatment_column,
            sample_time_column,
            start_time_column,
            end_time_column,
            new_column,
            pre_suffix,
            post_suffix,
            output,
            load,
        } => {
            let table = parse_file(&mapping, &load.options())?;
            let suffixes = PhaseSuffixes {
                pre: pre_suffix,
                post: post_suffix,
                ..PhaseSuffixes::default()
            };
            let phases = table.treatment_phases(
                &treatment_column,
                &sample_time_column,
                &start_time_column,
                &end_time_column,
                &new_column,
                &suffixes,
            )?;
            write_output(output.as_deref(), &phases)
        }
        Commands::Job { job } => cmd_job(&InterpolationJob::load(job)?),
        Commands::CreateJob {
            output,
            mapping,
            columns,
            reference,
        } => cmd_create_job(&output, mapping, &columns, reference),
    }
}

fn cmd_parse(path: &Path, limit: usize, options: &LoadOptions) -> mapping_core::Result<()> {
    let table = parse_file(path, options)?;

    println!("File: {}", path.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!("Comment lines: {}", table.comments().len());
    println!();

    // Print header
    println!("{}", table.header_fields().join("\t"));
    println!("{}", "-".repeat(table.column_count() * 12));

    for row in table.iter_row_data(None).take(limit) {
        println!("{}", row.join("\t"));
    }

    if table.row_count() > limit {
        println!("... ({} more rows)", table.row_count() - limit);
    }

    Ok(())
}

fn cmd_split(
    path: &Path,
    columns: &str,
    output_dir: &Path,
    options: &LoadOptions,
) -> mapping_core::Result<()> {
    let table = parse_file(path, options)?;
    let columns = split_list(columns);
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    let groups = table.split_by_columns(&columns)?;

    fs::create_dir_all(output_dir)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mapping");

    for (key, group) in &groups {
        let file_name = format!("{}_{}.txt", stem, sanitize_file_part(&key.join("_")));
        let output_path = output_dir.join(file_name);
        write_table(&output_path, group)?;
        println!("  {} ({} rows)", output_path.display(), group.row_count());
    }

    println!("Wrote {} groups to {}", groups.len(), output_dir.display());
    Ok(())
}

fn cmd_select(
    path: &Path,
    reference: &str,
    target: &str,
    sides: Side,
    date: bool,
    options: &LoadOptions,
) -> mapping_core::Result<()> {
    let table = parse_file(path, options)?;

    let convert = |field: &str| -> Option<f64> {
        if date {
            yyyymmdd_to_days(field).map(|days| days as f64)
        } else {
            to_float(field)
        }
    };
    let target_value = convert(target).ok_or_else(|| {
        mapping_core::Error::InvalidArgument(format!("target '{}' is not a valid value", target))
    })?;

    let ids = table.select_rows_by_value(target_value, reference, convert, sides)?;
    if ids.is_empty() {
        println!("No rows with a usable '{}' value", reference);
    }
    for id in ids {
        println!("{}", id);
    }

    Ok(())
}

fn cmd_merge_columns(
    path: &Path,
    columns: &str,
    merged_delimiter: &str,
    append: bool,
    output: Option<&Path>,
    options: &LoadOptions,
) -> mapping_core::Result<()> {
    let mut table = parse_file(path, options)?;
    let columns = split_list(columns);
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if append {
        table
            .add_merged_column(&columns, merged_delimiter)?
            .write_to(&mut writer, &OutputOptions::default())?;
    } else {
        for line in table.merged_columns_as_text(&columns, merged_delimiter)? {
            writer.write_all(line.as_bytes())?;
        }
    }
    writer.flush()?;

    Ok(())
}

fn cmd_merge_metadata(
    path: &Path,
    metadata: &str,
    match_columns: &str,
    metadata_delimiter: char,
    options: &SupplementOptions,
    output: &Path,
    load: &LoadOptions,
) -> mapping_core::Result<()> {
    if path == output {
        return Err(mapping_core::Error::InvalidArgument(
            "input and output mapping files must differ".to_string(),
        ));
    }

    let files = split_list(metadata);
    let match_columns = pair_match_columns(&files, &split_list(match_columns))?;

    let mut table = parse_file(path, load)?;
    for (file, match_column) in files.iter().zip(&match_columns) {
        log::info!("joining {} on column '{}'", file, match_column);
        let metadata = parse_metadata_file(file, metadata_delimiter)?;
        table = table.supplement(&metadata, match_column, options)?;
    }

    write_table(output, &table)?;
    println!(
        "Wrote {} rows x {} columns to {}",
        table.row_count(),
        table.column_count(),
        output.display()
    );
    Ok(())
}

/// One match column per metadata file; a single column applies to every file
fn pair_match_columns(files: &[String], columns: &[String]) -> mapping_core::Result<Vec<String>> {
    match columns {
        [] => Err(mapping_core::Error::InvalidArgument(
            "at least one match column is required".to_string(),
        )),
        [single] => Ok(vec![single.clone(); files.len()]),
        many if many.len() == files.len() => Ok(many.to_vec()),
        many => Err(mapping_core::Error::InvalidArgument(format!(
            "got {} match columns for {} metadata files; pass one, or one per file",
            many.len(),
            files.len()
        ))),
    }
}

fn cmd_job(job: &InterpolationJob) -> mapping_core::Result<()> {
    println!(
        "Interpolating {} over '{}' in {}",
        job.value_columns.join(", "),
        job.reference_column,
        job.input.display()
    );
    if !job.split_columns.is_empty() {
        println!("Split by: {}", job.split_columns.join(", "));
    }

    let result = job.run()?;

    println!();
    println!("Job complete:");
    println!("  {} groups interpolated", result.interpolated_groups);
    println!("  {} rows written to {}", result.row_count(), job.output.display());

    if !result.skipped_groups.is_empty() {
        println!(
            "\nSkipped {} groups with fewer than {} rows:",
            result.skipped_groups.len(),
            job.min_rows
        );
        for key in &result.skipped_groups {
            println!("  [{}]", key.join(", "));
        }
    }

    Ok(())
}

fn cmd_create_job(
    output: &Path,
    mapping: PathBuf,
    columns: &str,
    reference: String,
) -> mapping_core::Result<()> {
    let job = InterpolationJob::new(
        mapping,
        PathBuf::from("interpolated_vals.txt"),
        split_list(columns),
        reference,
    );

    job.save(output)?;
    println!("Created job file: {}", output.display());
    println!();
    println!("Edit the file to configure your job, then run:");
    println!("  mapping-cli job --job {}", output.display());

    Ok(())
}

fn write_table(path: &Path, table: &MappingTable) -> mapping_core::Result<()> {
    log::debug!("writing {} rows to {}", table.row_count(), path.display());
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    table.write_to(&mut writer, &OutputOptions::default())?;
    writer.flush()?;
    Ok(())
}

fn write_output(path: Option<&Path>, table: &MappingTable) -> mapping_core::Result<()> {
    match path {
        Some(path) => write_table(path, table),
        None => {
            let mut writer = BufWriter::new(io::stdout().lock());
            table.write_to(&mut writer, &OutputOptions::default())?;
            writer.flush()?;
            Ok(())
        }
    }
}

/// Split a comma-separated argument into trimmed, non-empty names
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_delimiter(value: &str) -> Result<char, String> {
    match value {
        "tab" | "\\t" => Ok('\t'),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("expected 'tab' or a single character, got '{}'", other)),
            }
        }
    }
}

fn parse_side(value: &str) -> Result<Side, String> {
    value.parse().map_err(|e: mapping_core::Error| e.to_string())
}

fn parse_event(value: &str) -> Result<Event, String> {
    value.parse().map_err(|e: mapping_core::Error| e.to_string())
}

/// Replace characters that are unsafe in file names
fn sanitize_file_part(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
