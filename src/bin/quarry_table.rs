//! quarry-table: derive a table from nested JSON
//!
//! Locates row-candidate arrays by name, infers a column schema over them,
//! and materializes typed rows.
//!
//! Usage:
//!   # First array found, rows to stdout
//!   quarry-table data.json
//!
//!   # A named array, every occurrence in the tree, capped at 100 rows
//!   quarry-table --array station --all --top 100 data.json
//!
//!   # Force column types and print the schema instead of rows
//!   quarry-table --array station --integer-columns id,count --schema data.json

use anyhow::Result;
use clap::Parser;
use quarry::{read_table_from_reader, TableOptions};
use std::fs::File;
use std::io::{stdin, BufRead, BufReader};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "quarry-table")]
#[command(about = "Derive a table from nested JSON", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Name of the array holding row objects (first array found if omitted)
    #[arg(long, default_value = "")]
    array: String,

    /// Collect rows from every matching array instead of the first
    #[arg(long)]
    all: bool,

    /// Cap on total materialized rows
    #[arg(long)]
    top: Option<usize>,

    /// Comma-separated keys to leave out of the table
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Keys whose array values become array-typed columns
    #[arg(long, value_delimiter = ',')]
    array_columns: Vec<String>,

    /// Columns forced to boolean
    #[arg(long, value_delimiter = ',')]
    boolean_columns: Vec<String>,

    /// Columns forced to datetime
    #[arg(long, value_delimiter = ',')]
    datetime_columns: Vec<String>,

    /// Columns forced to double
    #[arg(long, value_delimiter = ',')]
    double_columns: Vec<String>,

    /// Columns forced to integer
    #[arg(long, value_delimiter = ',')]
    integer_columns: Vec<String>,

    /// Columns forced to text
    #[arg(long, value_delimiter = ',')]
    text_columns: Vec<String>,

    /// Print the inferred schema instead of the rows
    #[arg(long)]
    schema: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let reader: Box<dyn BufRead> = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(File::open(file_path)?))
    } else {
        Box::new(BufReader::new(stdin()))
    };

    let options = TableOptions {
        exclude_names: args.exclude,
        array_columns: args.array_columns,
        boolean_columns: args.boolean_columns,
        datetime_columns: args.datetime_columns,
        double_columns: args.double_columns,
        integer_columns: args.integer_columns,
        text_columns: args.text_columns,
    };

    let (table, problems) =
        read_table_from_reader(reader, &args.array, args.all, &options, args.top)?;

    for problem in problems.reported() {
        eprintln!("warning: {}", problem);
    }

    let output = if args.schema {
        if args.compact {
            serde_json::to_string(&table.columns)?
        } else {
            serde_json::to_string_pretty(&table.columns)?
        }
    } else {
        let rows = table.to_json_rows();
        if args.compact {
            serde_json::to_string(&rows)?
        } else {
            serde_json::to_string_pretty(&rows)?
        }
    };

    println!("{}", output);

    Ok(())
}
