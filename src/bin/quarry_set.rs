//! quarry-set: read or write a property at a dotted path in a JSON document
//!
//! Paths may contain `*` wildcard segments; a set whose parent resolves to
//! an array broadcasts across the elements.
//!
//! Usage:
//!   # Read a property
//!   quarry-set --path meta.version data.json
//!
//!   # Write a property and print the mutated document
//!   quarry-set --path meta.version --value 2 data.json
//!
//!   # Broadcast over array elements
//!   quarry-set --path 'sites.station.flagged' --value true data.json

use anyhow::{Context, Result};
use clap::Parser;
use quarry::{get_property, set_property, PathExpr, Problems, Value};
use std::fs::File;
use std::io::{stdin, BufRead, BufReader};

#[derive(Parser, Debug)]
#[command(name = "quarry-set")]
#[command(about = "Read or write a property at a dotted path", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Dotted property path, e.g. `sites.station.id`
    #[arg(long)]
    path: String,

    /// JSON-encoded value to write; the path is read instead when omitted
    #[arg(long)]
    value: Option<String>,

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

    let decoded: serde_json::Value =
        serde_json::from_reader(reader).context("Failed to parse JSON")?;
    let mut root = Value::from_json(decoded);

    let path = PathExpr::parse(&args.path)?;

    let output = match &args.value {
        Some(raw) => {
            // A value that is not valid JSON is taken as a bare string.
            let value = match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(v) => Value::from_json(v),
                Err(_) => Value::String(raw.clone()),
            };
            set_property(&mut root, &path, value)?;
            root.to_json()
        }
        None => {
            let mut problems = Problems::new();
            let found = get_property(&root, &path, &mut problems);
            for problem in problems.reported() {
                eprintln!("warning: {}", problem);
            }
            found.unwrap_or(Value::Null).to_json()
        }
    };

    let rendered = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);

    Ok(())
}
