//! CLI for generating test fixtures.
//!
//! Usage:
//!   gen-fixtures --scale medium --seed 42 > fixtures/medium.sql
//!   gen-fixtures --scale large --dangling -o large.sql

use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use test_data_gen::{Generator, Scale};

#[derive(Parser, Debug)]
#[command(name = "gen-fixtures")]
#[command(about = "Generate marketplace SQL dumps for dump-migrate", long_about = None)]
struct Args {
    /// Scale preset: small, medium, large
    #[arg(short, long, default_value = "small")]
    scale: String,

    /// Random seed for reproducibility
    #[arg(long, default_value = "12345")]
    seed: u64,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Rows per INSERT statement
    #[arg(long, default_value = "100")]
    batch_size: usize,

    /// Point a few references at rows that do not exist
    #[arg(long)]
    dangling: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let scale: Scale = args.scale.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let data = Generator::new(args.seed, scale)
        .with_dangling_references(args.dangling)
        .generate();

    match &args.output {
        Some(path) => {
            let mut w = BufWriter::new(File::create(path)?);
            data.write_mysql(&mut w, args.batch_size)?;
            w.flush()?;
            eprintln!(
                "Generated {} rows across {} tables to {}",
                data.total_rows(),
                data.tables.len(),
                path
            );
        }
        None => {
            let stdout = io::stdout();
            let mut w = BufWriter::new(stdout.lock());
            data.write_mysql(&mut w, args.batch_size)?;
            w.flush()?;
        }
    }
    Ok(())
}
