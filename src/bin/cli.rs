//! GeoMap CLI
//!
//! Build, query, inspect and benchmark index files from the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use clap::{Parser, Subcommand};
use geomap::{CellId, GeoMapError, GeoMapReader, GeoMapWriter, IndexConfig, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// GeoMap CLI
#[derive(Parser, Debug)]
#[command(name = "geomap-cli")]
#[command(about = "Build and query on-disk spatial inverted indexes")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build an index from a `key<TAB>cell,cell,...` file
    Build {
        /// Input file, one key per line
        #[arg(short, long)]
        input: PathBuf,

        /// Output index file
        #[arg(short, long)]
        output: PathBuf,

        /// Distance between indexed cell levels
        #[arg(long, default_value = "3")]
        level_stride: u8,

        /// Coarsest indexed cell level
        #[arg(long, default_value = "3")]
        min_level: u8,

        /// Rows per column block
        #[arg(long, default_value = "1024")]
        block_size: u16,
    },

    /// Print the keys whose regions contain or fall inside the given cells
    Query {
        /// Index file
        #[arg(short, long)]
        index: PathBuf,

        /// Cell ids, decimal or 0x hex
        #[arg(required = true)]
        cells: Vec<String>,
    },

    /// Print header fields of an index file
    Inspect {
        /// Index file
        #[arg(short, long)]
        index: PathBuf,
    },

    /// Run a query file concurrently and report throughput
    Bench {
        /// Index file
        #[arg(short, long)]
        index: PathBuf,

        /// Query file, one comma-separated cell list per line
        #[arg(short, long)]
        queries: PathBuf,

        /// Worker threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Passes over the query file per thread
        #[arg(long, default_value = "1")]
        iterations: usize,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,geomap=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Build {
            input,
            output,
            level_stride,
            min_level,
            block_size,
        } => {
            let config = IndexConfig::builder()
                .level_stride(level_stride)
                .min_level(min_level)
                .block_size(block_size)
                .build();
            build(&input, &output, config)
        }
        Commands::Query { index, cells } => query(&index, &cells),
        Commands::Inspect { index } => inspect(&index),
        Commands::Bench {
            index,
            queries,
            threads,
            iterations,
        } => bench(&index, &queries, threads, iterations),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn parse_cells<'a, I>(items: I) -> Result<Vec<CellId>>
where
    I: IntoIterator<Item = &'a str>,
{
    items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            CellId::parse(s).ok_or_else(|| GeoMapError::InvalidInput(format!("bad cell id '{}'", s)))
        })
        .collect()
}

/// Non-empty, non-comment lines of a text file
fn read_lines(path: &Path) -> Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

fn build(input: &Path, output: &Path, config: IndexConfig) -> Result<()> {
    let mut writer = GeoMapWriter::new(config)?;

    for (number, line) in read_lines(input)?.iter().enumerate() {
        let (key, cells) = line.split_once('\t').ok_or_else(|| {
            GeoMapError::InvalidInput(format!("line {}: expected key<TAB>cells", number + 1))
        })?;
        let cells = parse_cells(cells.split(','))?;
        writer.write(&cells, key.as_bytes())?;
    }

    let stats = writer.build(output)?;
    println!("keys:        {}", stats.key_count);
    println!("cells:       {}", stats.cell_count);
    println!("key blocks:  {}", stats.key_blocks);
    println!("cell blocks: {}", stats.cell_blocks);
    println!("file size:   {} bytes", stats.file_size);
    Ok(())
}

fn query(index: &Path, cells: &[String]) -> Result<()> {
    let reader = GeoMapReader::open(index)?;
    let cells = parse_cells(cells.iter().map(String::as_str))?;
    for key in reader.contains(&cells)? {
        println!("{}", String::from_utf8_lossy(&key));
    }
    Ok(())
}

fn inspect(index: &Path) -> Result<()> {
    let reader = GeoMapReader::open(index)?;
    let header = reader.header();
    println!("file:          {}", reader.path().display());
    println!("keys:          {}", header.key_entries);
    println!("cells:         {}", header.cell_entries);
    println!("level stride:  {}", header.level_stride);
    println!("min level:     {}", header.min_level);
    println!("block size:    {}", header.block_size);
    println!("filter ids:    {}", reader.filter().len());
    for (name, section) in [
        ("filter", header.filter),
        ("keys", header.keys),
        ("cells", header.cells),
        ("bitmaps", header.bitmaps),
    ] {
        println!("{:<8} offset {:>10}  size {:>10}", name, section.offset, section.size);
    }
    Ok(())
}

fn bench(index: &Path, queries: &Path, threads: usize, iterations: usize) -> Result<()> {
    let reader = GeoMapReader::open(index)?;
    let queries: Vec<Vec<CellId>> = read_lines(queries)?
        .iter()
        .map(|line| parse_cells(line.split(',')))
        .collect::<Result<_>>()?;

    let threads = threads.max(1);
    let executed = AtomicU64::new(0);
    let matched = AtomicU64::new(0);
    let failed = AtomicU64::new(0);
    let start = Instant::now();

    crossbeam::scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|_| {
                for _ in 0..iterations {
                    for cells in &queries {
                        match reader.contains(cells) {
                            Ok(keys) => {
                                matched.fetch_add(keys.len() as u64, Ordering::Relaxed);
                            }
                            Err(e) => {
                                tracing::warn!("query failed: {}", e);
                                failed.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                        executed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    })
    .map_err(|_| GeoMapError::InvalidInput("benchmark worker panicked".to_string()))?;

    let elapsed = start.elapsed();
    let executed = executed.load(Ordering::Relaxed);
    println!("threads:     {}", threads);
    println!("queries:     {}", executed);
    println!("failed:      {}", failed.load(Ordering::Relaxed));
    println!("keys found:  {}", matched.load(Ordering::Relaxed));
    println!("elapsed:     {:.3}s", elapsed.as_secs_f64());
    println!(
        "throughput:  {:.0} queries/s",
        executed as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    Ok(())
}
