//! Cell-index neighbor search driver.
//!
//! Usage:
//!   cim --static static.txt --dynamic dynamic.txt [--frame K | --time T]
//!
//! Reads the static configuration and the timestep file, runs the search on
//! one timestep and prints every particle's neighbor list.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use cellindex::core::{
    brute_force_neighbors, validate_snapshot, CellIndex, NeighborMap, SearchConfig,
};
use cellindex::io::{frame_at, read_dynamic, read_static};

#[derive(Parser, Debug)]
#[command(name = "cim")]
#[command(about = "Find neighboring particles in one timestep with the cell-index method")]
#[command(version)]
struct Args {
    /// Static file: N, L, rc, then N radii
    #[arg(long = "static", value_name = "FILE", default_value = "static.txt")]
    static_file: PathBuf,

    /// Dynamic file: per timestep a time line and N "x y" lines
    #[arg(long = "dynamic", value_name = "FILE", default_value = "dynamic.txt")]
    dynamic_file: PathBuf,

    /// Timestep index to analyze
    #[arg(short, long, default_value = "0", conflicts_with = "time")]
    frame: usize,

    /// Analyze the latest timestep at or before this time
    #[arg(short, long)]
    time: Option<f64>,

    /// Override the cutoff from the static file
    #[arg(long)]
    cutoff: Option<f64>,

    /// Treat the domain boundary as a wall instead of wrapping
    #[arg(long)]
    no_periodic: bool,

    /// Distance-test particles sharing a cell instead of always pairing them
    #[arg(long)]
    exact_same_cell: bool,

    /// Scan cells on all cores
    #[arg(long)]
    parallel: bool,

    /// Use the O(n^2) all-pairs search instead of the grid
    #[arg(long)]
    brute_force: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = read_static(&args.static_file)
        .with_context(|| format!("failed to read {}", args.static_file.display()))?;
    let frames = read_dynamic(&args.dynamic_file, config.count())
        .with_context(|| format!("failed to read {}", args.dynamic_file.display()))?;
    log::info!(
        "loaded {} particles, L = {}, rc = {}, {} timesteps",
        config.count(),
        config.domain,
        config.cutoff,
        frames.len()
    );

    let frame = match args.time {
        Some(t) => frame_at(&frames, t).ok_or_else(|| anyhow!("no timestep at or before t = {t}"))?,
        None => frames.get(args.frame).ok_or_else(|| {
            anyhow!(
                "timestep {} requested, file has {}",
                args.frame,
                frames.len()
            )
        })?,
    };
    let particles = frame.particles(&config)?;

    let search = SearchConfig::new(config.domain, args.cutoff.unwrap_or(config.cutoff))?
        .periodic(!args.no_periodic)
        .same_cell_always_neighbors(!args.exact_same_cell)
        .parallel(args.parallel);

    validate_snapshot(&search, &particles)
        .with_context(|| format!("invalid snapshot at t = {}", frame.time))?;

    let start = Instant::now();
    let neighbors = if args.brute_force {
        brute_force_neighbors(&search, &particles)
    } else {
        let index = CellIndex::new(search, &particles)
            .with_context(|| format!("cannot build grid for timestep t = {}", frame.time))?;
        let res = index.resolution();
        log::info!("grid: M = {}, cell width = {}", res.m, res.cell_width);
        index.neighbors()
    };
    log::info!(
        "t = {}: {} neighbor pairs in {:.3} ms",
        frame.time,
        neighbors.pair_count(),
        start.elapsed().as_secs_f64() * 1e3
    );

    print_neighbors(&neighbors)
}

fn print_neighbors(neighbors: &NeighborMap) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    if neighbors.is_empty() {
        writeln!(out, "No neighboring particles")?;
        return Ok(());
    }
    writeln!(out, "Neighboring particles:")?;
    for (id, list) in neighbors.iter() {
        let mut sorted = list.to_vec();
        sorted.sort_unstable();
        writeln!(out, "Particle {id}:")?;
        for n in sorted {
            writeln!(out, "  neighbor {n}")?;
        }
    }
    out.flush()?;
    Ok(())
}
