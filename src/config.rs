use anyhow::{bail, Context};
use clap::Parser;
use rand::Rng;
use std::io::{BufRead, Write};
use std::time::Duration;

const DEFAULT_FRAME_MS: u64 = 15;
const BANNER: &str = "Maze Generator!";

/// Randomized backtracking maze generator
#[derive(Parser, Debug, Default)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Number of cell rows (prompted for when omitted)
    #[arg(short, long)]
    pub rows: Option<usize>,

    /// Number of cell columns (prompted for when omitted)
    #[arg(short, long)]
    pub cols: Option<usize>,

    /// Random seed; falls back to MAZE_SEED, then to a random one
    #[arg(long)]
    pub seed: Option<u64>,

    /// Highlight the path from entrance to exit
    #[arg(short, long)]
    pub show_solution: bool,

    /// Print how long generation took
    #[arg(short, long)]
    pub time: bool,

    /// Plain text output without terminal colours
    #[arg(long)]
    pub plain: bool,

    /// Watch the maze being carved, one frame per step
    #[arg(long)]
    pub animate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rows: usize,
    pub cols: usize,
    pub seed: u64,
    pub show_solution: bool,
    pub show_time: bool,
    pub plain: bool,
    pub animate: Option<Duration>,
}

impl Settings {
    /// Merges command-line arguments with the environment, prompting on
    /// `input`/`output` for any missing dimension.
    pub fn resolve<I, O>(args: Args, input: &mut I, output: &mut O) -> anyhow::Result<Self>
    where
        I: BufRead,
        O: Write,
    {
        if args.rows.is_none() || args.cols.is_none() {
            write!(output, "{}\n\n", BANNER)?;
        }
        let rows = match args.rows {
            Some(rows) => rows,
            None => prompt_dimension("rows", input, output)?,
        };
        let cols = match args.cols {
            Some(cols) => cols,
            None => prompt_dimension("columns", input, output)?,
        };
        let seed = args
            .seed
            .or_else(read_seed_override)
            .unwrap_or_else(|| rand::thread_rng().gen());
        let animate = args
            .animate
            .then(|| Duration::from_millis(read_frame_ms()));

        Ok(Settings {
            rows,
            cols,
            seed,
            show_solution: args.show_solution,
            show_time: args.time,
            plain: args.plain,
            animate,
        })
    }
}

/// Prompts on `output` for one positive dimension and reads it from `input`.
pub fn prompt_dimension<I, O>(label: &str, input: &mut I, output: &mut O) -> anyhow::Result<usize>
where
    I: BufRead,
    O: Write,
{
    write!(output, "Enter {}: ", label)?;
    output.flush()?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .with_context(|| format!("failed to read {}", label))?;
    if read == 0 {
        bail!("no value given for {}", label);
    }
    let value = line
        .trim()
        .parse::<usize>()
        .with_context(|| format!("{} must be a positive integer, got {:?}", label, line.trim()))?;
    if value == 0 {
        bail!("{} must be at least 1", label);
    }
    Ok(value)
}

fn read_seed_override() -> Option<u64> {
    std::env::var("MAZE_SEED")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn read_frame_ms() -> u64 {
    std::env::var("MAZE_FRAME_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_FRAME_MS)
}
