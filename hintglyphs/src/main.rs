//! Hints the glyphs of a JSON glyph set.
//!
//! `hintglyphs hint` writes the glyph set back with hints added;
//! `hintglyphs report` writes per-glyph stem and zone observations.

mod config;
mod error;
mod glyphs;

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;
use stemhint::{hint_font, GlyphTask, HintOptions, Outcome};

use crate::{config::Config, error::CliError, glyphs::GlyphSet};

#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Hint glyphs and write the hinted glyph set
    Hint {
        #[command(flatten)]
        run: RunArgs,
        /// Rehint glyphs that already have hints
        #[arg(long)]
        force: bool,
        /// Allow small outline fixes such as turning straight curves into lines
        #[arg(long)]
        allow_geometry_changes: bool,
    },
    /// Analyze glyphs and write stem and zone observations
    Report {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// TOML file with the FdDicts and options
    #[arg(short, long)]
    config: PathBuf,
    /// Number of worker threads
    #[arg(short, long)]
    jobs: Option<usize>,
    /// Only process these glyphs (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    glyphs: Vec<String>,
    /// Output file; standard output if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// The glyph set to process
    input: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Hint {
            run,
            force,
            allow_geometry_changes,
        } => {
            let (config, mut glyph_set) = load(&run)?;
            let mut options = options(&config, &run);
            options.force |= force;
            options.allow_geometry_changes |= allow_geometry_changes;
            options.report_only = false;
            let results = hint_font(tasks(&config, &glyph_set)?, &options, None)?;
            let (mut hinted, mut skipped) = (0, 0);
            for (record, result) in glyph_set.glyphs.iter_mut().zip(results) {
                match result.outcome {
                    Ok(Outcome::Hinted) => hinted += 1,
                    Ok(_) => continue,
                    Err(_) => {
                        skipped += 1;
                        continue;
                    }
                }
                for (outline, path) in record.masters.iter_mut().zip(&result.masters) {
                    outline.set_hints(path);
                }
            }
            log::info!("hinted {hinted} glyphs, skipped {skipped}");
            write_json(run.output.as_deref(), &glyph_set)
        }
        Command::Report { run } => {
            let (config, glyph_set) = load(&run)?;
            let mut options = options(&config, &run);
            options.report_only = true;
            let reports = hint_font(tasks(&config, &glyph_set)?, &options, None)?
                .into_iter()
                .filter_map(|result| match result.outcome {
                    Ok(Outcome::Report(report)) => Some(report),
                    _ => None,
                })
                .collect::<Vec<_>>();
            write_json(run.output.as_deref(), &reports)
        }
    }
}

fn load(run: &RunArgs) -> Result<(Config, GlyphSet), CliError> {
    let config = Config::load(&run.config)?;
    let contents = std::fs::read_to_string(&run.input).map_err(|source| CliError::Read {
        path: run.input.clone(),
        source,
    })?;
    let glyph_set = serde_json::from_str(&contents).map_err(|source| CliError::GlyphSet {
        path: run.input.clone(),
        source,
    })?;
    Ok((config, glyph_set))
}

/// Options from the config, overridden by the command line.
fn options(config: &Config, run: &RunArgs) -> HintOptions {
    let mut options = config.options.clone();
    if run.jobs.is_some() {
        options.jobs = run.jobs;
    }
    if !run.glyphs.is_empty() {
        options.glyphs = Some(run.glyphs.iter().cloned().collect());
    }
    options
}

fn tasks(config: &Config, glyph_set: &GlyphSet) -> Result<Vec<GlyphTask>, CliError> {
    let fds = config.shared_fds()?;
    glyph_set
        .glyphs
        .iter()
        .map(|record| {
            let fd = fds.get(&record.name, record.fd.as_deref())?;
            let masters = record
                .masters
                .iter()
                .map(|outline| outline.to_path())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| CliError::Glyph {
                    glyph: record.name.clone(),
                    source,
                })?;
            Ok(GlyphTask {
                name: record.name.clone(),
                fds: vec![fd; masters.len()],
                masters,
            })
        })
        .collect()
}

fn write_json(path: Option<&Path>, value: &impl serde::Serialize) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => std::fs::write(path, json).map_err(|source| CliError::Write {
            path: path.to_owned(),
            source,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").map_err(|source| CliError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            })
        }
    }
}
