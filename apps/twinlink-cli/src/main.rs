//! twinlink - paired-record feature pipeline
//!
//! # Commands
//!
//! - `clean`: de-duplicate, filter and standardize raw paired records
//! - `features`: replace twin attributes with similarity features
//! - `select`: rank features with a random forest and keep the important ones
//! - `run`: every stage in order, one file per stage

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use twinlink_core::{
    CleanReport, Pipeline, PipelineConfig, SelectionError, SelectionModel, Threshold,
};

#[derive(Parser)]
#[command(name = "twinlink")]
#[command(version)]
#[command(about = "Similarity features and importance-based selection for paired records")]
#[command(propagate_version = true)]
struct Cli {
    /// Pipeline configuration (TOML, or JSON with a .json extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean raw paired records
    Clean {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Derive similarity features from cleaned records
    Features {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Select features by random-forest importance
    Select {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Label column (overrides the configuration)
        #[arg(long)]
        label: Option<String>,
        /// Threshold rule: mean, median, 1.25*mean, 0.5*median or a number
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<Threshold>,
        /// Write the fitted model and per-feature importances as JSON
        #[arg(long)]
        importances: Option<PathBuf>,
    },
    /// Run clean, features and select in order
    Run {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else {
        match cli.verbose {
            0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Stage errors render their cause in the message
    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Clean { input, output } => {
            let pipeline = Pipeline::new(config)?;
            let raw = pipeline.read_table(&input)?;
            let (cleaned, report) = pipeline.clean(&raw)?;
            pipeline.write_table(&cleaned, &output)?;
            print_report(&report);
        }
        Commands::Features { input, output } => {
            let pipeline = Pipeline::new(config)?;
            let cleaned = pipeline.read_table(&input)?;
            let features = pipeline.features(&cleaned)?;
            pipeline.write_table(&features, &output)?;
            println!(
                "{} rows, {} columns",
                features.num_rows(),
                features.num_columns()
            );
        }
        Commands::Select {
            input,
            output,
            label,
            threshold,
            importances,
        } => {
            if let Some(label) = label {
                config.selection.label_column = label;
            }
            if let Some(threshold) = threshold {
                config.selection.threshold = threshold;
            }
            let pipeline = Pipeline::new(config)?;
            let features = pipeline.read_table(&input)?;
            let selection = pipeline.select(&features)?;
            pipeline.write_table(&selection.train, &output)?;
            if let Some(path) = importances {
                write_model(&selection.model, &path)?;
            }
            print_model(&selection.model);
        }
        Commands::Run { input, out_dir } => {
            let pipeline = Pipeline::new(config)?;
            let outputs = pipeline.run(&input, &out_dir)?;
            print_report(&outputs.clean_report);
            print_model(&outputs.model);
            println!("outputs written to {}", out_dir.display());
        }
    }

    Ok(())
}

fn parse_threshold(value: &str) -> Result<Threshold, String> {
    value.parse().map_err(|e: SelectionError| e.to_string())
}

fn write_model(model: &SelectionModel, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, model.to_json()?)?;
    info!(path = %path.display(), "wrote importances");
    Ok(())
}

fn print_report(report: &CleanReport) {
    println!("input rows:            {}", report.input_rows);
    println!("duplicates removed:    {}", report.duplicates_removed);
    println!("null rows removed:     {}", report.null_rows_removed);
    println!("bad digit rows:        {}", report.invalid_digit_rows_removed);
    println!("bad date rows:         {}", report.invalid_date_rows_removed);
    println!("output rows:           {}", report.output_rows);
}

fn print_model(model: &SelectionModel) {
    println!(
        "threshold {} = {:.6}",
        model.threshold_rule(),
        model.threshold()
    );
    for (name, importance) in model.ranking() {
        let mark = if model.selected_features().contains(&name) {
            "*"
        } else {
            " "
        };
        println!("{} {:<32} {:.6}", mark, name, importance);
    }
    if let Some(accuracy) = model.held_out_accuracy() {
        println!("held-out accuracy {:.4}", accuracy);
    }
}
