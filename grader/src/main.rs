use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use tracing_appender::rolling;
use util::config;

use grader::pipeline::{self, BatchArgs};

/// Set up grading directories and run each submission in a batch export.
#[derive(Parser, Debug)]
#[command(name = "grader", version, about)]
struct Args {
    /// The batch zipfile exported from the learning-management system.
    zipfile: PathBuf,

    /// The name of the assignment.
    assignment: String,

    /// The name of the grader. Falls back to the GRADER_NAME environment
    /// variable when omitted.
    grader: Option<String>,

    /// The directory to grade in.
    #[arg(short = 'd', long = "directory", default_value = ".")]
    directory: PathBuf,

    /// The directory with the default resources needed to run the assignment.
    #[arg(short = 'r', long = "resources")]
    resources: Option<PathBuf>,

    /// File with commands to run for each submission, separated by newlines.
    #[arg(short = 'c', long = "commands", default_value = "commands.txt")]
    commands: PathBuf,

    /// Expected program output to diff each submission against.
    #[arg(short = 'e', long = "expected-output")]
    expected_output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let _log_guard = init_logging(&config::log_file());

    if let Err(e) = run().await {
        tracing::error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let grader = match args.grader {
        Some(name) => name,
        None => {
            let from_env = config::grader_name();
            if from_env.is_empty() {
                bail!("no grader name given and GRADER_NAME is not set");
            }
            from_env
        }
    };

    if !args.directory.is_dir() {
        bail!("{} is not a valid directory", args.directory.display());
    }
    if let Some(resources) = &args.resources {
        if !resources.is_dir() {
            bail!("{} is not a valid directory", resources.display());
        }
    }

    let batch = BatchArgs {
        zipfile: args.zipfile,
        assignment: args.assignment,
        grader,
        grading_dir: args.directory,
        resources_dir: args.resources,
        commands_path: args.commands,
        expected_output: args.expected_output,
    };

    let summary = pipeline::run_batch(&batch).await?;
    println!(
        "Graded {} submission(s) for {}.",
        summary.students.len(),
        summary.assignment
    );
    Ok(())
}

fn init_logging(log_file: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true);

    // Defaulting for LOG_LEVEL already happened when the config loaded.
    let env_filter = EnvFilter::new(config::log_level());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config::log_to_stdout() {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}
