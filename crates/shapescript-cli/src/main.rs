//! shapescript command line runner
//!
//! Runs one script file, streaming every notice to stdout tagged with its
//! line number, then prints the shapes left on the scene.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use shapescript::{Interpreter, Notice, Options, RunOutcome, Scene};

#[derive(Parser)]
#[command(version, about = "Run a shapescript file and print the resulting scene")]
struct Args {
    /// Script to run
    input: PathBuf,

    /// Line to start from (1-based)
    #[arg(long, default_value_t = 1)]
    start_line: usize,

    /// Stop after this many executed lines
    #[arg(long)]
    step_limit: Option<usize>,

    /// Don't echo each line before running it
    #[arg(short, long)]
    quiet: bool,
}

fn tag(notice: &Notice) -> String {
    match notice.line {
        Some(line) => format!("{line:>4}"),
        None => "    ".to_string(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so stdout stays a clean transcript
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let scene = Scene::new();
    scene
        .notifier()
        .on_info(|notice| println!("{} | {}", tag(notice), notice.message));
    scene
        .notifier()
        .on_error(|notice| println!("{} ! {}", tag(notice), notice.message));

    let mut interpreter = Interpreter::new(scene)
        .with_options(Options {
            step_limit: args.step_limit,
            echo: !args.quiet,
        })
        .with_source_name(args.input.display().to_string());
    interpreter.compile(&source);
    tracing::info!(lines = interpreter.program().len(), "running {}", args.input.display());
    let outcome = interpreter.execute(args.start_line).await;

    let scene = interpreter.scene();
    if !scene.is_empty() {
        println!();
        for shape in scene.shapes() {
            println!("{shape}");
        }
    }

    Ok(match outcome {
        RunOutcome::Finished => ExitCode::SUCCESS,
        RunOutcome::Halted(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::FAILURE
        }
        RunOutcome::StepLimitReached { line } => {
            eprintln!("step limit reached before line {line}");
            ExitCode::from(2)
        }
        RunOutcome::Cancelled { line } => {
            eprintln!("cancelled while waiting on line {line}");
            ExitCode::from(3)
        }
    })
}
