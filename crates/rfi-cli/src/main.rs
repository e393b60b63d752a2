use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rfi_config::{load_for_workspace, RfiConfig};
use rfi_interpreter::InterpreterError;
use rfi_runtime::BufferSink;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

mod session;

use session::{split_cells, Session};

#[derive(Parser)]
#[command(name = "rfi", version, about = "Incremental test snippet interpreter")]
struct Cli {
    /// Workspace root used for config discovery and relative paths
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute files as consecutive cells of one session
    Run(RunArgs),
    /// Execute cells read from stdin, separated by `%%` lines
    Repl(ReplArgs),
    /// Print completions for a file at a cursor position
    Complete(CompleteArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Cell files, executed in order
    #[arg(required = true)]
    cells: Vec<PathBuf>,
    /// Emit JSON results instead of the console report
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReplArgs {
    /// Emit JSON results instead of the console report
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CompleteArgs {
    /// File holding the code being edited
    file: PathBuf,
    /// Cursor offset in characters (defaults to the end of the file)
    #[arg(long)]
    cursor: Option<usize>,
    /// Cell files executed before completing
    #[arg(long = "prelude")]
    preludes: Vec<PathBuf>,
    /// Emit the full completion reply as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(&cli.root)?;
    rfi_config::init_tracing(&config.logging);
    let mut session = Session::new(&config, &cli.root);

    match cli.command {
        Command::Run(args) => {
            let mut results = Vec::new();
            for path in &args.cells {
                let cell = read_cell(path)?;
                match run_cell(&mut session, &cell, args.json) {
                    Ok(result) => results.push(result),
                    Err(err) => {
                        report_failure(path.display().to_string(), &err);
                        print_results(&results, args.json)?;
                        return Ok(1);
                    }
                }
            }
            print_results(&results, args.json)?;
            Ok(0)
        }
        Command::Repl(args) => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read cells from stdin")?;

            let mut results = Vec::new();
            let mut exit = 0;
            for (idx, cell) in split_cells(&input).iter().enumerate() {
                match run_cell(&mut session, cell, args.json) {
                    Ok(result) => results.push(result),
                    Err(err) => {
                        report_failure(format!("cell {}", idx + 1), &err);
                        exit = 1;
                    }
                }
            }
            print_results(&results, args.json)?;
            Ok(exit)
        }
        Command::Complete(args) => {
            for path in &args.preludes {
                let cell = read_cell(path)?;
                let mut quiet = BufferSink::new();
                if let Err(err) = session.execute(&cell, Some(&mut quiet)) {
                    report_failure(path.display().to_string(), &err);
                    return Ok(1);
                }
            }

            let code = read_cell(&args.file)?;
            let reply = session.complete(&code, args.cursor);
            if args.json {
                print_json(&reply)?;
            } else {
                for name in &reply.matches {
                    println!("{name}");
                }
            }
            Ok(0)
        }
    }
}

fn load_config(root: &Path) -> Result<RfiConfig> {
    let (config, _path) = load_for_workspace(root)
        .with_context(|| format!("failed to load config for {}", root.display()))?;
    Ok(config)
}

fn read_cell(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// In JSON mode the console report is swallowed so stdout stays parseable.
fn run_cell(
    session: &mut Session,
    cell: &str,
    json: bool,
) -> Result<rfi_interpreter::SuiteResult, InterpreterError> {
    if json {
        let mut quiet = BufferSink::new();
        session.execute(cell, Some(&mut quiet))
    } else {
        session.execute(cell, None)
    }
}

fn report_failure(what: String, err: &InterpreterError) {
    tracing::debug!(target: "rfi.cli", cell = %what, error = %err, "cell failed");
    let text = err.to_string();
    eprint!("{what}: {text}");
    if !text.ends_with('\n') {
        eprintln!();
    }
}

fn print_results<T: Serialize>(results: &[T], json: bool) -> Result<()> {
    if json {
        print_json(&results)?;
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
