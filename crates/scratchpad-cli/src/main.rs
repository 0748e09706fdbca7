use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use scratchpad::platform::cli::python::PythonRuntime;
use scratchpad::{Config, Outcome, Runtime, snippets};

mod expectations;
mod session;
mod terminal;

#[derive(Parser)]
#[command(name = "scratchpad")]
#[command(about = "Run Python snippets and capture their output")]
struct Cli {
    /// Config file (TOML); a missing file means defaults
    #[arg(long, global = true, default_value = "scratchpad.toml")]
    config: PathBuf,
    /// Log debug messages (otherwise RUST_LOG decides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate inline Python code
    Eval {
        /// The code to evaluate
        code: String,
    },
    /// Run a Python file
    Run {
        /// Path to .py file
        file: PathBuf,
    },
    /// Run expectation files and compare outputs
    Test {
        /// Test files with `# test:` and `# expect:` markers
        files: Vec<PathBuf>,
    },
    /// List the bundled examples
    Examples,
    /// Run one bundled example
    Example {
        /// Example name, as listed by `examples`
        name: String,
    },
    /// Headless scratchpad driven from stdin
    Session {
        /// Directory for the saved code and theme
        #[arg(long)]
        state_dir: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Commands::Eval { code } => run_source(&code).await,
        Commands::Run { file } => {
            let code = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            eprintln!("Running: {}", file.display());
            run_source(&code).await
        }
        Commands::Test { files } => expectations::run_files(&files).await,
        Commands::Examples => {
            for example in &snippets::EXAMPLES {
                println!("{:<8} {}", example.name, example.filename);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Example { name } => {
            let Some(example) = snippets::find(&name) else {
                bail!(
                    "unknown example `{name}` (available: {})",
                    snippets::names().join(", ")
                );
            };
            run_source(example.source_code).await
        }
        Commands::Session { state_dir } => {
            if let Some(state_dir) = state_dir {
                config.state_dir = state_dir;
            }
            session::run(config).await
        }
    }
}

/// Print the selected output; a fault in the code fails the process.
async fn run_source(code: &str) -> Result<ExitCode> {
    let runtime = PythonRuntime::new();
    let capture = runtime.run_captured(code).await?;
    let failed = matches!(capture.outcome, Outcome::Raised { .. });
    let output = capture.into_output();
    print!("{output}");
    if !output.is_empty() && !output.ends_with('\n') {
        println!();
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
