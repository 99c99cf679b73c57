//! Qalam Compiler - Arabic-keyword teaching language to Python 3
//!
//! Usage: qalamc [OPTIONS] <source>

use anyhow::{Context, bail};
use clap::Parser as ClapParser;
use qalam_compiler::backend::BackendConfig;
use qalam_compiler::common::{CompileError, DiagnosticReporter};
use qalam_compiler::driver::Pipeline;
use qalam_compiler::frontend::FrontendConfig;
use qalam_compiler::frontend::parser::DEFAULT_MAX_DEPTH;
use qalam_compiler::runner::{self, RunConfig, RunOutcome};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(ClapParser, Debug)]
#[command(name = "qalamc")]
#[command(version)]
#[command(about = "Compiler for the Qalam Arabic-keyword language, targeting Python 3", long_about = None)]
struct Args {
    /// Qalam source file
    #[arg(required = true)]
    source: PathBuf,

    /// Output file (default: <program>_generated.py next to the source)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Only generate Python, do not run it
    #[arg(long)]
    no_exec: bool,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Dump the symbol table (for debugging)
    #[arg(long)]
    dump_symbols: bool,

    /// Python interpreter to run the program with
    #[arg(long)]
    python: Option<PathBuf>,

    /// Run time limit in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Nesting limit for statements and expressions
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(&args) {
        // Source errors were already rendered as diagnostics
        match e.downcast_ref::<CompileError>() {
            Some(CompileError::Io(_)) | None => eprintln!("error: {:#}", e),
            Some(_) => {}
        }
        process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let frontend_config = FrontendConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        dump_symbols: args.dump_symbols,
        verbose: args.verbose,
        max_depth: args.max_depth,
    };
    let backend_config = BackendConfig {
        verbose: args.verbose,
    };

    if !args.source.exists() {
        bail!("source file not found: {}", args.source.display());
    }

    let mut reporter = DiagnosticReporter::new();
    let pipeline = Pipeline::default();
    let generated = pipeline.compile_file(
        &args.source,
        args.output.as_deref(),
        &frontend_config,
        &backend_config,
        &mut reporter,
    )?;
    println!("تم إنشاء الملف: {}", generated.display());

    if args.no_exec {
        return Ok(());
    }

    let run_config = RunConfig {
        python: args.python.clone(),
        timeout: Duration::from_secs(args.timeout),
    };
    let outcome = runner::run_script(&generated, &run_config)
        .with_context(|| format!("cannot run {}", generated.display()))?;

    match outcome {
        RunOutcome::Success => Ok(()),
        RunOutcome::Failed(Some(code)) => bail!("program exited with code {}", code),
        RunOutcome::Failed(None) => bail!("program was terminated by a signal"),
        RunOutcome::TimedOut => bail!("program exceeded the {} s time limit", args.timeout),
    }
}
