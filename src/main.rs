use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use line_patcher::config;
use line_patcher::dispatch::{
    dispatch, ToolCall, ToolMode, CREATE_TEXT_FILE, GET_TEXT_FILE_CONTENTS,
};
use line_patcher::{Change, Encoding, Settings};
use serde_json::{json, Value};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "line-patcher")]
#[command(about = "Line-addressed text edits guarded by expected content", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (falls back to $LINE_PATCHER_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tool exposure mode: all or patch-only
    #[arg(short, long, global = true)]
    mode: Option<ToolMode>,

    /// Dry run - compute every change without writing it
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Show unified diff of changes on stderr
    #[arg(short, long, global = true)]
    diff: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a tool with JSON arguments
    Call {
        /// Tool name, see `line-patcher tools`
        tool: String,

        /// Arguments as inline JSON
        #[arg(short, long, conflicts_with = "args_file")]
        args: Option<String>,

        /// Read arguments from a JSON file (stdin when neither is given)
        #[arg(short = 'f', long)]
        args_file: Option<PathBuf>,
    },

    /// List tools exposed in the active mode
    Tools,

    /// Print a file, optionally sliced by line numbers
    Read {
        file: PathBuf,

        #[arg(short, long)]
        start: Option<usize>,

        #[arg(short, long)]
        end: Option<usize>,

        #[arg(long)]
        encoding: Option<Encoding>,
    },

    /// Create a new file (contents from stdin unless given)
    Create {
        file: PathBuf,

        #[arg(long)]
        contents: Option<String>,

        #[arg(long)]
        encoding: Option<Encoding>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = config::resolve(cli.config.as_deref())?;
    init_tracing(&settings);

    let mode = cli.mode.unwrap_or(settings.tools.mode);

    let call = match cli.command {
        Commands::Tools => return cmd_tools(mode),
        Commands::Call {
            tool,
            args,
            args_file,
        } => {
            let arguments = read_arguments(args, args_file.as_deref())?;
            ToolCall::from_parts(&tool, arguments)
        }
        Commands::Read {
            file,
            start,
            end,
            encoding,
        } => ToolCall::from_parts(
            GET_TEXT_FILE_CONTENTS,
            json!({ "file_path": file, "start": start, "end": end, "encoding": encoding.map(|e| e.name()) }),
        ),
        Commands::Create {
            file,
            contents,
            encoding,
        } => {
            let contents = match contents {
                Some(contents) => contents,
                None => read_stdin()?,
            };
            ToolCall::from_parts(
                CREATE_TEXT_FILE,
                json!({ "file_path": file, "contents": contents, "encoding": encoding.map(|e| e.name()) }),
            )
        }
    };

    let call = match call {
        Ok(call) => call,
        Err(e) => fail(&e),
    };
    cmd_call(&settings, mode, &call, cli.dry_run, cli.diff)
}

fn init_tracing(settings: &Settings) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => settings
            .logging
            .filter()
            .unwrap_or_else(|_| EnvFilter::new("info")),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    Ok(input)
}

fn read_arguments(inline: Option<String>, file: Option<&Path>) -> Result<Value> {
    let raw = match (inline, file) {
        (Some(inline), _) => inline,
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read arguments from {}", path.display()))?,
        (None, None) => read_stdin()?,
    };
    serde_json::from_str(&raw).context("arguments are not valid JSON")
}

fn fail(error: &dyn std::fmt::Display) -> ! {
    eprintln!("{} {}", "✗".red(), error);
    std::process::exit(1);
}

fn cmd_tools(mode: ToolMode) -> Result<()> {
    for tool in mode.tools() {
        println!("{tool}");
    }
    Ok(())
}

fn cmd_call(
    settings: &Settings,
    mode: ToolMode,
    call: &ToolCall,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let engine = settings.engine(dry_run)?;

    let output = match dispatch(&engine, mode, call) {
        Ok(output) => output,
        Err(e) => fail(&e),
    };

    if show_diff {
        for change in &output.changes {
            display_diff(change);
        }
    }
    if engine.options().dry_run && !output.changes.is_empty() {
        eprintln!(
            "{}",
            format!("[DRY RUN - {} file(s) left untouched]", output.changes.len()).cyan()
        );
    }

    println!("{}", serde_json::to_string_pretty(&output.value)?);

    if output.is_error {
        std::process::exit(1);
    }
    Ok(())
}

/// Unified diff of one change, on stderr so stdout stays JSON.
fn display_diff(change: &Change) {
    let file = change.file.display();
    eprintln!("\n{}", format!("--- {file} (original)").dimmed());
    eprintln!("{}", format!("+++ {file} (patched)").dimmed());

    let diff = TextDiff::from_lines(&change.before, &change.after);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        eprint!("{sign}");
    }
}
