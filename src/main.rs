//! aiq - ask a generative model a question from the terminal.
//!
//! The positional arguments form the question. Anything piped on stdin is
//! appended as data, and the model's answer is printed to stdout.

mod config;
mod error;
mod llm;
mod prompt;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use config::{Config, Options, Selection};
use llm::Provider;
use std::io::Write;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "aiq")]
#[command(version, about = "Ask a generative model a question, with optional piped data")]
#[command(override_usage = "aiq [flags] <query prompt>")]
struct Cli {
    /// Model version (e.g., gemini-2.5-flash, gemini-2.5-pro) [default: gemini-2.5-flash]
    #[arg(short = 'm', long = "model", alias = "m", value_name = "MODEL")]
    model: Option<String>,

    /// AI provider (currently only gemini is supported) [default: gemini]
    #[arg(short = 'p', long = "provider", alias = "p", value_name = "PROVIDER")]
    provider: Option<String>,

    /// System instruction to guide the model's behavior
    #[arg(
        short = 's',
        long = "system",
        alias = "s",
        value_name = "TEXT",
        allow_hyphen_values = true
    )]
    system: Option<String>,

    /// Output only shell commands (for piping to a shell)
    #[arg(long)]
    shell: bool,

    /// Output the response as raw JSON
    #[arg(long)]
    json: bool,

    /// The question to ask; all words are joined with spaces
    #[arg(value_name = "QUERY PROMPT", num_args = 0.., trailing_var_arg = true)]
    prompt: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env is fine; real environment variables win over it.
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = Cli::parse_from(normalize_args(std::env::args()));

    if cli.prompt.is_empty() {
        print_usage();
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr so stdout only ever carries the answer.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aiq=warn,reqwest=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    eprintln!("Error: query prompt is required");
    eprintln!("{}", Cli::command().render_help());
}

/// Resolve options, assemble the request, make the call and print the answer.
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let selection = Selection {
        model: cli.model,
        provider: cli.provider,
    };
    let options = Options {
        model: selection.resolve_model(&config),
        provider: selection.resolve_provider(&config),
        system: cli.system,
        shell: cli.shell,
        json: cli.json,
    };
    debug!(
        "Using provider {} with model {}",
        options.provider, options.model
    );

    let question = prompt::join_args(&cli.prompt);
    let data = prompt::read_stdin()?;

    let provider: Provider = options.provider.parse()?;
    let backend = llm::create_backend(provider, &options.model, &config)?;

    let system_instruction = prompt::build_system_instruction(&options);
    let full_prompt = prompt::build_prompt(&question, &data);
    debug!(
        "Sending {} prompt bytes ({} from stdin), system instruction: {} bytes",
        full_prompt.len(),
        data.len(),
        system_instruction.as_ref().map_or(0, String::len)
    );

    let fragments = backend
        .generate(system_instruction.as_deref(), &full_prompt)
        .await
        .context("failed to generate content")?;
    debug!(
        "{} ({}) returned {} fragment(s)",
        backend.name(),
        backend.model(),
        fragments.len()
    );

    let mut stdout = std::io::stdout().lock();
    write_response(&mut stdout, &fragments).context("failed to write response")?;
    Ok(())
}

/// Write the fragments verbatim, then a single newline.
fn write_response(w: &mut impl Write, fragments: &[String]) -> std::io::Result<()> {
    for fragment in fragments {
        w.write_all(fragment.as_bytes())?;
    }
    w.write_all(b"\n")?;
    w.flush()
}

/// Rewrite Go-style single-dash long flags (`-shell`, `-json`) into `--shell`
/// and `--json` so clap does not read them as clustered short flags.
///
/// Only the flag region is touched: it ends at `--` or at the first
/// positional argument, skipping over the value of `-m`, `-p` and `-s`.
fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut iter = args.into_iter();
    let mut out: Vec<String> = iter.next().into_iter().collect();
    let mut in_flags = true;
    let mut expect_value = false;

    for arg in iter {
        if !in_flags {
            out.push(arg);
            continue;
        }
        if expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }
        if arg == "--" || arg == "-" || !arg.starts_with('-') {
            in_flags = false;
            out.push(arg);
            continue;
        }

        let body = arg.trim_start_matches('-');
        let (name, value) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        match name {
            "shell" | "json" => match value.map(parse_bool) {
                // Go accepts `-shell=false`; clap's flags take no value.
                None | Some(Some(true)) => out.push(format!("--{name}")),
                Some(Some(false)) => {}
                // Leave the value on so clap rejects it.
                Some(None) => out.push(format!("--{body}")),
            },
            "m" | "p" | "s" | "model" | "provider" | "system" => {
                expect_value = value.is_none();
                out.push(arg);
            }
            _ => out.push(arg),
        }
    }
    out
}

/// Boolean spellings accepted by Go's `strconv.ParseBool`.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
