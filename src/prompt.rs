//! Prompt and system instruction assembly.

use crate::config::Options;
use anyhow::{Context, Result};
use std::io::Read;

/// Directive added by `-shell`.
pub const SHELL_INSTRUCTION: &str = "You are a shell command generator. Output ONLY the shell command(s) needed, with no explanations, no markdown, no code blocks, no additional text. Just the raw command(s) that can be directly piped to a shell.";

/// Directive added by `-json`.
pub const JSON_INSTRUCTION: &str = "You must respond with valid JSON only. Do not include markdown code blocks, explanations, or any text outside the JSON structure. Output raw JSON that can be directly parsed.";

/// Separator between the question and piped data.
pub const DATA_SEPARATOR: &str = "\n\nData:\n";

/// Read piped input, or nothing when stdin is a terminal.
pub fn read_stdin() -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(String::new());
    }
    read_all(std::io::stdin().lock())
}

fn read_all(mut reader: impl Read) -> Result<String> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .context("failed to read stdin")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Join positional arguments into the question text.
pub fn join_args(args: &[String]) -> String {
    args.join(" ")
}

/// Append piped data to the prompt, if there is any.
pub fn build_prompt(prompt: &str, data: &str) -> String {
    if data.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}{DATA_SEPARATOR}{data}")
    }
}

/// Combine the user's instruction with the output-mode directives.
///
/// Order is user text, shell directive, JSON directive. Returns `None` when
/// nothing applies so the request carries no system instruction at all.
pub fn build_system_instruction(options: &Options) -> Option<String> {
    let mut instructions: Vec<&str> = Vec::new();
    if let Some(system) = options.system.as_deref().filter(|s| !s.is_empty()) {
        instructions.push(system);
    }
    if options.shell {
        instructions.push(SHELL_INSTRUCTION);
    }
    if options.json {
        instructions.push(JSON_INSTRUCTION);
    }

    if instructions.is_empty() {
        None
    } else {
        Some(instructions.join(" "))
    }
}
