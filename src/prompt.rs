//! Operator prompts
//!
//! The lifecycle never reads the terminal directly. It asks a `Confirm`
//! implementation, so tests and `--yes` can answer without a terminal.

use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Decides yes/no questions put to the operator
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> Result<bool>,
{
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self(question)
    }
}

/// Asks on the controlling terminal, defaulting to no
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        prompt_yes_no(question, false)
    }
}

/// Answers yes without asking (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        println!("{} [y/N]: y (--yes)", question);
        Ok(true)
    }
}

pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    ask_yes_no(&mut stdin.lock(), &mut stdout, prompt, default)
}

fn ask_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    default: bool,
) -> Result<bool> {
    let default_str = if default { "Y/n" } else { "y/N" };
    write!(output, "{} [{}]: ", prompt, default_str)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        // Closed stdin reads as an empty answer
        writeln!(output)?;
        tracing::debug!("stdin closed, taking default answer for {:?}", prompt);
        return Ok(default);
    }

    Ok(parse_answer(&line, default))
}

fn parse_answer(input: &str, default: bool) -> bool {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}
