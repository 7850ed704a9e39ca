//! Interactive [`Prompter`] over a line-oriented terminal.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use graft_sync::{Prompter, SyncError};

/// Reads answers line by line from `input` and writes questions to `output`.
///
/// End of input takes the question's default, so piping `/dev/null` behaves
/// like `--yes` wherever a default exists.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<Reply, SyncError> {
        write!(self.output, "{} {question} ", "?".cyan().bold()).map_err(prompt_err)?;
        self.output.flush().map_err(prompt_err)?;
        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(prompt_err)?;
        if read == 0 {
            writeln!(self.output).map_err(prompt_err)?;
            return Ok(Reply::Closed);
        }
        match line.trim() {
            "" => Ok(Reply::Blank),
            answer => Ok(Reply::Text(answer.to_string())),
        }
    }
}

enum Reply {
    Text(String),
    Blank,
    /// Input is exhausted.
    Closed,
}

fn prompt_err(err: io::Error) -> SyncError {
    SyncError::Prompt(err.to_string())
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn choose(&mut self, message: &str, options: &[String], default: usize) -> Result<usize, SyncError> {
        if options.is_empty() {
            return Err(SyncError::Prompt("no options to choose from".into()));
        }
        writeln!(self.output, "{message}").map_err(prompt_err)?;
        for (i, option) in options.iter().enumerate() {
            let marker = if i == default { ">" } else { " " };
            writeln!(self.output, "  {marker} {:>2}) {option}", i + 1).map_err(prompt_err)?;
        }
        loop {
            let Reply::Text(answer) = self.ask(&format!("Choice [{}]:", default + 1))? else {
                return Ok(default.min(options.len() - 1));
            };
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(self.output, "Enter a number between 1 and {}.", options.len()).map_err(prompt_err)?,
            }
        }
    }

    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String, SyncError> {
        loop {
            let question = match default {
                Some(d) => format!("{message} [{d}]:"),
                None => format!("{message}:"),
            };
            match (self.ask(&question)?, default) {
                (Reply::Text(answer), _) => return Ok(answer),
                (_, Some(d)) => return Ok(d.to_string()),
                (Reply::Blank, None) => writeln!(self.output, "An answer is required.").map_err(prompt_err)?,
                (Reply::Closed, None) => {
                    return Err(SyncError::Prompt(format!("'{message}' needs an answer and input is closed")))
                }
            }
        }
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, SyncError> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let Reply::Text(answer) = self.ask(&format!("{message} {hint}"))? else {
                return Ok(default);
            };
            match answer.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Answer y or n.").map_err(prompt_err)?,
            }
        }
    }
}
