//! Prompting - how the menu asks the operator for input
//!
//! The terminal prompter reads lines from stdin and masked input through
//! rpassword. The scripted prompter replays canned answers for tests.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// The input stream ended before an answer was given
#[derive(Error, Debug)]
#[error("Input closed")]
pub struct InputClosed;

/// Source of operator input
pub trait Prompter {
    /// Read a line of visible text (without the newline)
    fn line(&mut self, prompt: &str) -> Result<String>;

    /// Read a line without echoing it
    fn secret(&mut self, prompt: &str) -> Result<String>;

    /// Ask a y/n question; anything but "y" is no
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.line(&format!("{} (y/n): ", prompt))?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// Interactive terminal input
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn line(&mut self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            return Err(InputClosed.into());
        }
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    }

    fn secret(&mut self, prompt: &str) -> Result<String> {
        rpassword::prompt_password(prompt).context("Failed to read hidden input")
    }
}

/// Canned answers, consumed in order by both `line` and `secret`
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    /// Every prompt shown, in order
    pub prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    fn next(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer),
            None => Err(InputClosed.into()),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn line(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }

    fn secret(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }
}
