//! Interactive prompting for the wizard.
//!
//! Every prompt carries a default; an empty answer (or non-interactive
//! mode) takes it. Host lists accept `file:<path>` to read one host per
//! line from a file.

use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub struct Prompt {
    editor: Option<DefaultEditor>,
}

impl Prompt {
    pub fn new(non_interactive: bool) -> Result<Self> {
        let editor = if non_interactive {
            None
        } else {
            Some(DefaultEditor::new().context("failed to initialize terminal input")?)
        };
        Ok(Self { editor })
    }

    /// Reads a single value, returning `default` on an empty answer.
    pub fn read_value(&mut self, label: &str, default: &str) -> Result<String> {
        let Some(editor) = self.editor.as_mut() else {
            return Ok(default.to_string());
        };
        let prompt = format!("{} [{}]: ", label.bold(), default.cyan());
        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    Ok(default.to_string())
                } else {
                    let _ = editor.add_history_entry(line);
                    Ok(line.to_string())
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                bail!("aborted")
            }
            Err(e) => Err(anyhow!("input error: {}", e)),
        }
    }

    pub fn read_number(&mut self, label: &str, default: u64) -> Result<u64> {
        loop {
            let answer = self.read_value(label, &default.to_string())?;
            match answer.parse::<u64>() {
                Ok(n) => return Ok(n),
                Err(_) => {
                    if self.editor.is_none() {
                        bail!("invalid number for {}: {}", label, answer);
                    }
                    eprintln!("{}", format!("not a number: {}", answer).red());
                }
            }
        }
    }

    /// Reads a comma-separated host list, or `file:<path>` for a file
    /// with one host per line.
    pub fn read_hosts(&mut self, label: &str, default: &[String]) -> Result<Vec<String>> {
        let answer = self.read_value(label, &default.join(","))?;
        if let Some(path) = answer.strip_prefix("file:") {
            let text = fs::read_to_string(path.trim())
                .with_context(|| format!("failed to read host file {}", path))?;
            return Ok(text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect());
        }
        Ok(answer
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(String::from)
            .collect())
    }

    pub fn confirm(&mut self, label: &str, default: bool) -> Result<bool> {
        let answer = self.read_value(label, if default { "y" } else { "n" })?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }
}
