//! Interactive prompting.
//!
//! TTY-aware prompt engine in the shape of a small strategy object so
//! callers can swap it out for a non-interactive chooser in scripts and
//! tests.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::ci::Artifact;
use crate::error::{Error, Result};
use crate::resolver::ArtifactChooser;

pub struct PromptEngine {
    interactive: bool,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    /// Create engine with automatic TTY detection.
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal() && io::stdout().is_terminal(),
        }
    }

    /// Force non-interactive mode (used by --yes flags).
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn read_line(&self) -> Result<String> {
        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| Error::internal_io(e.to_string(), Some("read prompt input".to_string())))?;
        Ok(input.trim().to_string())
    }

    /// Run a yes/no prompt. Returns `default` when non-interactive.
    pub fn yes_no(&self, question: &str, default: bool) -> bool {
        if !self.interactive {
            return default;
        }

        let suffix = if default { "[Y/n]" } else { "[y/N]" };
        eprint!("{} {}: ", question, suffix);
        io::stderr().flush().ok();

        let trimmed = match self.read_line() {
            Ok(line) => line.to_lowercase(),
            Err(_) => return default,
        };
        if trimmed.is_empty() {
            return default;
        }

        trimmed.starts_with('y')
    }

    /// Show a header plus items, then ask for confirmation.
    pub fn confirm_list(&self, header: &str, items: &[String], question: &str) -> bool {
        if !self.interactive {
            return false;
        }

        eprintln!("{}", header);
        for item in items {
            eprintln!("  {} {}", '\u{2022}', item);
        }
        eprintln!();

        self.yes_no(question, false)
    }
}

/// Interactive artifact selection: a zero-indexed numbered list of
/// relative paths, answered with an index.
impl ArtifactChooser for PromptEngine {
    fn choose(&self, artifacts: &[Artifact]) -> Result<usize> {
        if !self.interactive {
            return Err(Error::validation_invalid_argument(
                "artifact",
                "More than one artifact was found and there is no TTY to choose from",
                None,
            )
            .with_hint("Pass --artifact <index> to select one non-interactively"));
        }

        eprintln!("More than one artifact was found. Please choose:");
        for (index, artifact) in artifacts.iter().enumerate() {
            eprintln!("{}: {}", index, artifact.relative_path);
        }
        eprint!("choice: ");
        io::stderr().flush().ok();

        let answer = self.read_line()?;
        answer.parse::<usize>().map_err(|_| {
            Error::validation_invalid_argument(
                "artifact",
                "Artifact choice must be a number",
                Some(answer.clone()),
            )
        })
    }
}
