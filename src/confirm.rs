use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;

/// Decisions the generator and git helpers defer to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Question {
    /// A root with the same name already exists at this path.
    ReplaceRoot(Utf8PathBuf),
    /// Stage and commit everything in a freshly initialized repository.
    CommitInitial(Utf8PathBuf),
}

impl Question {
    /// Answer used when the user just presses enter.
    pub fn default_answer(&self) -> bool {
        match self {
            Question::ReplaceRoot(_) => false,
            Question::CommitInitial(_) => true,
        }
    }

    fn label(&self) -> String {
        let hint = if self.default_answer() { "[y]/n" } else { "y/[n]" };
        match self {
            Question::ReplaceRoot(path) => format!("{} already exists. Replace it? ({}): ", path, hint),
            Question::CommitInitial(path) => format!("Make initial commit in {}? ({}): ", path, hint),
        }
    }
}

pub trait Confirm {
    fn confirm(&mut self, question: &Question) -> Result<bool>;
}

/// Always gives the same answer.
#[derive(Clone, Copy, Debug)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&mut self, _question: &Question) -> Result<bool> {
        Ok(self.0)
    }
}

/// Asks on stdout and reads the reply from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, question: &Question) -> Result<bool> {
        let stdin = io::stdin();
        prompt(&mut stdin.lock(), &mut io::stdout(), question)
    }
}

fn prompt(input: &mut impl BufRead, output: &mut impl Write, question: &Question) -> Result<bool> {
    let label = question.label();
    write!(output, "{}", label).with_context(|| format!("writing prompt `{label}`"))?;
    output.flush().with_context(|| format!("writing prompt `{label}`"))?;
    let mut buf = String::new();
    input
        .read_line(&mut buf)
        .with_context(|| format!("reading input for `{label}`"))?;
    Ok(parse_answer(&buf, question.default_answer()))
}

fn parse_answer(raw: &str, default: bool) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}
