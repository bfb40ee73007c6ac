use std::io;
use std::process::Command;

use anyhow::Result;
use camino::Utf8Path;
use tracing::debug;

use crate::confirm::{Confirm, Question};
use crate::error::GitError;
use crate::report::{Event, Reporter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitSettings {
    pub program: String,
    pub commit_message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GitOutcome {
    /// Git could not be run; the tree is left as materialized.
    Skipped,
    Initialized,
    Committed,
}

/// Initialize a repository in `root`, show its status, and commit everything
/// if the caller agrees.
///
/// Git failures are reported, never returned; only a failing confirmation
/// prompt is an error.
pub fn init_repository(
    root: &Utf8Path,
    settings: &GitSettings,
    confirm: &mut dyn Confirm,
    reporter: &mut dyn Reporter,
) -> Result<GitOutcome> {
    let git = Git {
        program: &settings.program,
        root,
    };

    if let Err(err) = git.run(&["init"]) {
        reporter.record(Event::ToolFailed(err));
        return Ok(GitOutcome::Skipped);
    }
    if let Err(err) = git.run(&["status"]) {
        reporter.record(Event::ToolFailed(err));
    }

    if !confirm.confirm(&Question::CommitInitial(root.to_owned()))? {
        return Ok(GitOutcome::Initialized);
    }

    let message = settings.commit_message.as_str();
    let steps: [&[&str]; 2] = [&["add", "."], &["commit", "-m", message]];
    for args in steps {
        if let Err(err) = git.run(args) {
            reporter.record(Event::ToolFailed(err));
            return Ok(GitOutcome::Initialized);
        }
    }
    reporter.notice(&format!("Committed initial tree in {}", root));
    Ok(GitOutcome::Committed)
}

struct Git<'a> {
    program: &'a str,
    root: &'a Utf8Path,
}

impl Git<'_> {
    fn run(&self, args: &[&str]) -> Result<(), GitError> {
        let command = format_command(self.program, args);
        debug!("running `{}` in {}", command, self.root);
        let status = Command::new(self.program)
            .args(args)
            .current_dir(self.root)
            .status()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => GitError::ToolUnavailable {
                    program: self.program.to_owned(),
                },
                _ => GitError::Spawn {
                    command: command.clone(),
                    source,
                },
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(GitError::Failed {
                command,
                code: status.code(),
            })
        }
    }
}

fn format_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(|arg| {
            if arg.chars().any(|c| c.is_whitespace()) {
                format!("\"{}\"", arg.replace('"', "\\\""))
            } else {
                arg.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::FixedAnswer;
    use crate::report::MemoryReporter;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn quotes_arguments_with_spaces() {
        assert_eq!(
            format_command("git", &["commit", "-m", "Initial commit."]),
            "git commit -m \"Initial commit.\""
        );
        assert_eq!(format_command("git", &["add", "."]), "git add .");
    }

    #[test]
    fn missing_tool_is_reported_and_leaves_tree() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(root.join("kept.txt"), "").unwrap();

        let settings = GitSettings {
            program: "repotree-missing-git-binary".into(),
            commit_message: "Initial commit.".into(),
        };
        let mut reporter = MemoryReporter::default();
        let outcome =
            init_repository(&root, &settings, &mut FixedAnswer(true), &mut reporter).unwrap();

        assert_eq!(outcome, GitOutcome::Skipped);
        assert!(matches!(
            reporter.events.as_slice(),
            [Event::ToolFailed(GitError::ToolUnavailable { .. })]
        ));
        assert!(root.join("kept.txt").is_file());
    }
}
