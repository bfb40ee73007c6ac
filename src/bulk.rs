//! Synthetic layouts for filesystem benchmarks.

use std::fs;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use camino::Utf8Path;

use crate::confirm::{Confirm, Question};
use crate::materialize::{Materializer, Pass};
use crate::report::{Event, PhaseTiming, Reporter};
use crate::tree::{RepoSpec, TreeNode, validate_name};

/// Parameters for one generated layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkSpec {
    pub repo_name: String,
    pub dir_count: usize,
    pub file_count: usize,
    pub nesting_depth: usize,
    pub file_name_prefix: String,
    pub dir_name_prefix: String,
    pub file_extension: String,
    pub file_content: String,
}

impl BulkSpec {
    fn dir_name(&self, index: usize) -> String {
        format!("{}_{}", self.dir_name_prefix, index)
    }

    fn file_name(&self, index: usize) -> String {
        format!("{}_{}.{}", self.file_name_prefix, index, self.file_extension)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BulkMode {
    /// `dir_count` sibling directories of `file_count` files each.
    #[default]
    Flat,
    /// One chain of `nesting_depth` directories per index.
    Nested,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkReport {
    pub directories: PhaseTiming,
    pub files: PhaseTiming,
    pub failures: usize,
}

/// `dir_count` directories, each holding `file_count` files.
pub fn generate(spec: &BulkSpec) -> RepoSpec {
    let files: Vec<(String, TreeNode)> = (0..spec.file_count)
        .map(|j| (spec.file_name(j), TreeNode::File))
        .collect();
    let dirs = (0..spec.dir_count)
        .map(|i| (spec.dir_name(i), TreeNode::Directory(files.clone())))
        .collect();
    RepoSpec::new(spec.repo_name.clone(), dirs)
}

/// For each index, `nesting_depth` directories nested inside one another.
///
/// Every level of chain `i` is named `{dir_prefix}_{i}`; the name does not
/// change with depth.
pub fn generate_nested(spec: &BulkSpec) -> RepoSpec {
    let chains = (0..spec.dir_count)
        .map(|i| {
            let name = spec.dir_name(i);
            let mut node = TreeNode::Directory(Vec::new());
            for _ in 1..spec.nesting_depth {
                node = TreeNode::Directory(vec![(name.clone(), node)]);
            }
            (name, node)
        })
        .collect();
    RepoSpec::new(spec.repo_name.clone(), chains)
}

/// Generate and materialize under `base`, timing directories and files
/// separately.
///
/// An existing root is only touched after `confirm` agrees to replace it;
/// declining returns `Ok(None)` with the filesystem unchanged.
pub fn run(
    spec: &BulkSpec,
    mode: BulkMode,
    base: &Utf8Path,
    confirm: &mut dyn Confirm,
    reporter: &mut dyn Reporter,
) -> Result<Option<BulkReport>> {
    if spec.nesting_depth == 0 {
        bail!("nesting depth must be at least 1");
    }
    if let Err(reason) = validate_name(&spec.repo_name) {
        bail!("invalid repository name `{}`: {}", spec.repo_name, reason);
    }

    let root = base.join(&spec.repo_name);
    if root.symlink_metadata().is_ok() {
        if !confirm.confirm(&Question::ReplaceRoot(root.clone()))? {
            reporter.notice(&format!("Keeping existing {}; nothing generated.", root));
            return Ok(None);
        }
        if root.is_dir() {
            fs::remove_dir_all(&root).with_context(|| format!("removing {}", root))?;
        } else {
            fs::remove_file(&root).with_context(|| format!("removing {}", root))?;
        }
        reporter.notice(&format!("Removed existing {}", root));
    }

    let tree = match mode {
        BulkMode::Flat => generate(spec),
        BulkMode::Nested => generate_nested(spec),
    };

    let start = Instant::now();
    let dirs = Materializer::new()
        .with_pass(Pass::DirectoriesOnly)
        .materialize(&tree, base, reporter)?;
    // The root is bookkeeping, not a generated directory.
    let dir_timing = PhaseTiming {
        label: "make directories",
        count: dirs.directories.saturating_sub(1),
        elapsed: start.elapsed(),
    };
    reporter.record(Event::Phase(dir_timing.clone()));

    let start = Instant::now();
    let files = Materializer::new()
        .with_content(spec.file_content.clone())
        .with_pass(Pass::FilesOnly)
        .materialize(&tree, base, reporter)?;
    let file_timing = PhaseTiming {
        label: "make files",
        count: files.files,
        elapsed: start.elapsed(),
    };
    reporter.record(Event::Phase(file_timing.clone()));

    Ok(Some(BulkReport {
        directories: dir_timing,
        files: file_timing,
        failures: dirs.failures + files.failures,
    }))
}
