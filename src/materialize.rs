//! Walks a [`TreeNode`] and creates the matching directories and files.
//!
//! Traversal is depth-first and pre-order: a directory is created, then all
//! of its children in source order, before moving on to its next sibling.
//! Failures below the root are reported and contained at the failing entry.

use std::fs;
use std::io;

use anyhow::{Context, Result, bail};
use camino::Utf8Path;

use crate::error::NodeError;
use crate::report::{Event, Reporter};
use crate::tree::{Children, RepoSpec, TreeNode, validate_name};

/// What a single materialization created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub directories: usize,
    pub files: usize,
    pub failures: usize,
}

impl Summary {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// Which kinds of entries a run creates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pass {
    #[default]
    Everything,
    /// Skip files.
    DirectoriesOnly,
    /// Descend into directories without creating them. A directory that is
    /// missing was reported by the directory pass and its subtree is skipped.
    FilesOnly,
}

#[derive(Clone, Debug, Default)]
pub struct Materializer {
    file_content: String,
    pass: Pass,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `content` into every file instead of leaving it empty.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.file_content = content.into();
        self
    }

    pub fn with_pass(mut self, pass: Pass) -> Self {
        self.pass = pass;
        self
    }

    /// Create `base/spec.name` and everything below it.
    ///
    /// Returns an error only when the root directory itself cannot be
    /// created; every other failure is reported and counted in the summary.
    pub fn materialize(
        &self,
        spec: &RepoSpec,
        base: &Utf8Path,
        reporter: &mut dyn Reporter,
    ) -> Result<Summary> {
        if let Err(reason) = validate_name(&spec.name) {
            bail!("invalid root name `{}`: {}", spec.name, reason);
        }
        let TreeNode::Directory(children) = &spec.root else {
            bail!("root `{}` is not a directory", spec.name);
        };

        let root = base.join(&spec.name);
        ensure_dir(&root, true).with_context(|| format!("creating root directory {}", root))?;

        let mut summary = Summary::default();
        if self.pass != Pass::FilesOnly {
            summary.directories += 1;
            reporter.record(Event::DirectoryCreated(root.clone()));
        }
        self.walk(children, &root, reporter, &mut summary);
        Ok(summary)
    }

    fn walk(
        &self,
        children: &Children,
        dir: &Utf8Path,
        reporter: &mut dyn Reporter,
        summary: &mut Summary,
    ) {
        for (name, node) in children {
            if let Err(reason) = validate_name(name) {
                self.reject(reporter, summary, dir, name, reason.to_owned());
                continue;
            }

            let path = dir.join(name);
            match node {
                TreeNode::Directory(grandchildren) if self.pass == Pass::FilesOnly => {
                    if path.is_dir() {
                        self.walk(grandchildren, &path, reporter, summary);
                    }
                }
                TreeNode::Directory(grandchildren) => match ensure_dir(&path, false) {
                    Ok(()) => {
                        summary.directories += 1;
                        reporter.record(Event::DirectoryCreated(path.clone()));
                        self.walk(grandchildren, &path, reporter, summary);
                    }
                    Err(source) => {
                        self.fail(reporter, summary, NodeError::DirectoryCreate { path, source })
                    }
                },
                TreeNode::File if self.pass == Pass::DirectoriesOnly => {}
                TreeNode::File => match fs::write(&path, &self.file_content) {
                    Ok(()) => {
                        summary.files += 1;
                        reporter.record(Event::FileCreated(path));
                    }
                    Err(source) => self.fail(reporter, summary, NodeError::FileCreate { path, source }),
                },
                TreeNode::Malformed(found) => self.reject(
                    reporter,
                    summary,
                    dir,
                    name,
                    format!("expected a mapping or \"file\", found {found}"),
                ),
            }
        }
    }

    /// Malformed entries are reported once, by the pass that creates
    /// directories. That holds for entries in file position too: with split
    /// passes a bad file entry is reported by `DirectoriesOnly`, and
    /// `FilesOnly` skips it silently.
    fn reject(
        &self,
        reporter: &mut dyn Reporter,
        summary: &mut Summary,
        parent: &Utf8Path,
        name: &str,
        reason: String,
    ) {
        if self.pass == Pass::FilesOnly {
            return;
        }
        let err = NodeError::Malformed {
            parent: parent.to_owned(),
            name: name.to_owned(),
            reason,
        };
        self.fail(reporter, summary, err);
    }

    fn fail(&self, reporter: &mut dyn Reporter, summary: &mut Summary, err: NodeError) {
        summary.failures += 1;
        reporter.record(Event::NodeFailed(err));
    }
}

/// Create `path` unless a directory is already there.
///
/// Only the root may create missing ancestors; below it the parent was just
/// created by the walk.
fn ensure_dir(path: &Utf8Path, with_parents: bool) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if with_parents {
        fs::create_dir_all(path)
    } else {
        match fs::create_dir(path) {
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
            other => other,
        }
    }
}

/// Paths of every directory and file under `root`, relative to it, sorted.
#[cfg(test)]
pub(crate) fn snapshot(root: &Utf8Path) -> Vec<String> {
    fn visit(root: &Utf8Path, dir: &Utf8Path, out: &mut Vec<String>) {
        for entry in dir.read_dir_utf8().unwrap() {
            let entry = entry.unwrap();
            let path = entry.path().to_owned();
            let rel = path.strip_prefix(root).unwrap().as_str().replace('\\', "/");
            if path.is_dir() {
                out.push(format!("{rel}/"));
                visit(root, &path, out);
            } else {
                out.push(rel);
            }
        }
    }
    let mut out = Vec::new();
    visit(root, root, &mut out);
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn temp_base() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, base)
    }

    fn dir(children: Vec<(&str, TreeNode)>) -> TreeNode {
        TreeNode::Directory(children.into_iter().map(|(n, c)| (n.to_owned(), c)).collect())
    }

    fn sample() -> RepoSpec {
        RepoSpec {
            name: "root".into(),
            root: dir(vec![
                ("a", TreeNode::File),
                ("b", dir(vec![("c", TreeNode::File), ("d", dir(vec![]))])),
                ("e.txt", TreeNode::File),
            ]),
        }
    }

    #[test]
    fn creates_directories_and_empty_files() {
        let (_guard, base) = temp_base();
        let mut reporter = MemoryReporter::default();
        let summary = Materializer::new()
            .materialize(&sample(), &base, &mut reporter)
            .unwrap();

        assert_eq!(
            summary,
            Summary {
                directories: 3,
                files: 3,
                failures: 0
            }
        );
        assert_eq!(
            snapshot(&base),
            ["root/", "root/a", "root/b/", "root/b/c", "root/b/d/", "root/e.txt"]
        );
        assert_eq!(fs::read(base.join("root/b/c")).unwrap(), b"");
    }

    #[test]
    fn second_run_is_idempotent_and_truncates_files() {
        let (_guard, base) = temp_base();
        let materializer = Materializer::new();
        materializer
            .materialize(&sample(), &base, &mut MemoryReporter::default())
            .unwrap();
        let first = snapshot(&base);
        fs::write(base.join("root/a"), "scribbled").unwrap();

        let mut reporter = MemoryReporter::default();
        let summary = materializer.materialize(&sample(), &base, &mut reporter).unwrap();

        assert!(summary.is_clean());
        assert_eq!(snapshot(&base), first);
        assert_eq!(fs::read_to_string(base.join("root/a")).unwrap(), "");
    }

    #[test]
    fn malformed_siblings_are_skipped() {
        for valid in 0..4 {
            let (_guard, base) = temp_base();
            let mut children: Vec<(String, TreeNode)> = (0..valid)
                .map(|i| (format!("f{i}"), TreeNode::File))
                .collect();
            children.insert(
                children.len() / 2,
                ("broken".into(), TreeNode::Malformed("number 42".into())),
            );
            let spec = RepoSpec::new("root", children);

            let mut reporter = MemoryReporter::default();
            let summary = Materializer::new()
                .materialize(&spec, &base, &mut reporter)
                .unwrap();

            assert_eq!(summary.files, valid);
            assert_eq!(summary.failures, 1);
            assert!(matches!(
                reporter.node_failures().as_slice(),
                [NodeError::Malformed { .. }]
            ));
            assert!(!base.join("root/broken").exists());
        }
    }

    #[test]
    fn invalid_names_are_reported() {
        let (_guard, base) = temp_base();
        let spec = RepoSpec::new(
            "root",
            vec![
                ("".into(), TreeNode::File),
                ("../escape".into(), TreeNode::File),
                ("ok".into(), TreeNode::File),
            ],
        );
        let mut reporter = MemoryReporter::default();
        let summary = Materializer::new()
            .materialize(&spec, &base, &mut reporter)
            .unwrap();

        assert_eq!(summary.failures, 2);
        assert_eq!(snapshot(&base), ["root/", "root/ok"]);
        assert!(!base.join("escape").exists());
    }

    #[test]
    fn failed_directory_skips_subtree_but_not_siblings() {
        let (_guard, base) = temp_base();
        fs::create_dir_all(base.join("root")).unwrap();
        // A plain file where a directory should go.
        fs::write(base.join("root/blocked"), "x").unwrap();

        let spec = RepoSpec {
            name: "root".into(),
            root: dir(vec![
                ("before", TreeNode::File),
                ("blocked", dir(vec![("inner", TreeNode::File)])),
                ("after", dir(vec![("deep", TreeNode::File)])),
            ]),
        };
        let mut reporter = MemoryReporter::default();
        let summary = Materializer::new()
            .materialize(&spec, &base, &mut reporter)
            .unwrap();

        assert_eq!(summary.failures, 1);
        assert!(matches!(
            reporter.node_failures().as_slice(),
            [NodeError::DirectoryCreate { .. }]
        ));
        assert_eq!(
            snapshot(&base),
            ["root/", "root/after/", "root/after/deep", "root/before", "root/blocked"]
        );
    }

    #[test]
    fn failed_file_does_not_stop_siblings() {
        let (_guard, base) = temp_base();
        fs::create_dir_all(base.join("root/taken")).unwrap();

        let spec = RepoSpec::new(
            "root",
            vec![("taken".into(), TreeNode::File), ("next".into(), TreeNode::File)],
        );
        let mut reporter = MemoryReporter::default();
        let summary = Materializer::new()
            .materialize(&spec, &base, &mut reporter)
            .unwrap();

        assert_eq!(summary.files, 1);
        assert!(matches!(
            reporter.node_failures().as_slice(),
            [NodeError::FileCreate { .. }]
        ));
        assert!(base.join("root/next").is_file());
    }

    #[test]
    fn descendants_are_created_before_next_sibling() {
        let (_guard, base) = temp_base();
        let spec = RepoSpec {
            name: "r".into(),
            root: dir(vec![
                ("x", dir(vec![("y", dir(vec![("z", TreeNode::File)]))])),
                ("w", TreeNode::File),
            ]),
        };
        let mut reporter = MemoryReporter::default();
        Materializer::new()
            .materialize(&spec, &base, &mut reporter)
            .unwrap();

        let order: Vec<String> = reporter
            .created()
            .iter()
            .map(|p| p.strip_prefix(&base).unwrap().as_str().replace('\\', "/"))
            .collect();
        assert_eq!(order, ["r", "r/x", "r/x/y", "r/x/y/z", "r/w"]);
    }

    #[test]
    fn configured_content_is_written() {
        let (_guard, base) = temp_base();
        let spec = RepoSpec::new("r", vec![("f.txt".into(), TreeNode::File)]);
        Materializer::new()
            .with_content("hello")
            .materialize(&spec, &base, &mut MemoryReporter::default())
            .unwrap();
        assert_eq!(fs::read_to_string(base.join("r/f.txt")).unwrap(), "hello");
    }

    #[test]
    fn split_passes_create_the_same_tree() {
        let (_guard, base) = temp_base();
        let mut reporter = MemoryReporter::default();
        let dirs = Materializer::new()
            .with_pass(Pass::DirectoriesOnly)
            .materialize(&sample(), &base, &mut reporter)
            .unwrap();
        assert_eq!((dirs.directories, dirs.files), (3, 0));
        assert_eq!(snapshot(&base), ["root/", "root/b/", "root/b/d/"]);

        let files = Materializer::new()
            .with_pass(Pass::FilesOnly)
            .materialize(&sample(), &base, &mut reporter)
            .unwrap();
        assert_eq!((files.directories, files.files), (0, 3));
        assert_eq!(reporter.created().len(), 6);
        assert_eq!(
            snapshot(&base),
            ["root/", "root/a", "root/b/", "root/b/c", "root/b/d/", "root/e.txt"]
        );
    }

    #[test]
    fn files_pass_skips_directories_that_were_not_created() {
        let (_guard, base) = temp_base();
        fs::create_dir_all(base.join("root")).unwrap();
        fs::write(base.join("root/blocked"), "x").unwrap();
        let spec = RepoSpec {
            name: "root".into(),
            root: dir(vec![
                ("blocked", dir(vec![("a", TreeNode::File), ("b", TreeNode::File)])),
                ("open", dir(vec![("c", TreeNode::File)])),
            ]),
        };

        let mut reporter = MemoryReporter::default();
        let dirs = Materializer::new()
            .with_pass(Pass::DirectoriesOnly)
            .materialize(&spec, &base, &mut reporter)
            .unwrap();
        let files = Materializer::new()
            .with_pass(Pass::FilesOnly)
            .materialize(&spec, &base, &mut reporter)
            .unwrap();

        assert_eq!(dirs.failures, 1);
        assert_eq!((files.files, files.failures), (1, 0));
        assert!(matches!(
            reporter.node_failures().as_slice(),
            [NodeError::DirectoryCreate { .. }]
        ));
        assert_eq!(snapshot(&base), ["root/", "root/blocked", "root/open/", "root/open/c"]);
    }

    #[test]
    fn unusable_root_aborts() {
        let (_guard, base) = temp_base();
        fs::write(base.join("root"), "not a dir").unwrap();
        let result = Materializer::new().materialize(&sample(), &base, &mut MemoryReporter::default());
        assert!(result.is_err());

        let file_root = RepoSpec {
            name: "f".into(),
            root: TreeNode::File,
        };
        assert!(
            Materializer::new()
                .materialize(&file_root, &base, &mut MemoryReporter::default())
                .is_err()
        );
        assert!(!base.join("f").exists());
    }
}
