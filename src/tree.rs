//! Abstract layout description consumed by the materializer.

/// Children of a directory in source order.
pub type Children = Vec<(String, TreeNode)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeNode {
    Directory(Children),
    File,
    /// An entry whose source value was neither a mapping nor the file marker.
    /// Kept in place so the materializer reports it alongside its siblings.
    Malformed(String),
}

impl TreeNode {
    /// Number of well-formed directories and files below this node.
    pub fn counts(&self) -> (usize, usize) {
        let TreeNode::Directory(children) = self else {
            return (0, 0);
        };
        children
            .iter()
            .fold((0, 0), |(dirs, files), (_, node)| match node {
                TreeNode::Directory(_) => {
                    let (d, f) = node.counts();
                    (dirs + 1 + d, files + f)
                }
                TreeNode::File => (dirs, files + 1),
                TreeNode::Malformed(_) => (dirs, files),
            })
    }
}

/// A named root: the directory created under the base path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoSpec {
    pub name: String,
    pub root: TreeNode,
}

impl RepoSpec {
    pub fn new(name: impl Into<String>, children: Children) -> Self {
        Self {
            name: name.into(),
            root: TreeNode::Directory(children),
        }
    }
}

/// Check that `name` is a single path segment.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name == "." || name == ".." {
        return Err("name refers to a relative directory");
    }
    if name.contains(['/', '\\']) {
        return Err("name contains a path separator");
    }
    if name.contains('\0') {
        return Err("name contains a NUL byte");
    }
    Ok(())
}
