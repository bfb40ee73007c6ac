use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::gitops::GitSettings;
use crate::templates;

const CONFIG_DIR: &str = ".repotree";
const CONFIG_FILE: &str = "config.toml";

/// Root configuration document, `~/.repotree/config.toml` by default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RepoTreeConfig {
    pub bulk: BulkDefaults,
    pub git: GitConfig,
}

/// Naming used by `repotree bulk` when flags are omitted.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BulkDefaults {
    pub dir_prefix: String,
    pub file_prefix: String,
    pub extension: String,
    pub content: String,
}

impl Default for BulkDefaults {
    fn default() -> Self {
        Self {
            dir_prefix: "dir".to_owned(),
            file_prefix: "file".to_owned(),
            extension: "txt".to_owned(),
            content: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub enabled: bool,
    pub program: String,
    pub commit_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "git".to_owned(),
            commit_message: "Initial commit.".to_owned(),
        }
    }
}

impl GitConfig {
    pub fn settings(&self) -> GitSettings {
        GitSettings {
            program: self.program.clone(),
            commit_message: self.commit_message.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigPathSource {
    Explicit,
    Discovered,
    HomeDefault,
}

impl ConfigPathSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigPathSource::Explicit => "explicit",
            ConfigPathSource::Discovered => "discovered",
            ConfigPathSource::HomeDefault => "home-default",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedConfigPath {
    pub path: Utf8PathBuf,
    pub source: ConfigPathSource,
}

/// Pick the config file: explicit flag, then the nearest
/// `.repotree/config.toml` above `start`, then the home directory.
pub fn resolve_path(explicit: Option<&Path>, start: &Utf8Path) -> Result<ResolvedConfigPath> {
    if let Some(path) = explicit {
        let path = Utf8PathBuf::from_path_buf(path.to_path_buf())
            .map_err(|_| anyhow!("config path must be valid UTF-8"))?;
        return Ok(ResolvedConfigPath {
            path,
            source: ConfigPathSource::Explicit,
        });
    }

    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        if candidate.is_file() {
            return Ok(ResolvedConfigPath {
                path: candidate,
                source: ConfigPathSource::Discovered,
            });
        }
        current = dir.parent();
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow!("unable to determine home directory"))?;
    let home = Utf8PathBuf::from_path_buf(home).map_err(|_| anyhow!("home directory is not valid UTF-8"))?;
    Ok(ResolvedConfigPath {
        path: home.join(CONFIG_DIR).join(CONFIG_FILE),
        source: ConfigPathSource::HomeDefault,
    })
}

/// Load a configuration file; a missing file means defaults.
pub fn load_from_path(path: &Utf8Path) -> Result<RepoTreeConfig> {
    if !path.exists() {
        return Ok(RepoTreeConfig::default());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path))
}

pub fn write_example_config(path: &Utf8Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("{} already exists; rerun with --force to overwrite", path);
    }

    templates::write_template(path, templates::EXAMPLE_CONFIG)
}

pub fn format_summary(config: &RepoTreeConfig) -> String {
    let mut out = String::new();
    let bulk = &config.bulk;
    let content = if bulk.content.is_empty() {
        "<empty>".to_owned()
    } else {
        format!("{} bytes", bulk.content.len())
    };

    let _ = writeln!(
        out,
        "Bulk naming: {}_<i>/{}_<j>.{} (content: {})",
        bulk.dir_prefix, bulk.file_prefix, bulk.extension, content
    );
    let _ = writeln!(
        out,
        "Git: enabled={}, program={}, commit_message={:?}",
        config.git.enabled, config.git.program, config.git.commit_message
    );
    out
}
