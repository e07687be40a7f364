use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context as _, ensure};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "site.yaml";
pub const README_FILE: &str = "README.md";
pub const NO_JEKYLL_FILE: &str = ".nojekyll";
pub const CNAME_FILE: &str = "CNAME";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Written to `CNAME` in the output directory.
    pub domain: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Short branch name the snapshot commit is stored under.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Stylesheet href added to every page.
    #[serde(default)]
    pub stylesheet: Option<String>,

    #[serde(default)]
    pub push_url: Option<String>,
    #[serde(default = "default_push_branch")]
    pub push_branch: String,
}

impl Config {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            output_dir: default_output_dir(),
            branch: default_branch(),
            stylesheet: None,
            push_url: None,
            push_branch: default_push_branch(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)
            .with_context(|| format!("failed to open config: {}", path.display()))?;
        let config: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.domain.trim().is_empty() && !self.domain.contains('\n'),
            "domain must be a single non-empty line"
        );
        // the output dir doubles as the tree prefix inside the snapshot commit
        ensure!(
            self.output_dir.components().next().is_some()
                && self
                    .output_dir
                    .components()
                    .all(|c| matches!(c, Component::Normal(_))),
            "output_dir must be a plain relative path: {}",
            self.output_dir.display()
        );
        ensure!(!self.branch.is_empty(), "branch must not be empty");
        Ok(())
    }

    /// `autogenerated` -> `refs/heads/autogenerated`
    pub fn branch_ref(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }
}

fn default_output_dir() -> PathBuf {
    "output".into()
}
fn default_branch() -> String {
    "autogenerated".into()
}
fn default_push_branch() -> String {
    "master".into()
}
