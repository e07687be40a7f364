use std::path::PathBuf;

pub mod atomic_file;
pub mod builders;
pub mod command;
pub mod config;
pub mod generator;
pub mod git_repo;
pub mod graphviz;
pub mod markdown;
pub mod minify;
pub mod pages;

pub use crate::{command::SystemRunner, config::Config, generator::Generator};

/// Build the site rooted at `src_dir` using `site.yaml` found there.
pub fn build(src_dir: impl Into<PathBuf>) -> anyhow::Result<()> {
    let src_dir = src_dir.into();

    let config_file = src_dir.join(config::CONFIG_FILE);
    log::info!("read config from: {}", config_file.display());
    let config = Config::from_file(&config_file)?;

    let generator = Generator::new(src_dir, config, &SystemRunner);
    generator.build()?;

    Ok(())
}
