use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    atomic_file,
    builders::Builder,
    command::CommandRunner,
    config::{self, Config},
    git_repo::GitSnapshot,
    graphviz, markdown,
    pages::Layout,
};

pub struct Generator<'a> {
    src_dir: PathBuf,
    dst_dir: PathBuf,
    config: Config,
    layout: Layout,
    runner: &'a dyn CommandRunner,
}

impl<'a> Generator<'a> {
    pub fn new(
        src_dir: impl Into<PathBuf>,
        config: Config,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        let src_dir = src_dir.into();
        let dst_dir = src_dir.join(&config.output_dir);
        let layout = Layout {
            stylesheet: config.stylesheet.clone(),
        };

        Self {
            src_dir,
            dst_dir,
            config,
            layout,
            runner,
        }
    }

    pub fn dst_dir(&self) -> &Path {
        &self.dst_dir
    }

    /// Render the site, then commit the output to the configured branch.
    pub fn build(&self) -> anyhow::Result<()> {
        self.render()?;

        let snapshot = GitSnapshot::discover(self.runner, &self.src_dir)?;
        let branch_ref = self.config.branch_ref();
        log::info!("commit {} to {}", self.config.output_dir.display(), branch_ref);
        let commit = snapshot
            .write(&self.config.output_dir, &branch_ref)
            .context("failed to commit output to git")?;

        let branch = &self.config.branch;
        log::info!("prepared {commit}");
        log::info!("to see diff run\n\n  git diff {branch}@{{0}} {branch}\n");
        if let Some(push_url) = &self.config.push_url {
            log::info!(
                "to push run\n\n  git push {push_url} +{branch}:refs/heads/{}\n",
                self.config.push_branch
            );
        }

        Ok(())
    }

    /// Convert the source tree into the output dir and add the files the
    /// static host expects.
    pub fn render(&self) -> anyhow::Result<()> {
        log::info!("create dest dir: {}", self.dst_dir.display());
        fs::create_dir_all(&self.dst_dir)
            .with_context(|| format!("failed to create: {}", self.dst_dir.display()))?;

        self.iter_dir()?;

        log::info!("write {} and {}", config::NO_JEKYLL_FILE, config::CNAME_FILE);
        atomic_file::write_file(self.dst_dir.join(config::NO_JEKYLL_FILE), b"")?;
        atomic_file::write_file(
            self.dst_dir.join(config::CNAME_FILE),
            format!("{}\n", self.config.domain).as_bytes(),
        )?;

        Ok(())
    }

    fn iter_dir(&self) -> anyhow::Result<()> {
        let dst_dir = self.dst_dir.clone();
        let walker = ignore::WalkBuilder::new(&self.src_dir)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            // the root itself is never passed to the filter
            .filter_entry(move |entry| {
                entry.path() != dst_dir.as_path()
                    && !entry.file_name().as_encoded_bytes().starts_with(b".")
            })
            .build();

        for entry in walker {
            let entry = entry?;

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if entry.file_name() == config::README_FILE {
                continue;
            }
            let Some(builder) = Builder::for_path(entry.path()) else {
                continue;
            };

            self.handle_file(builder, entry.path())
                .with_context(|| format!("build failed: {}", entry.path().display()))?;
        }

        Ok(())
    }

    fn handle_file(&self, builder: Builder, src_path: &Path) -> anyhow::Result<()> {
        let rel_path = src_path.strip_prefix(&self.src_dir)?;
        let dst_path = self.dst_dir.join(builder.output_path(rel_path));

        log::info!("source {}", rel_path.display());

        match builder {
            Builder::Markdown => markdown::convert(src_path, &dst_path, &self.layout),
            Builder::GraphvizDot => graphviz::convert(self.runner, src_path, &dst_path),
        }
    }
}
