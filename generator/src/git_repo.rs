//! Commits the output directory to a branch with git plumbing, using a
//! scratch index so the repository's own index and worktree stay untouched.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::command::{self, Cmd, CommandRunner};

const GIT: &str = "git";
const INDEX_FILE_NAME: &str = "index.build";
const REFLOG_MESSAGE: &str = "Build";

pub struct GitSnapshot<'a> {
    runner: &'a dyn CommandRunner,
    work_dir: PathBuf,
    git_dir: PathBuf,
    /// `work_dir` relative to the repository root.
    prefix: PathBuf,
}

impl<'a> GitSnapshot<'a> {
    /// Find the repository containing `work_dir`.
    pub fn discover(
        runner: &'a dyn CommandRunner,
        work_dir: impl Into<PathBuf>,
    ) -> anyhow::Result<Self> {
        let work_dir = work_dir.into();

        log::info!("open git repo: {}", work_dir.display());
        let repo = git2::Repository::discover(&work_dir)
            .with_context(|| format!("not a git repository: {}", work_dir.display()))?;

        let root = repo
            .workdir()
            .with_context(|| format!("bare repository: {}", repo.path().display()))?;
        let prefix = fs::canonicalize(&work_dir)?
            .strip_prefix(fs::canonicalize(root)?)
            .with_context(|| format!("outside of repository: {}", work_dir.display()))?
            .to_path_buf();

        let mut snapshot = Self::new(runner, work_dir, repo.path());
        snapshot.prefix = prefix;
        Ok(snapshot)
    }

    pub fn new(
        runner: &'a dyn CommandRunner,
        work_dir: impl Into<PathBuf>,
        git_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            work_dir: work_dir.into(),
            git_dir: git_dir.into(),
            prefix: PathBuf::new(),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.git_dir.join(INDEX_FILE_NAME)
    }

    /// Commit every file under `output_dir` (relative to the work dir) as a
    /// parentless commit and point `branch_ref` at it. Returns the commit id.
    pub fn write(&self, output_dir: &Path, branch_ref: &str) -> anyhow::Result<String> {
        let index = ScratchIndex::create(self.index_path())?;

        let desc = self.describe()?;
        self.add_files(&index, output_dir)?;
        let tree = self.write_tree(&index, output_dir)?;
        let commit = self.commit_tree(&tree, &format!("Regenerated site from {desc}\n"))?;
        self.update_ref(branch_ref, &commit)?;

        Ok(commit)
    }

    fn git(&self) -> Cmd {
        Cmd::new(GIT).current_dir(&self.work_dir)
    }

    fn git_with_index(&self, index: &ScratchIndex) -> Cmd {
        self.git().env("GIT_INDEX_FILE", &index.path)
    }

    fn one_line(&self, cmd: &Cmd) -> anyhow::Result<String> {
        let output = self.runner.run(cmd)?;
        let line =
            command::one_line(&output).with_context(|| format!("cannot parse `{cmd}` output"))?;
        Ok(line)
    }

    fn describe(&self) -> anyhow::Result<String> {
        self.one_line(&self.git().args(["describe", "--always", "--dirty"]))
    }

    fn add_files(&self, index: &ScratchIndex, output_dir: &Path) -> anyhow::Result<()> {
        let mut paths = Vec::new();
        for path in self.output_files(output_dir)? {
            paths.extend_from_slice(path.as_os_str().as_encoded_bytes());
            paths.push(0);
        }

        let cmd = self
            .git_with_index(index)
            .args(["update-index", "--add", "-z", "--verbose", "--stdin"])
            .stdin(paths);
        let output = self.runner.run(&cmd)?;

        for line in String::from_utf8_lossy(&output).lines() {
            log::debug!("{line}");
        }

        Ok(())
    }

    /// Regular files under `output_dir`, relative to the work dir, in
    /// lexical order. Hidden files are included.
    fn output_files(&self, output_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let walker = ignore::WalkBuilder::new(self.work_dir.join(output_dir))
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let rel_path = entry
                .path()
                .strip_prefix(&self.work_dir)
                .with_context(|| format!("outside of work dir: {}", entry.path().display()))?;
            files.push(rel_path.to_path_buf());
        }

        Ok(files)
    }

    /// Paths given to `update-index` resolve against the work dir, but the
    /// tree prefix is relative to the repository root.
    fn write_tree(&self, index: &ScratchIndex, output_dir: &Path) -> anyhow::Result<String> {
        let prefix = format!("--prefix={}/", self.prefix.join(output_dir).display());
        self.one_line(&self.git_with_index(index).args(["write-tree".into(), prefix]))
    }

    fn commit_tree(&self, tree: &str, message: &str) -> anyhow::Result<String> {
        self.one_line(&self.git().args(["commit-tree", "-m", message, tree]))
    }

    fn update_ref(&self, branch_ref: &str, commit: &str) -> anyhow::Result<()> {
        self.runner.run(
            &self
                .git()
                .args(["update-ref", "-m", REFLOG_MESSAGE, branch_ref, commit]),
        )?;
        Ok(())
    }
}

/// The scratch index file. Git must create it itself, so any leftover from
/// an earlier crashed run is removed up front; it is removed again on drop.
struct ScratchIndex {
    path: PathBuf,
}

impl ScratchIndex {
    fn create(path: PathBuf) -> anyhow::Result<Self> {
        match fs::remove_file(&path) {
            Ok(()) => log::warn!("removed stale index: {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("failed to remove: {}", path.display()));
            }
        }
        Ok(Self { path })
    }
}

impl Drop for ScratchIndex {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
