use std::{cell::RefCell, fs, path::Path};

use site_builder::command::{Cmd, CommandRunner};

pub const SVG: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!-- Generated by graphviz -->
<svg width="62pt" height="44pt"
 viewBox="0.00 0.00 62.00 44.00" xmlns="http://www.w3.org/2000/svg">
<g id="graph0" class="graph">
<title>G</title>
</g>
</svg>
"#;

pub const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

/// Stands in for `dot` and the git plumbing commands.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: RefCell<Vec<Cmd>>,
}

impl FakeRunner {
    pub fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| {
                let mut line = c.program.to_string_lossy().into_owned();
                if let Some(sub) = c.args.first().filter(|_| c.program == "git") {
                    line.push(' ');
                    line.push_str(&sub.to_string_lossy());
                }
                line
            })
            .collect()
    }

    pub fn call(&self, program: &str, subcommand: &str) -> Option<Cmd> {
        self.calls
            .borrow()
            .iter()
            .find(|c| c.program == program && c.args.first().is_some_and(|a| a == subcommand))
            .cloned()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, cmd: &Cmd) -> anyhow::Result<Vec<u8>> {
        self.calls.borrow_mut().push(cmd.clone());

        if cmd.program == "dot" {
            let input = cmd.stdin.as_deref().unwrap_or_default();
            if !input.starts_with(b"digraph") {
                anyhow::bail!("`dot -Tsvg` failed: exit status: 1");
            }
            return Ok(SVG.as_bytes().to_vec());
        }

        let subcommand = cmd.args.first().and_then(|a| a.to_str()).unwrap_or_default();
        match subcommand {
            "describe" => Ok(b"v0.1.0-dirty\n".to_vec()),
            "update-index" => Ok(Vec::new()),
            "write-tree" => Ok(b"4b825dc642cb6eb9a060e54bf8d69288fbee4904\n".to_vec()),
            "commit-tree" => Ok(format!("{COMMIT}\n").into_bytes()),
            "update-ref" => Ok(Vec::new()),
            other => anyhow::bail!("unexpected command: {other}"),
        }
    }
}

pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// A repository at `root` with one empty commit and a local identity.
pub fn init_repository(root: &Path) -> git2::Repository {
    let repo = git2::Repository::init(root).unwrap();

    let mut config = git2::Config::open(&root.join(".git/config")).unwrap();
    config.set_str("user.name", "Site Builder").unwrap();
    config.set_str("user.email", "builder@example.org").unwrap();
    config.set_bool("commit.gpgsign", false).unwrap();

    let sig = git2::Signature::now("Site Builder", "builder@example.org").unwrap();
    let tree_id = repo.index().unwrap().write_tree().unwrap();
    {
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[]).unwrap();
    }

    repo
}

/// Entry names of the tree `branch_ref` points at; the commit must be
/// parentless.
pub fn snapshot_entries(repo: &git2::Repository, branch_ref: &str) -> Vec<String> {
    let commit = repo
        .find_reference(branch_ref)
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(commit.parent_count(), 0);
    assert!(commit.message().unwrap().starts_with("Regenerated site from "));

    commit
        .tree()
        .unwrap()
        .iter()
        .map(|e| e.name().unwrap().to_string())
        .collect()
}

pub fn write(root: &Path, rel_path: &str, content: &str) {
    let path = root.join(rel_path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// All files under `dir`, relative, sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    fn visit(base: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                visit(base, &path, out);
            } else {
                out.push(path.strip_prefix(base).unwrap().to_string_lossy().into_owned());
            }
        }
    }

    let mut out = Vec::new();
    visit(dir, dir, &mut out);
    out.sort();
    out
}
