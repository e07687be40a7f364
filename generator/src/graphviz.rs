use std::{fs, path::Path};

use anyhow::Context as _;

use crate::{
    atomic_file,
    command::{Cmd, CommandRunner},
    minify,
};

pub const DOT_PROGRAM: &str = "dot";

/// Lay out the graph in `src` with `dot` and write the minified svg to `dst`.
pub fn convert(runner: &dyn CommandRunner, src: &Path, dst: &Path) -> anyhow::Result<()> {
    let input = fs::read(src).with_context(|| format!("failed to read: {}", src.display()))?;

    let svg = runner
        .run(&Cmd::new(DOT_PROGRAM).arg("-Tsvg").stdin(input))
        .context("error running dot")?;
    let svg = minify::minify(minify::SVG, &svg)?;

    atomic_file::write_file(dst, &svg)
        .with_context(|| format!("failed to write: {}", dst.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct FakeDot {
        calls: RefCell<Vec<Cmd>>,
        output: anyhow::Result<&'static str>,
    }

    impl CommandRunner for FakeDot {
        fn run(&self, cmd: &Cmd) -> anyhow::Result<Vec<u8>> {
            self.calls.borrow_mut().push(cmd.clone());
            match &self.output {
                Ok(svg) => Ok(svg.as_bytes().to_vec()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    #[test]
    fn pipes_source_through_dot() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("graph.dot");
        let dst = dir.path().join("out/graph.svg");
        fs::write(&src, "digraph { a -> b }\n").unwrap();

        let dot = FakeDot {
            calls: RefCell::new(Vec::new()),
            output: Ok("<svg width=\"10pt\"\n height=\"10pt\">\n  <g>\n  </g>\n</svg>\n"),
        };
        convert(&dot, &src, &dst).unwrap();

        let calls = dot.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, DOT_PROGRAM);
        assert_eq!(calls[0].args, ["-Tsvg"]);
        assert_eq!(calls[0].stdin.as_deref(), Some(&b"digraph { a -> b }\n"[..]));

        assert_eq!(
            fs::read_to_string(&dst).unwrap(),
            "<svg width=\"10pt\" height=\"10pt\"><g></g></svg>"
        );
    }

    #[test]
    fn dot_failure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("graph.dot");
        let dst = dir.path().join("graph.svg");
        fs::write(&src, "digraph {").unwrap();

        let dot = FakeDot {
            calls: RefCell::new(Vec::new()),
            output: Err(anyhow::anyhow!("`dot -Tsvg` failed: exit status: 1")),
        };
        let err = convert(&dot, &src, &dst).unwrap_err();

        assert_eq!(err.to_string(), "error running dot");
        assert!(!dst.exists());
    }
}
