use std::path::Path;

/// The conversions the walker knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builder {
    Markdown,
    GraphvizDot,
}

/// Source file extension -> builder.
pub const BUILDERS: phf::Map<&'static str, Builder> = phf::phf_map! {
    "md" => Builder::Markdown,
    "dot" => Builder::GraphvizDot,
};

impl Builder {
    pub fn for_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        BUILDERS.get(ext).copied()
    }

    pub fn output_extension(self) -> &'static str {
        match self {
            Self::Markdown => "html",
            Self::GraphvizDot => "svg",
        }
    }

    /// `notes.md` -> `notes.html`, `dir/graph.dot` -> `dir/graph.svg`
    pub fn output_path(self, rel_path: impl AsRef<Path>) -> std::path::PathBuf {
        rel_path.as_ref().with_extension(self.output_extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(Builder::for_path("notes.md"), Some(Builder::Markdown));
        assert_eq!(Builder::for_path("a/b/graph.dot"), Some(Builder::GraphvizDot));
        assert_eq!(Builder::for_path("notes.MD"), None);
        assert_eq!(Builder::for_path("style.css"), None);
        assert_eq!(Builder::for_path("Makefile"), None);
        assert_eq!(Builder::for_path("archive.md.bak"), None);
    }

    #[test]
    fn output_path() {
        assert_eq!(
            Builder::Markdown.output_path("docs/notes.md"),
            Path::new("docs/notes.html")
        );
        assert_eq!(
            Builder::GraphvizDot.output_path("v1.2/graph.dot"),
            Path::new("v1.2/graph.svg")
        );
    }
}
