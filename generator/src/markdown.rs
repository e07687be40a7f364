use std::{fs, path::Path, sync::LazyLock};

use anyhow::Context as _;
use comrak::nodes::{AstNode, NodeHeading, NodeValue};
use hypertext::Renderable as _;
use regex::{Captures, Regex};

use crate::{
    atomic_file, minify,
    pages::{self, Layout, TocEntry},
};

pub const HEADER_ID_PREFIX: &str = "heading-";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("markdown has no content")]
    Empty,
    #[error("markdown does not start with a header")]
    MissingHeading,
}

/// One markdown document split into the pieces the layout needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Plain text of the leading `# ` heading.
    pub title: String,
    pub heading_html: String,
    pub toc_html: String,
    pub body_html: String,
}

impl Page {
    /// The first line must be a level 1 heading. It is rendered on its own
    /// so it stays out of the table of contents.
    pub fn parse(input: &str) -> Result<Self, FormatError> {
        if input.trim().is_empty() {
            return Err(FormatError::Empty);
        }

        let (heading_md, body_md) = input.split_once('\n').unwrap_or((input, ""));

        // body anchors are numbered on their own, so the heading takes none
        let mut heading_options = options();
        heading_options.extension.header_ids = None;
        let options = options();
        let arena = comrak::Arena::new();

        let heading_root = comrak::parse_document(&arena, heading_md, &options);
        let title = heading_text(heading_root).ok_or(FormatError::MissingHeading)?;

        let body_root = comrak::parse_document(&arena, body_md, &options);
        let toc = toc_entries(body_root);
        let toc_html = pages::Toc { entries: &toc }.render().into_inner();

        let heading_html = comrak::markdown_to_html(heading_md, &heading_options);

        Ok(Self {
            title: text_fractions(&title),
            heading_html: html_fractions(&heading_html),
            toc_html,
            body_html: html_fractions(&comrak::markdown_to_html(body_md, &options)),
        })
    }
}

/// Render the markdown file at `src` into a minified page at `dst`.
pub fn convert(src: &Path, dst: &Path, layout: &Layout) -> anyhow::Result<()> {
    let input = fs::read_to_string(src)
        .with_context(|| format!("failed to read: {}", src.display()))?;

    let page = Page::parse(&input)?;
    let html = layout.render(&page);
    let html = minify::minify(minify::HTML, html.as_bytes())?;

    atomic_file::write_file(dst, &html)
        .with_context(|| format!("failed to write: {}", dst.display()))?;

    Ok(())
}

pub fn options() -> comrak::Options<'static> {
    let extension = comrak::ExtensionOptions::builder()
        .strikethrough(true)
        .table(true)
        .autolink(true)
        .footnotes(true)
        .header_ids(HEADER_ID_PREFIX.to_string())
        .build();
    // curly quotes, `--` and `---` dashes, ellipsis
    let parse = comrak::ParseOptions::builder().smart(true).build();
    let mut render = comrak::RenderOptions::builder().build();
    render.r#unsafe = true;

    comrak::Options {
        extension,
        parse,
        render,
    }
}

/// Plain text of `root` when it holds exactly one block, a level 1 heading.
fn heading_text<'a>(root: &'a AstNode<'a>) -> Option<String> {
    let mut blocks = root.children();
    let heading = blocks.next()?;
    if blocks.next().is_some() {
        return None;
    }

    if !matches!(
        heading.data.borrow().value,
        NodeValue::Heading(NodeHeading { level: 1, .. })
    ) {
        return None;
    }

    let mut text = String::new();
    collect_text(heading, &mut text);
    Some(text)
}

fn toc_entries<'a>(root: &'a AstNode<'a>) -> Vec<TocEntry> {
    // same anchors, in the same order, as the html renderer assigns them
    let mut anchorizer = comrak::Anchorizer::new();
    let mut entries = Vec::new();

    for node in root.descendants() {
        let level = match node.data.borrow().value {
            NodeValue::Heading(NodeHeading { level, .. }) => level,
            _ => continue,
        };

        let mut title = String::new();
        collect_text(node, &mut title);

        let anchor = anchorizer.anchorize(title.as_str().into());
        let anchor = format!("{HEADER_ID_PREFIX}{anchor}");

        let entry = TocEntry::new(level, anchor, text_fractions(&title));
        pages::push_entry(&mut entries, entry);
    }

    entries
}

fn collect_text<'a>(node: &'a AstNode<'a>, out: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => out.push_str(text),
        NodeValue::Code(code) => out.push_str(&code.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

static FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(1/4|1/2|3/4)\b").unwrap());

/// Elements whose text is left exactly as written.
const VERBATIM_TAGS: [&str; 4] = ["code", "pre", "script", "style"];

/// `1/2` -> `½` for standalone fractions; `1/2/2020` is left alone.
fn text_fractions(text: &str) -> String {
    FRACTION
        .replace_all(text, |caps: &Captures| {
            let m = caps.get(0).map_or(0..0, |m| m.range());
            let before = text[..m.start].chars().next_back();
            let after = text[m.end..].chars().next();
            if before == Some('/') || after == Some('/') {
                return caps[0].to_string();
            }

            match &caps[1] {
                "1/4" => "¼",
                "1/2" => "½",
                _ => "¾",
            }
            .to_string()
        })
        .into_owned()
}

/// [`text_fractions`] applied to the text of an html fragment, outside of
/// tags and verbatim elements.
fn html_fractions(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut verbatim_depth = 0usize;
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        let (text, tail) = rest.split_at(start);
        if verbatim_depth == 0 {
            out.push_str(&text_fractions(text));
        } else {
            out.push_str(text);
        }

        let end = tag_end(tail);
        let tag = &tail[..end];
        if let Some((name, closing)) = tag_name(tag) {
            if VERBATIM_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name)) {
                if closing {
                    verbatim_depth = verbatim_depth.saturating_sub(1);
                } else {
                    verbatim_depth += 1;
                }
            }
        }
        out.push_str(tag);

        rest = &tail[end..];
    }

    if verbatim_depth == 0 {
        out.push_str(&text_fractions(rest));
    } else {
        out.push_str(rest);
    }

    out
}

/// Length of the tag at the start of `tail`, up to the first `>` outside a
/// quoted attribute value.
fn tag_end(tail: &str) -> usize {
    let mut quote = None;
    for (i, c) in tail.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            (None, '>') => return i + 1,
            _ => {}
        }
    }
    tail.len()
}

/// `<pre class="x">` -> `("pre", false)`, `</pre>` -> `("pre", true)`
fn tag_name(tag: &str) -> Option<(&str, bool)> {
    let inner = tag.strip_prefix('<')?;
    let (inner, closing) = match inner.strip_prefix('/') {
        Some(inner) => (inner, true),
        None => (inner, false),
    };
    let len = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());

    (len > 0).then(|| (&inner[..len], closing))
}
