use std::{borrow::Cow, collections::HashMap, sync::LazyLock};

use anyhow::{Context as _, anyhow};
use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions, StyleSheet},
};
use quick_xml::events::{BytesStart, BytesText, Event};
use regex::Regex;

pub const CSS: &str = "text/css";
pub const HTML: &str = "text/html";
pub const JAVASCRIPT: &str = "text/javascript";
pub const SVG: &str = "image/svg+xml";

type MinifyFn = fn(&[u8]) -> anyhow::Result<Vec<u8>>;

struct Minifier {
    exact: HashMap<&'static str, MinifyFn>,
    patterns: Vec<(Regex, MinifyFn)>,
}

static MINIFIER: LazyLock<Minifier> = LazyLock::new(|| {
    let exact = HashMap::from([
        (CSS, css as MinifyFn),
        (HTML, html as MinifyFn),
        (JAVASCRIPT, javascript as MinifyFn),
        (SVG, xml as MinifyFn),
    ]);
    let patterns = vec![
        (Regex::new("[/+]json$").unwrap(), json as MinifyFn),
        (Regex::new("[/+]xml$").unwrap(), xml as MinifyFn),
    ];

    Minifier { exact, patterns }
});

impl Minifier {
    fn lookup(&self, content_type: &str) -> Option<MinifyFn> {
        self.exact.get(content_type).copied().or_else(|| {
            self.patterns
                .iter()
                .find(|(re, _)| re.is_match(content_type))
                .map(|(_, f)| *f)
        })
    }
}

/// Minify `input` according to its content type.
///
/// Errors if no minifier is registered for `content_type` or the input does
/// not parse as that type.
pub fn minify(content_type: &str, input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let f = MINIFIER
        .lookup(content_type)
        .ok_or_else(|| anyhow!("no minifier for content type: {content_type}"))?;

    f(input).with_context(|| format!("cannot minify {content_type}"))
}

fn html(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut cfg = minify_html::Cfg::new();
    cfg.minify_css = true;
    cfg.minify_js = true;

    Ok(minify_html::minify(input, &cfg))
}

fn css(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let code = std::str::from_utf8(input)?;

    let mut stylesheet = StyleSheet::parse(code, ParserOptions::default())
        .map_err(|e| anyhow!("failed to parse stylesheet: {e}"))?;

    stylesheet.minify(MinifyOptions::default())?;

    let res = stylesheet.to_css(PrinterOptions {
        minify: true,
        ..Default::default()
    })?;

    Ok(res.code.into_bytes())
}

fn javascript(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let session = minify_js::Session::new();
    let mut out = Vec::new();

    minify_js::minify(&session, minify_js::TopLevelMode::Global, input, &mut out)
        .map_err(|e| anyhow!("failed to parse javascript: {e:?}"))?;

    Ok(out)
}

fn json(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_slice(input)?;
    Ok(serde_json::to_vec(&value)?)
}

/// Re-serialise an XML document without comments, insignificant whitespace
/// or layout inside tags.
fn xml(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut reader = quick_xml::Reader::from_reader(input);

    let mut writer = quick_xml::Writer::new(Vec::with_capacity(input.len()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Comment(_) => {}
            Event::Start(e) => writer.write_event(Event::Start(compact_tag(&e)?))?,
            Event::Empty(e) => writer.write_event(Event::Empty(compact_tag(&e)?))?,
            Event::Text(e) => {
                // spaces around inline elements are significant
                if !e.iter().all(u8::is_ascii_whitespace) {
                    let text = collapse_whitespace(&e);
                    writer.write_event(Event::Text(BytesText::from_escaped(text)))?;
                }
            }
            Event::DocType(e) => {
                let doctype = String::from_utf8_lossy(&e);
                let doctype = collapse(doctype.trim());
                writer.write_event(Event::DocType(BytesText::from_escaped(doctype)))?;
            }
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn compact_tag<'a>(e: &'a BytesStart<'_>) -> anyhow::Result<BytesStart<'a>> {
    let name = e.name();
    let name = std::str::from_utf8(name.as_ref())?.to_string();

    let mut tag = BytesStart::new(name);
    for attr in e.attributes() {
        let mut attr = attr?;
        // written back double quoted
        if attr.value.contains(&b'"') {
            let value = String::from_utf8_lossy(&attr.value).replace('"', "&quot;");
            attr.value = Cow::Owned(value.into_bytes());
        }
        tag.push_attribute(attr);
    }

    Ok(tag)
}

fn collapse_whitespace(text: &BytesText<'_>) -> String {
    collapse(&String::from_utf8_lossy(text)).into_owned()
}

fn collapse(text: &str) -> Cow<'_, str> {
    if !text.contains(|c: char| c.is_ascii_whitespace() && c != ' ') && !text.contains("  ") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    Cow::Owned(out)
}
