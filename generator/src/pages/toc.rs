use hypertext::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub anchor: String,
    pub title: String,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(level: u8, anchor: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            level,
            anchor: anchor.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }
}

/// Append `entry` under the deepest trailing entry with a lower level.
pub fn push_entry(entries: &mut Vec<TocEntry>, entry: TocEntry) {
    match entries.last_mut() {
        Some(last) if entry.level > last.level => push_entry(&mut last.children, entry),
        _ => entries.push(entry),
    }
}

/// Table of contents. Renders nothing for a page without headings.
pub struct Toc<'a> {
    pub entries: &'a [TocEntry],
}

struct TocList<'a> {
    entries: &'a [TocEntry],
}

impl Renderable for Toc<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        if self.entries.is_empty() {
            return;
        }

        let list = TocList {
            entries: self.entries,
        };

        rsx! {
            <nav class="toc">
                (list)
            </nav>
        }
        .render_to(buffer);
    }
}

impl Renderable for TocList<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <ul>
                @for entry in self.entries {
                    <li>
                        <a href=(format!("#{}", entry.anchor))>(entry.title)</a>
                        @if !entry.children.is_empty() {
                            (TocList { entries: &entry.children })
                        }
                    </li>
                }
            </ul>
        }
        .render_to(buffer);
    }
}
