use hypertext::{Raw, prelude::*};

use crate::markdown::Page;

/// Site-wide parts of every page, fixed before the walk starts.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub stylesheet: Option<String>,
}

impl Layout {
    pub fn render(&self, page: &Page) -> String {
        Base {
            head: Head {
                title: &page.title,
                stylesheet: self.stylesheet.as_deref(),
            },
            heading_html: &page.heading_html,
            toc_html: &page.toc_html,
            content_html: &page.body_html,
        }
        .render()
        .into_inner()
    }
}

#[derive(Clone)]
struct Base<'a> {
    head: Head<'a>,
    heading_html: &'a str,
    toc_html: &'a str,
    content_html: &'a str,
}

#[derive(Clone)]
struct Head<'a> {
    title: &'a str,
    stylesheet: Option<&'a str>,
}

impl Renderable for Base<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <!DOCTYPE html>
            <html>
                (self.head)

                <body>
                    <header>
                        (Raw::dangerously_create(&self.heading_html))
                    </header>
                    (Raw::dangerously_create(&self.toc_html))
                    <main>
                        <article>
                            (Raw::dangerously_create(&self.content_html))
                        </article>
                    </main>
                </body>
            </html>
        }
        .render_to(buffer);
    }
}

impl Renderable for Head<'_> {
    fn render_to(&self, buffer: &mut hypertext::Buffer<hypertext::context::Node>) {
        rsx! {
            <head>
                <meta charset="UTF-8">
                <meta name="viewport" content="width=device-width, initial-scale=1">

                <title>(self.title)</title>

                @if let Some(stylesheet) = self.stylesheet {
                    <link rel="stylesheet" href=(stylesheet)>
                }
            </head>
        }
        .render_to(buffer);
    }
}
