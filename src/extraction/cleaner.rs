//! DOM cleanup, main-content selection and text rendering.
//!
//! Everything here is synchronous and works on markup already loaded by a
//! render session. The parsed document never crosses an await point.

use crate::extraction::types::ExtractedDocument;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Elements removed wholesale before text is taken
static BOILERPLATE_TAGS: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector("nav, header, footer, aside, script, style, noscript, iframe, form, template, svg")
});

/// Elements that are never removed by the cleanup pass
static PROTECTED: LazyLock<Selector> =
    LazyLock::new(|| parse_selector("html, body, main, article, [role=main]"));

static ANY_ELEMENT: LazyLock<Selector> = LazyLock::new(|| parse_selector("*"));

/// Title sources, in order
static TITLE_SOURCES: LazyLock<[Selector; 2]> =
    LazyLock::new(|| ["title", "h1, h2, h3, h4, h5, h6"].map(parse_selector));

/// Main-content roots, most specific first
static ROOT_CANDIDATES: LazyLock<[Selector; 4]> =
    LazyLock::new(|| ["main", "article", "[role=main]", "body"].map(parse_selector));

/// Attributes checked against [`RE_BOILERPLATE_ATTR`]
const PATTERN_ATTRIBUTES: [&str; 4] = ["id", "class", "role", "aria-label"];

static RE_BOILERPLATE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^a-z0-9])(?:ads?|advert\w*|banners?|sponsor\w*|promo\w*|cookie\w*|popups?|newsletter|navigation|contentinfo)(?:$|[^a-z0-9])",
    )
    .unwrap()
});

static RE_BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Elements whose content is never rendered
const SKIPPED_TAGS: [&str; 10] = [
    "head", "title", "script", "style", "noscript", "template", "meta", "link", "iframe", "svg",
];

const BLOCK_TAGS: [&str; 28] = [
    "address", "article", "aside", "blockquote", "caption", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "header", "hgroup", "hr",
    "li", "main", "nav", "ol", "pre", "section", "summary", "table", "ul",
];

const PARAGRAPH_TAGS: [&str; 7] = ["p", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Turn loaded markup into a title and clean text.
pub fn extract_document(html: &str) -> ExtractedDocument {
    let mut document = Html::parse_document(html);

    remove_boilerplate(&mut document);

    let title = resolve_title(&document);
    let text = render_text(select_content_root(&document));

    ExtractedDocument { title, text }
}

/// Detach boilerplate elements from the tree, returning how many were removed.
pub fn remove_boilerplate(document: &mut Html) -> usize {
    let doomed: Vec<_> = document
        .select(&ANY_ELEMENT)
        .filter(|element| BOILERPLATE_TAGS.matches(element) || matches_boilerplate_pattern(element))
        .filter(|element| !PROTECTED.matches(element) && element.select(&PROTECTED).next().is_none())
        .map(|element| element.id())
        .collect();

    for id in &doomed {
        if let Some(mut node) = document.tree.get_mut(*id) {
            node.detach();
        }
    }
    doomed.len()
}

fn matches_boilerplate_pattern(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    PATTERN_ATTRIBUTES
        .iter()
        .filter_map(|name| value.attr(name))
        .any(|attr| RE_BOILERPLATE_ATTR.is_match(attr))
}

/// Document title, else the first heading, else empty.
pub fn resolve_title(document: &Html) -> String {
    TITLE_SOURCES
        .iter()
        .find_map(|selector| {
            document
                .select(selector)
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
                .find(|text| !text.is_empty())
        })
        .unwrap_or_default()
}

/// Pick the main-content root: main, article, ARIA main, body, then the root element.
pub fn select_content_root(document: &Html) -> ElementRef<'_> {
    ROOT_CANDIDATES
        .iter()
        .find_map(|selector| document.select(selector).next())
        .unwrap_or_else(|| document.root_element())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render visible text the way a browser lays it out.
pub fn render_text(root: ElementRef<'_>) -> String {
    let mut buffer = TextBuffer::default();
    buffer.render_children(root);

    let joined = buffer
        .out
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    RE_BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string()
}

#[derive(Default)]
struct TextBuffer {
    out: String,
    pending_space: bool,
    preformatted: usize,
}

impl TextBuffer {
    fn render_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.render_element(child);
                    }
                }
                _ => {}
            }
        }
    }

    fn render_element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if SKIPPED_TAGS.contains(&name) || is_hidden(&element) {
            return;
        }

        match name {
            "br" => {
                self.out.push('\n');
                self.pending_space = false;
            }
            "td" | "th" => {
                if !self.out.is_empty() && !self.out.ends_with('\n') {
                    self.out.push('\t');
                }
                self.pending_space = false;
                self.render_children(element);
            }
            "tr" => {
                self.line_break();
                self.render_children(element);
                self.line_break();
            }
            "pre" => {
                self.line_break();
                self.preformatted += 1;
                self.render_children(element);
                self.preformatted -= 1;
                self.line_break();
            }
            _ if PARAGRAPH_TAGS.contains(&name) => {
                self.blank_line();
                self.render_children(element);
                self.blank_line();
            }
            _ if BLOCK_TAGS.contains(&name) => {
                self.line_break();
                self.render_children(element);
                self.line_break();
            }
            _ => self.render_children(element),
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.preformatted > 0 {
            self.out.push_str(text);
            self.pending_space = false;
            return;
        }

        for c in text.chars() {
            if c.is_whitespace() {
                self.pending_space = !self.out.is_empty() && !self.out.ends_with(['\n', '\t']);
            } else {
                if self.pending_space {
                    self.out.push(' ');
                    self.pending_space = false;
                }
                self.out.push(c);
            }
        }
    }

    fn line_break(&mut self) {
        self.pending_space = false;
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn blank_line(&mut self) {
        self.line_break();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }
}

fn is_hidden(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() || value.attr("aria-hidden") == Some("true") {
        return true;
    }
    value.attr("style").is_some_and(|style| {
        let style: String = style.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}
