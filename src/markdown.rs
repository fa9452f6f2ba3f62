//! Markdown rendering for backend-supplied suggestions and contact lists.
//!
//! Two outputs share one pulldown-cmark event stream: sanitized HTML (the
//! portable form of the rendered panel) and flattened styled lines that the
//! egui view draws directly.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

fn options() -> Options {
    Options::ENABLE_STRIKETHROUGH
}

/// Renders markdown to HTML with raw HTML escaped and unsafe link targets
/// replaced by `#`.
pub fn to_safe_html(markdown: &str) -> String {
    let events = Parser::new_ext(markdown, options()).map(sanitize_event);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    if is_safe_destination(&dest) {
        dest
    } else {
        CowStr::Borrowed("#")
    }
}

fn is_safe_destination(dest: &str) -> bool {
    let trimmed = dest.trim();
    let scheme_end = trimmed.find(|ch: char| matches!(ch, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(index) if trimmed[index..].starts_with(':') => {
            let scheme = trimmed[..index].to_ascii_lowercase();
            SAFE_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Heading(u8),
    Paragraph,
    ListItem { depth: usize, ordinal: Option<u64> },
    Code,
    Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownLine {
    pub kind: LineKind,
    pub spans: Vec<Span>,
}

impl MarkdownLine {
    fn new(kind: LineKind) -> Self {
        Self {
            kind,
            spans: Vec::new(),
        }
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<MarkdownLine>,
    current: Option<MarkdownLine>,
    lists: Vec<Option<u64>>,
    bold: usize,
    italic: usize,
}

impl LineBuilder {
    fn flush(&mut self) {
        if let Some(line) = self.current.take() {
            if !line.spans.is_empty() || line.kind == LineKind::Rule {
                self.lines.push(line);
            }
        }
    }

    fn open(&mut self, kind: LineKind) {
        self.flush();
        self.current = Some(MarkdownLine::new(kind));
    }

    fn push_text(&mut self, text: &str, code: bool) {
        let bold = self.bold > 0;
        let italic = self.italic > 0;
        let line = self
            .current
            .get_or_insert_with(|| MarkdownLine::new(LineKind::Paragraph));

        if let Some(last) = line.spans.last_mut() {
            if last.bold == bold && last.italic == italic && last.code == code {
                last.text.push_str(text);
                return;
            }
        }
        line.spans.push(Span {
            text: text.to_string(),
            bold,
            italic,
            code,
        });
    }

    fn next_ordinal(&mut self) -> Option<u64> {
        let slot = self.lists.last_mut()?;
        let ordinal = *slot;
        if let Some(number) = slot.as_mut() {
            *number += 1;
        }
        ordinal
    }
}

/// Flattens markdown into styled lines for immediate-mode drawing.
pub fn to_lines(markdown: &str) -> Vec<MarkdownLine> {
    let mut builder = LineBuilder::default();

    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Paragraph => {
                    let continues_item = matches!(
                        &builder.current,
                        Some(MarkdownLine {
                            kind: LineKind::ListItem { .. },
                            spans,
                        }) if spans.is_empty()
                    );
                    if !continues_item {
                        builder.open(LineKind::Paragraph);
                    }
                }
                Tag::Heading { level, .. } => builder.open(LineKind::Heading(level as u8)),
                Tag::List(start) => {
                    builder.flush();
                    builder.lists.push(start);
                }
                Tag::Item => {
                    let depth = builder.lists.len().saturating_sub(1);
                    let ordinal = builder.next_ordinal();
                    builder.open(LineKind::ListItem { depth, ordinal });
                }
                Tag::CodeBlock(_) => builder.open(LineKind::Code),
                Tag::HtmlBlock => builder.open(LineKind::Paragraph),
                Tag::Strong => builder.bold += 1,
                Tag::Emphasis => builder.italic += 1,
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::HtmlBlock => builder.flush(),
                TagEnd::List(_) => {
                    builder.flush();
                    builder.lists.pop();
                }
                TagEnd::Strong => builder.bold = builder.bold.saturating_sub(1),
                TagEnd::Emphasis => builder.italic = builder.italic.saturating_sub(1),
                _ => {}
            },
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                let code = matches!(
                    builder.current.as_ref().map(|line| &line.kind),
                    Some(LineKind::Code)
                );
                builder.push_text(&text, code);
            }
            Event::Code(text) => builder.push_text(&text, true),
            Event::SoftBreak => builder.push_text(" ", false),
            Event::HardBreak => builder.push_text("\n", false),
            Event::Rule => {
                builder.open(LineKind::Rule);
                builder.flush();
            }
            _ => {}
        }
    }

    builder.flush();
    builder.lines
}
