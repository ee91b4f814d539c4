//! Markdown → ratatui `Text` renderer.
//!
//! Converts `pulldown_cmark` events into styled `Line`/`Span` values:
//! headings, bold/italic/strikethrough, inline code, fenced code blocks
//! (syntect-highlighted when the language is known), lists, blockquotes,
//! and links. Treated as a black-box formatting collaborator by the
//! message renderer.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";

/// Parse markdown into styled `Text` with `base_fg` as the body color.
///
/// Returns owned text (`'static`) so built blocks can be cached.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let mut sink = Sink::new(base_fg);
    for event in Parser::new_ext(content, opts) {
        sink.event(event);
    }
    sink.out
}

struct Sink {
    out: Text<'static>,
    base_fg: Color,
    /// Inline style stack; entries compose via `patch` so nested
    /// bold-inside-italic works.
    inline: Vec<Style>,
    /// Prefix spans prepended to every new line (blockquote bars, code gutter).
    prefixes: Vec<Span<'static>>,
    /// List nesting: None = bullet, Some(n) = next ordered index.
    lists: Vec<Option<u64>>,
    highlighter: Option<HighlightLines<'static>>,
    in_code_block: bool,
    pending_link: Option<String>,
    /// Separate the next block from the previous one with a blank line.
    want_gap: bool,
}

impl Sink {
    fn new(base_fg: Color) -> Self {
        Self {
            out: Text::default(),
            base_fg,
            inline: Vec::new(),
            prefixes: Vec::new(),
            lists: Vec::new(),
            highlighter: None,
            in_code_block: false,
            pending_link: None,
            want_gap: false,
        }
    }

    fn style(&self) -> Style {
        self.inline
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_inline(&mut self, overlay: Style) {
        self.inline.push(self.style().patch(overlay));
    }

    fn open_line(&mut self) {
        let mut line = Line::default();
        for prefix in &self.prefixes {
            line.spans.push(prefix.clone());
        }
        self.out.lines.push(line);
    }

    fn append(&mut self, span: Span<'static>) {
        if self.out.lines.is_empty() {
            self.open_line();
        }
        if let Some(line) = self.out.lines.last_mut() {
            line.push_span(span);
        }
    }

    fn gap(&mut self) {
        if self.want_gap && !self.out.lines.is_empty() {
            self.out.lines.push(Line::default());
        }
        self.want_gap = false;
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => {
                let style = Style::default().fg(Color::White).bg(Color::DarkGray);
                self.append(Span::styled(c.to_string(), style));
            }
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.open_line(),
            Event::Rule => {
                self.gap();
                self.open_line();
                self.append(Span::styled(
                    "─".repeat(30),
                    Style::default().fg(Color::DarkGray),
                ));
                self.want_gap = true;
            }
            _ => {} // HTML, footnotes, math, task markers — skip
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.gap();
                self.open_line();
            }
            Tag::Heading { level, .. } => {
                self.gap();
                self.open_line();
                let style = heading_style(self.base_fg, level);
                let marks = "#".repeat(heading_rank(level));
                self.append(Span::styled(format!("{marks} "), style));
                self.push_inline(style);
            }
            Tag::BlockQuote(_) => {
                self.gap();
                self.prefixes
                    .push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
                self.push_inline(
                    Style::default()
                        .fg(self.base_fg)
                        .add_modifier(Modifier::ITALIC | Modifier::DIM),
                );
            }
            Tag::CodeBlock(kind) => {
                self.gap();
                let lang = match &kind {
                    CodeBlockKind::Fenced(l) => l.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                let fence_style = Style::default().fg(Color::DarkGray);
                self.open_line();
                self.append(Span::styled(format!("```{lang}"), fence_style));

                self.in_code_block = true;
                if !lang.is_empty()
                    && let Some(syntax) = SYNTAX_SET.find_syntax_by_token(&lang)
                {
                    let theme = &THEME_SET.themes[CODE_THEME];
                    self.highlighter = Some(HighlightLines::new(syntax, theme));
                }
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.gap();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.open_line();
                let depth = self.lists.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{indent}{n}. ");
                        *n += 1;
                        m
                    }
                    _ => format!("{indent}- "),
                };
                self.append(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::Emphasis => self.push_inline(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_inline(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_inline(Style::default().add_modifier(Modifier::CROSSED_OUT));
            }
            Tag::Link { dest_url, .. } => {
                self.pending_link = Some(dest_url.to_string());
                self.push_inline(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {} // Tables, images, definitions — skip
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.want_gap = true,
            TagEnd::Heading(_) => {
                self.inline.pop();
                self.want_gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.prefixes.pop();
                self.inline.pop();
                self.want_gap = true;
            }
            TagEnd::CodeBlock => {
                self.highlighter = None;
                self.in_code_block = false;
                self.open_line();
                self.append(Span::styled("```", Style::default().fg(Color::DarkGray)));
                self.want_gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.want_gap = true;
            }
            TagEnd::Item => {}
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.inline.pop();
            }
            TagEnd::Link => {
                self.inline.pop();
                if let Some(url) = self.pending_link.take() {
                    self.append(Span::raw(" ("));
                    self.append(Span::styled(
                        url,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::UNDERLINED),
                    ));
                    self.append(Span::raw(")"));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, cow: CowStr<'_>) {
        // ratatui renders \t as zero-width
        let text = cow.replace('\t', "    ");

        if self.in_code_block {
            self.code_text(&text);
            return;
        }

        let style = self.style();
        self.append(Span::styled(text, style));
    }

    fn code_text(&mut self, text: &str) {
        // Take the highlighter out so highlight_line's borrow doesn't
        // conflict with open_line/append borrowing self.
        if let Some(mut hl) = self.highlighter.take() {
            for line in LinesWithEndings::from(text) {
                let Ok(ranges) = hl.highlight_line(line, &SYNTAX_SET) else {
                    continue;
                };
                self.open_line();
                for (style, fragment) in ranges {
                    let content = fragment.trim_end_matches('\n');
                    if content.is_empty() {
                        continue;
                    }
                    let fg = Color::Rgb(
                        style.foreground.r,
                        style.foreground.g,
                        style.foreground.b,
                    );
                    self.append(Span::styled(
                        content.to_owned(),
                        Style::default().fg(fg),
                    ));
                }
            }
            self.highlighter = Some(hl);
            return;
        }

        let style = Style::default().fg(Color::White);
        for line in text.lines() {
            self.open_line();
            self.append(Span::styled(line.to_owned(), style));
        }
    }
}

fn heading_style(base_fg: Color, level: HeadingLevel) -> Style {
    let style = Style::default().fg(base_fg).add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => style.add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => style,
        _ => style.add_modifier(Modifier::ITALIC),
    }
}

fn heading_rank(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
