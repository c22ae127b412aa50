//! Markdown dialect used by the compendium pages.
//!
//! Supported: fenced code blocks, `#`..`###` headings, `> ` quotes (one
//! element per line), `- ` lists, inline code, `[text](url)` links and
//! paragraphs. Rendering is a fixed pipeline over a tagged block list:
//!
//! 1. fenced code is pulled out into a side table, leaving a numbered
//!    placeholder line in the stream;
//! 2. every remaining line is classified (heading, quote, list item, blank,
//!    text) and grouped into blocks;
//! 3. blocks are emitted, inline markup is applied to their text, and
//!    placeholders are replaced with the escaped code.
//!
//! Code content is always HTML-escaped. Other text is passed through as
//! written: input is trusted, author-controlled content.

mod inline;

pub use inline::render_inline;

/// Escapes the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CodeBlock {
    language: Option<String>,
    body: String,
}

/// A source line after fence extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Text(&'a str),
    /// Index into the code table.
    Placeholder(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block<'a> {
    Heading { level: u8, text: &'a str },
    Quote(&'a str),
    List(Vec<&'a str>),
    Paragraph(Vec<&'a str>),
    Code(usize),
}

/// Renders `text` to an HTML fragment.
pub fn render(text: &str) -> String {
    let source = text.replace("\r\n", "\n");
    let (lines, code) = extract_fences(&source);
    let blocks = classify(&lines);
    emit(&blocks, &code)
}

fn fence_info(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix("```").map(str::trim)
}

/// Sanitized fence language, usable as a class name.
fn fence_language(info: &str) -> Option<String> {
    let word = info.split_whitespace().next()?;
    let cleaned: String = word
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Replaces every fenced block with a placeholder line. An unclosed fence
/// runs to the end of the input.
fn extract_fences(source: &str) -> (Vec<Line<'_>>, Vec<CodeBlock>) {
    let mut lines = Vec::new();
    let mut code = Vec::new();
    let mut iter = source.split('\n');

    while let Some(line) = iter.next() {
        let Some(info) = fence_info(line) else {
            lines.push(Line::Text(line));
            continue;
        };

        let mut body: Vec<&str> = Vec::new();
        for inner in iter.by_ref() {
            if fence_info(inner).is_some() {
                break;
            }
            body.push(inner);
        }
        lines.push(Line::Placeholder(code.len()));
        code.push(CodeBlock {
            language: fence_language(info),
            body: body.join("\n"),
        });
    }

    (lines, code)
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.len() - line.trim_start_matches('#').len();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    line[hashes..]
        .strip_prefix(' ')
        .map(|text| (hashes as u8, text.trim()))
}

fn quote(line: &str) -> Option<&str> {
    if line == ">" {
        return Some("");
    }
    line.strip_prefix("> ")
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
}

fn classify<'a>(lines: &[Line<'a>]) -> Vec<Block<'a>> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&'a str> = Vec::new();
    let mut list: Vec<&'a str> = Vec::new();

    fn flush<'a>(blocks: &mut Vec<Block<'a>>, paragraph: &mut Vec<&'a str>, list: &mut Vec<&'a str>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(std::mem::take(paragraph)));
        }
        if !list.is_empty() {
            blocks.push(Block::List(std::mem::take(list)));
        }
    }

    for line in lines {
        let text = match *line {
            Line::Placeholder(index) => {
                flush(&mut blocks, &mut paragraph, &mut list);
                blocks.push(Block::Code(index));
                continue;
            }
            Line::Text(text) => text,
        };

        if text.trim().is_empty() {
            flush(&mut blocks, &mut paragraph, &mut list);
        } else if let Some((level, heading_text)) = heading(text) {
            flush(&mut blocks, &mut paragraph, &mut list);
            blocks.push(Block::Heading {
                level,
                text: heading_text,
            });
        } else if let Some(quoted) = quote(text) {
            flush(&mut blocks, &mut paragraph, &mut list);
            blocks.push(Block::Quote(quoted));
        } else if let Some(item) = list_item(text) {
            if !paragraph.is_empty() {
                blocks.push(Block::Paragraph(std::mem::take(&mut paragraph)));
            }
            list.push(item);
        } else {
            if !list.is_empty() {
                blocks.push(Block::List(std::mem::take(&mut list)));
            }
            paragraph.push(text);
        }
    }
    flush(&mut blocks, &mut paragraph, &mut list);

    blocks
}

fn emit(blocks: &[Block<'_>], code: &[CodeBlock]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(blocks.len());
    for block in blocks {
        let html = match block {
            Block::Heading { level, text } => {
                format!("<h{level}>{}</h{level}>", render_inline(text))
            }
            Block::Quote(text) => format!("<blockquote>{}</blockquote>", render_inline(text)),
            Block::List(items) => {
                let items: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>", render_inline(item)))
                    .collect();
                format!("<ul>{items}</ul>")
            }
            Block::Paragraph(lines) => {
                let lines: Vec<String> = lines.iter().map(|line| render_inline(line)).collect();
                format!("<p>{}</p>", lines.join("<br>"))
            }
            Block::Code(index) => match code.get(*index) {
                Some(block) => render_code(block),
                None => String::new(),
            },
        };
        parts.push(html);
    }
    parts.join("\n")
}

fn render_code(block: &CodeBlock) -> String {
    match &block.language {
        Some(language) => format!(
            "<pre><code class=\"language-{language}\">{}</code></pre>",
            escape_html(&block.body)
        ),
        None => format!("<pre><code>{}</code></pre>", escape_html(&block.body)),
    }
}
