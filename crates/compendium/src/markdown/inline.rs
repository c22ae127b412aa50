use super::escape_html;

/// Delimits the index of a masked code span while links are parsed.
const SPAN_MARK: char = '\u{1}';

/// Applies inline markup to one line of text. Code spans are cut out first
/// and replaced by markers, links are parsed over the masked line, then the
/// escaped code spans are put back. Link syntax inside a code span is
/// therefore never interpreted, while a code span can sit inside a link.
pub fn render_inline(text: &str) -> String {
    let mut spans = Vec::new();
    let mut masked = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        let Some(len) = after.find('`') else {
            break;
        };

        masked.push_str(&rest[..open]);
        if len == 0 {
            masked.push_str("``");
        } else {
            masked.push(SPAN_MARK);
            masked.push_str(&spans.len().to_string());
            masked.push(SPAN_MARK);
            spans.push(format!("<code>{}</code>", escape_html(&after[..len])));
        }
        rest = &after[len + 1..];
    }
    masked.push_str(rest);

    restore_spans(&render_links(&masked), &spans)
}

fn restore_spans(text: &str, spans: &[String]) -> String {
    if spans.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (position, part) in text.split(SPAN_MARK).enumerate() {
        let span = (position % 2 == 1)
            .then(|| part.parse::<usize>().ok())
            .flatten()
            .and_then(|index| spans.get(index));
        match span {
            Some(span) => out.push_str(span),
            None => out.push_str(part),
        }
    }
    out
}

/// Parses `text](url)` following an opening bracket. Returns the label, the
/// url and the number of bytes consumed.
fn parse_link(after_bracket: &str) -> Option<(&str, &str, usize)> {
    let close = after_bracket.find(']')?;
    let label = &after_bracket[..close];
    let tail = after_bracket[close + 1..].strip_prefix('(')?;
    let end = tail.find(')')?;
    let url = &tail[..end];
    if label.is_empty() || url.is_empty() {
        return None;
    }
    Some((label, url, close + 2 + end + 1))
}

fn render_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        match parse_link(after) {
            Some((label, url, consumed)) => {
                out.push_str(&rest[..open]);
                out.push_str(&format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{label}</a>",
                    url.replace('"', "&quot;")
                ));
                rest = &after[consumed..];
            }
            None => {
                out.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
