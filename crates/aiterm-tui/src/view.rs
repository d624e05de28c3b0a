use aiterm_session::{LineKind, ScrollbackEntry};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

use crate::TuiTheme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ViewLineKind {
    Prompt,
    Command,
    Output(LineKind),
}

/// One logical scrollback row before wrapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ViewLine {
    pub(crate) kind: ViewLineKind,
    pub(crate) text: String,
}

/// Folds a prompt that is directly followed by a command into one row, the
/// way a shell echoes `prompt command`.
pub(crate) fn flatten_scrollback(entries: &[ScrollbackEntry], prompt: &str) -> Vec<ViewLine> {
    let mut lines = Vec::with_capacity(entries.len());
    let mut iter = entries.iter().peekable();
    while let Some(entry) = iter.next() {
        match entry {
            ScrollbackEntry::Prompt => {
                if let Some(ScrollbackEntry::Command(_)) = iter.peek() {
                    continue;
                }
                lines.push(ViewLine {
                    kind: ViewLineKind::Prompt,
                    text: prompt.to_string(),
                });
            }
            ScrollbackEntry::Command(command) => lines.push(ViewLine {
                kind: ViewLineKind::Command,
                text: format!("{prompt} {command}"),
            }),
            ScrollbackEntry::Output(line) => lines.push(ViewLine {
                kind: ViewLineKind::Output(line.kind),
                text: line.text.clone(),
            }),
        }
    }
    lines
}

pub(crate) fn wrap_text_by_display_width(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![String::new()];
    }

    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width > 0 && current_width + ch_width > max_width {
            rows.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }
    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Returns the rows that fit in `max_rows`, offset `scroll_from_bottom` rows
/// up from the newest one.
pub(crate) fn visible_scrollback_rows(
    lines: &[ViewLine],
    prompt: &str,
    max_rows: usize,
    max_width: usize,
    scroll_from_bottom: usize,
    theme: TuiTheme,
) -> Vec<Line<'static>> {
    if max_rows == 0 || max_width == 0 {
        return vec![];
    }

    let rows = lines
        .iter()
        .flat_map(|line| styled_rows(line, prompt, max_width, theme))
        .collect::<Vec<_>>();
    let scroll = scroll_from_bottom.min(max_scroll(rows.len(), max_rows));
    let end = rows.len().saturating_sub(scroll);
    let start = end.saturating_sub(max_rows);
    rows[start..end].to_vec()
}

pub(crate) fn max_scroll(total_rows: usize, max_rows: usize) -> usize {
    total_rows.saturating_sub(max_rows)
}

fn styled_rows(line: &ViewLine, prompt: &str, max_width: usize, theme: TuiTheme) -> Vec<Line<'static>> {
    let chunks = wrap_text_by_display_width(&line.text, max_width);
    match line.kind {
        ViewLineKind::Prompt => chunks
            .into_iter()
            .map(|chunk| Line::from(Span::styled(chunk, theme.prompt_style())))
            .collect(),
        ViewLineKind::Output(kind) => chunks
            .into_iter()
            .map(|chunk| Line::from(Span::styled(chunk, theme.line_style(kind))))
            .collect(),
        ViewLineKind::Command => {
            let mut prompt_chars = prompt.chars().count();
            chunks
                .into_iter()
                .map(|chunk| {
                    let split = chunk
                        .char_indices()
                        .nth(prompt_chars)
                        .map(|(index, _)| index)
                        .unwrap_or(chunk.len());
                    prompt_chars = prompt_chars.saturating_sub(chunk[..split].chars().count());
                    split_styled(chunk, split, theme.prompt_style(), theme.command_style())
                })
                .collect()
        }
    }
}

fn split_styled(chunk: String, split: usize, head: Style, tail: Style) -> Line<'static> {
    if split == 0 {
        return Line::from(Span::styled(chunk, tail));
    }
    if split >= chunk.len() {
        return Line::from(Span::styled(chunk, head));
    }
    let rest = chunk[split..].to_string();
    let mut prefix = chunk;
    prefix.truncate(split);
    Line::from(vec![Span::styled(prefix, head), Span::styled(rest, tail)])
}

#[cfg(test)]
mod tests {
    use aiterm_session::OutputLine;

    use super::*;

    fn row_text(line: &Line<'_>) -> String {
        line.spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect()
    }

    #[test]
    fn prompt_and_command_fold_into_one_row() {
        let entries = vec![
            ScrollbackEntry::Prompt,
            ScrollbackEntry::Command("ls".to_string()),
            ScrollbackEntry::Output(OutputLine::new("a.txt", LineKind::Plain)),
            ScrollbackEntry::Prompt,
        ];
        let lines = flatten_scrollback(&entries, "$");
        let texts = lines.iter().map(|line| line.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["$ ls", "a.txt", "$"]);
    }

    #[test]
    fn wrapping_respects_wide_characters() {
        assert_eq!(wrap_text_by_display_width("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text_by_display_width("日本語", 4), vec!["日本", "語"]);
        assert_eq!(wrap_text_by_display_width("", 4), vec![""]);
    }

    #[test]
    fn command_row_styles_prompt_separately() {
        let line = ViewLine {
            kind: ViewLineKind::Command,
            text: "$ pwd".to_string(),
        };
        let rows = styled_rows(&line, "$", 80, TuiTheme::Dark);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].spans.len(), 2);
        assert_eq!(rows[0].spans[0].content, "$");
        assert_eq!(rows[0].spans[1].content, " pwd");
    }

    #[test]
    fn visible_rows_follow_scroll_offset() {
        let lines = (0..10)
            .map(|index| ViewLine {
                kind: ViewLineKind::Output(LineKind::Plain),
                text: format!("line {index}"),
            })
            .collect::<Vec<_>>();

        let bottom = visible_scrollback_rows(&lines, "$", 3, 40, 0, TuiTheme::Dark);
        assert_eq!(
            bottom.iter().map(row_text).collect::<Vec<_>>(),
            vec!["line 7", "line 8", "line 9"]
        );

        let clamped = visible_scrollback_rows(&lines, "$", 3, 40, 100, TuiTheme::Dark);
        assert_eq!(row_text(&clamped[0]), "line 0");
    }
}
