// ASCII box rendering for console listings. Amount-like cells are right aligned.

use std::fmt::Write as _;

const MAX_COL_WIDTH: usize = 48;
const ELLIPSIS: char = '…';

/// Column widths for one table, capped at `MAX_COL_WIDTH`.
struct Layout {
    widths: Vec<usize>,
}

impl Layout {
    fn measure(columns: &[&str], rows: &[Vec<String>]) -> Self {
        let widths = columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let widest = rows.iter().filter_map(|r| r.get(i)).map(|s| s.chars().count()).max().unwrap_or(0);
                widest.max(c.chars().count()).min(MAX_COL_WIDTH)
            })
            .collect();
        Layout { widths }
    }

    fn rule(&self, out: &mut String) {
        out.push('+');
        for w in &self.widths {
            out.extend(std::iter::repeat('-').take(w + 2));
            out.push('+');
        }
        out.push('\n');
    }

    fn line<'a, I: IntoIterator<Item = &'a str>>(&self, cells: I, align_amounts: bool, out: &mut String) {
        let mut cells = cells.into_iter();
        out.push('|');
        for &w in &self.widths {
            let raw = cells.next().unwrap_or("");
            let text = clip(raw, w);
            if align_amounts && is_amount(raw) {
                let _ = write!(out, " {:>w$} |", text);
            } else {
                let _ = write!(out, " {:<w$} |", text);
            }
        }
        out.push('\n');
    }
}

pub fn render_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let layout = Layout::measure(columns, rows);
    let mut out = String::new();
    layout.rule(&mut out);
    layout.line(columns.iter().copied(), false, &mut out);
    layout.rule(&mut out);
    for r in rows {
        layout.line(r.iter().map(String::as_str), true, &mut out);
    }
    layout.rule(&mut out);
    out.pop();
    out
}

/// Group digits in threes: 1234567 -> 1,234,567.
pub fn format_amount(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 { out.push(','); }
        out.push(ch);
    }
    out
}

/// Cut to `width` characters, marking the cut with an ellipsis.
fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut kept: String = s.chars().take(width.saturating_sub(1)).collect();
    kept.push(ELLIPSIS);
    kept
}

/// Grouped integers such as `83,300,000` or plain counts.
fn is_amount(s: &str) -> bool {
    let digits: String = s.trim().chars().filter(|c| *c != ',').collect();
    !digits.is_empty() && digits.parse::<u64>().is_ok()
}
