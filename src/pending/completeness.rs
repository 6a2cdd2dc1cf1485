//! Heuristic for chart blocks that are still being streamed in.
//!
//! Best-effort by nature: a finished but malformed block can look incomplete, which only delays
//! its error.

fn is_separator_row(line: &str) -> bool {
    let cells = row_cells(line);
    !cells.is_empty()
        && cells.iter().any(|c| c.contains('-'))
        && cells
            .iter()
            .all(|c| c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

fn row_cells(line: &str) -> Vec<&str> {
    let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    cells
}

fn populated_cells(line: &str) -> usize {
    row_cells(line).iter().filter(|c| !c.is_empty()).count()
}

fn is_bare_key_line(line: &str) -> bool {
    let Some(key) = line.trim().strip_suffix(':') else {
        return false;
    };
    let key = key.trim_end();
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// True when `text` looks like a chart block whose remaining bytes have not arrived yet.
pub fn looks_incomplete(text: &str) -> bool {
    let count = |c: char| text.chars().filter(|&x| x == c).count();
    if count('{') != count('}') || count('[') != count(']') {
        return true;
    }

    let pipe_lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains('|'))
        .collect();
    if !pipe_lines.is_empty() {
        let has_separator = pipe_lines.iter().any(|line| is_separator_row(line));
        if !has_separator {
            return true;
        }
        let rows: Vec<&str> = pipe_lines
            .iter()
            .copied()
            .filter(|line| !is_separator_row(line))
            .collect();
        if rows.len() < 2 {
            return true;
        }
        let header = populated_cells(rows[0]);
        let last = populated_cells(rows[rows.len() - 1]);
        if last + 2 <= header {
            return true;
        }
    }

    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| !line.contains('|') && is_bare_key_line(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_rows() {
        assert!(is_separator_row("|---|:---:|"));
        assert!(is_separator_row("--- | ---"));
        assert!(!is_separator_row("| a | b |"));
        assert!(!is_separator_row("| | |"));
    }

    #[test]
    fn bare_key_lines() {
        assert!(is_bare_key_line("data:"));
        assert!(is_bare_key_line("  valueFormat :  "));
        assert!(!is_bare_key_line("title: Sales"));
        assert!(!is_bare_key_line(":"));
    }
}
