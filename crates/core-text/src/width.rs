//! Display columns for character indices.
//!
//! A tab advances to the next multiple of the tab width, East Asian wide characters take two
//! columns, and every other character takes at least one.

use unicode_width::UnicodeWidthChar;

/// Sub-column bias used when mapping block selection edges back to indices.
pub const BLOCK_SELECTION_SUB_X: f64 = 0.5;

pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(0).max(1)
}

/// Starting column of every character plus the end column: `len + 1` entries.
pub fn column_table(s: &str, tab_width: usize) -> Vec<usize> {
    let tab = tab_width.max(1);
    let mut columns = Vec::with_capacity(s.len() + 1);
    let mut column = 0;
    columns.push(column);
    for c in s.chars() {
        column = if c == '\t' {
            (column / tab + 1) * tab
        } else {
            column + char_width(c)
        };
        columns.push(column);
    }
    columns
}

pub fn text_width(s: &str, tab_width: usize) -> usize {
    column_table(s, tab_width).last().copied().unwrap_or(0)
}

/// Column of character `index`. Indices past the end count one column each.
pub fn column_from_index(s: &str, index: usize, tab_width: usize) -> usize {
    let columns = column_table(s, tab_width);
    let len = columns.len() - 1;
    if index <= len {
        columns[index]
    } else {
        columns[len] + (index - len)
    }
}

/// Character index nearest to `column`.
///
/// `sub_x` biases the hit inside a cell (0.5 selects the right half). A column inside a
/// character rounds to the nearer of its two edges. Past the end the result is the line length,
/// or with `overshoot` a virtual index beyond it.
pub fn index_from_column(
    s: &str,
    column: usize,
    sub_x: f64,
    tab_width: usize,
    overshoot: bool,
) -> usize {
    let columns = column_table(s, tab_width);
    let len = columns.len() - 1;
    let pos = columns.partition_point(|&c| c <= column).saturating_sub(1);
    if pos >= len {
        if overshoot {
            len + (column - columns[len]) + (sub_x + 0.25) as usize
        } else {
            len
        }
    } else {
        let midpoint = (columns[pos] + columns[pos + 1]) as f64 * 0.5 + 0.25;
        if column as f64 + sub_x < midpoint {
            pos
        } else {
            pos + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_and_wide_characters() {
        assert_eq!(column_table("a\tb", 4), vec![0, 1, 4, 5]);
        assert_eq!(column_table("日本", 4), vec![0, 2, 4]);
        assert_eq!(column_table("\t\t", 8), vec![0, 8, 16]);
        assert_eq!(text_width("a\u{301}", 4), 2);
    }

    #[test]
    fn column_hits_round_to_nearest_edge() {
        assert_eq!(index_from_column("日本", 1, 0.0, 4, false), 0);
        assert_eq!(index_from_column("日本", 2, 0.0, 4, false), 1);
        assert_eq!(index_from_column("日本", 3, 0.0, 4, false), 1);
        assert_eq!(index_from_column("日本", 3, 0.5, 4, false), 2);
        assert_eq!(index_from_column("a\tb", 2, 0.0, 4, false), 1);
        assert_eq!(index_from_column("a\tb", 3, 0.0, 4, false), 2);
    }

    #[test]
    fn overshoot_allows_virtual_columns() {
        assert_eq!(index_from_column("ab", 6, 0.0, 4, false), 2);
        assert_eq!(index_from_column("ab", 6, 0.0, 4, true), 6);
        assert_eq!(index_from_column("ab", 6, BLOCK_SELECTION_SUB_X, 4, true), 6);
        assert_eq!(index_from_column("", 3, 0.0, 4, true), 3);
        assert_eq!(column_from_index("ab", 5, 4), 5);
        assert_eq!(column_from_index("a\tb", 2, 4), 4);
    }
}
