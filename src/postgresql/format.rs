//! Query results rendered as host display text.

pub const TAB: char = '\t';
pub const NEWLINE: char = '\n';

pub const TABLE_MAGIC_TAG: &str = "%table ";
pub const TEXT_MAGIC_TAG: &str = "%text ";
pub const UPDATE_COUNT_HEADER: &str = "Update Count";

/// Column-major result set: every column holds one cell per row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularResult {
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<String>,
}

impl TabularResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column<I, S>(&mut self, name: impl Into<String>, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.push(Column {
            name: name.into(),
            cells: cells.into_iter().map(Into::into).collect(),
        });
    }

    /// Builds a result from row-major data, as drivers hand it out.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column { name, cells: Vec::with_capacity(rows.len()) })
            .collect();
        for row in rows {
            for (column, cell) in columns.iter_mut().zip(row) {
                column.cells.push(cell);
            }
        }
        Self { columns }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Rows present in every column.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).min().unwrap_or(0)
    }

    fn row(&self, i: usize) -> impl Iterator<Item = &str> {
        self.columns.iter().map(move |c| c.cells[i].as_str())
    }
}

/// Tabs and newlines inside a value would break the grid.
pub fn replace_reserved_chars(value: &str) -> String {
    value.replace([TAB, NEWLINE], " ")
}

/// `%table` grid: tab-joined header then one tab-joined line per row, values sanitized.
pub fn format_table(result: &TabularResult, max_rows: usize) -> String {
    let mut msg = String::from(TABLE_MAGIC_TAG);

    let header: Vec<String> = result.columns.iter().map(|c| replace_reserved_chars(&c.name)).collect();
    msg.push_str(&header.join("\t"));
    msg.push(NEWLINE);

    for i in 0..result.row_count().min(max_rows) {
        let cells: Vec<String> = result.row(i).map(replace_reserved_chars).collect();
        msg.push_str(&cells.join("\t"));
        msg.push(NEWLINE);
    }
    msg
}

/// `%text` rendering of a single-column result: header and cells verbatim, one per line.
pub fn format_text(result: &TabularResult, max_rows: usize) -> String {
    let mut msg = String::from(TEXT_MAGIC_TAG);
    for column in &result.columns {
        msg.push_str(&column.name);
        msg.push(NEWLINE);
        for cell in column.cells.iter().take(max_rows) {
            msg.push_str(cell);
            msg.push(NEWLINE);
        }
    }
    msg
}

pub fn format_update_count(count: u64) -> String {
    format!("{TABLE_MAGIC_TAG}{UPDATE_COUNT_HEADER}{NEWLINE}{count}{NEWLINE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> TabularResult {
        let mut r = TabularResult::new();
        r.add_column("col1", ["val11", "val12"]);
        r.add_column("col2", ["val21", "val22"]);
        r
    }

    #[test]
    fn test_format_table() {
        assert_eq!(
            format_table(&two_by_two(), 1000),
            "%table col1\tcol2\nval11\tval21\nval12\tval22\n"
        );
    }

    #[test]
    fn test_format_table_sanitizes_values() {
        let mut r = TabularResult::new();
        r.add_column("co\tl1", ["val11", "va\tl1\n2"]);
        r.add_column("co\nl2", ["v\nal21", "val\t22"]);
        assert_eq!(
            format_table(&r, 1000),
            "%table co l1\tco l2\nval11\tv al21\nva l1 2\tval 22\n"
        );
    }

    #[test]
    fn test_format_table_respects_max_rows() {
        assert_eq!(format_table(&two_by_two(), 1), "%table col1\tcol2\nval11\tval21\n");
    }

    #[test]
    fn test_format_text_is_verbatim() {
        let mut r = TabularResult::new();
        r.add_column("co\tl\n1", ["va\nl11", "va\tl\n12"]);
        assert_eq!(format_text(&r, 1000), "%text co\tl\n1\nva\nl11\nva\tl\n12\n");
    }

    #[test]
    fn test_from_rows_transposes() {
        let r = TabularResult::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "2".into()], vec!["3".into(), "4".into()]],
        );
        assert_eq!(r, {
            let mut expected = TabularResult::new();
            expected.add_column("a", ["1", "3"]);
            expected.add_column("b", ["2", "4"]);
            expected
        });
        assert_eq!(r.row_count(), 2);
    }

    #[test]
    fn test_update_count() {
        assert_eq!(format_update_count(3), "%table Update Count\n3\n");
    }
}
