//! Taxonomy reference tables.
//!
//! Rows keep their on-disk order; first-match lookups elsewhere in the
//! workspace depend on it. Columns a consumer expects but the table lacks
//! read as blank rather than failing.

use crate::lookup::ColumnIndex;

#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    index: ColumnIndex,
}

impl ReferenceTable {
    /// Builds a table, trimming every value and padding short rows.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|header| header.trim().trim_matches('\u{feff}').to_string())
            .collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<String> =
                    row.into_iter().map(|cell| cell.trim().to_string()).collect();
                cells.resize(width, String::new());
                cells
            })
            .collect();
        let index = ColumnIndex::new(&headers);
        Self {
            name: name.into(),
            headers,
            rows,
            index,
        }
    }

    /// Convenience constructor used mostly by tests and fix packs.
    pub fn from_rows<H, R, C>(name: impl Into<String>, headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self::new(
            name,
            headers.into_iter().map(Into::into).collect(),
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains(column)
    }

    pub fn column(&self, column: &str) -> Option<usize> {
        self.index.get(column)
    }

    /// Cell value, or `""` for a missing column or row.
    pub fn value(&self, row: usize, column: &str) -> &str {
        match (self.rows.get(row), self.index.get(column)) {
            (Some(cells), Some(col)) => cells[col].as_str(),
            _ => "",
        }
    }

    pub fn row(&self, index: usize) -> Option<ReferenceRow<'_>> {
        (index < self.rows.len()).then_some(ReferenceRow { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = ReferenceRow<'_>> {
        (0..self.rows.len()).map(move |index| ReferenceRow { table: self, index })
    }

    pub fn raw_rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Renames a header in place. No-op when `from` is absent or `to` exists.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if self.index.contains(to) {
            return;
        }
        if let Some(col) = self.index.get(from) {
            self.headers[col] = to.to_string();
            self.index = ColumnIndex::new(&self.headers);
        }
    }
}

/// Borrowed view of one reference row.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceRow<'a> {
    table: &'a ReferenceTable,
    index: usize,
}

impl<'a> ReferenceRow<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> &'a str {
        self.table.value(self.index, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brands() -> ReferenceTable {
        ReferenceTable::from_rows(
            "brands",
            ["raw_brand", "market", "brand_clean"],
            [vec![" acme ", "DK", "Acme Corp"], vec!["Zed"]],
        )
    }

    #[test]
    fn values_are_trimmed_and_padded() {
        let table = brands();
        assert_eq!(table.value(0, "raw_brand"), "acme");
        assert_eq!(table.value(1, "market"), "");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn missing_columns_read_blank() {
        let table = brands();
        assert!(!table.has_column("region"));
        assert_eq!(table.value(0, "region"), "");
        assert_eq!(table.value(9, "market"), "");
    }

    #[test]
    fn header_lookup_folds_case() {
        let table = brands();
        assert_eq!(table.value(0, "Brand_Clean"), "Acme Corp");
    }

    #[test]
    fn rename_column_updates_lookup() {
        let mut table = ReferenceTable::from_rows(
            "channels",
            ["ChannelFinanceGroup", "Channel"],
            [vec!["Digital", "Social"]],
        );
        table.rename_column("ChannelFinanceGroup", "Channel Finance Group");
        assert_eq!(table.value(0, "Channel Finance Group"), "Digital");
        assert!(!table.has_column("ChannelFinanceGroup"));
    }
}
