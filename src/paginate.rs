//! Pagination - Record Stream to Pages
//!
//! A page holds `rows_per_column * columns_per_page` content rows. Info,
//! ColorHeader and LineInstruction take one row each; Footer and Spacer take
//! none. Sections are allowed to run across page boundaries.
//!
//! Pages are opened lazily: a full page is only closed when the next content
//! row arrives, so trailing footers stay with the lines they close.

use serde::{Deserialize, Serialize};

use crate::layout::{ColumnBreak, LayoutSpec};
use crate::sequence::InstructionRecord;

/// Where a record sits on its page. Layout-only records carry the cursor
/// position at the time they were placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub column: usize,
    pub row: usize,
    pub record: InstructionRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based
    pub index: usize,
    pub entries: Vec<PageEntry>,
}

impl Page {
    fn new(index: usize) -> Self {
        Self { index, entries: Vec::new() }
    }

    pub fn content_rows(&self) -> usize {
        self.entries.iter().filter(|e| e.record.is_content()).count()
    }

    pub fn records(&self) -> impl Iterator<Item = &InstructionRecord> {
        self.entries.iter().map(|e| &e.record)
    }
}

pub struct Paginator {
    rows: usize,
    columns: usize,
    column_break: ColumnBreak,
}

impl Paginator {
    /// Fails on a layout that could never fill a page.
    pub fn new(layout: &LayoutSpec) -> Result<Self, &'static str> {
        layout.check()?;
        Ok(Self {
            rows: layout.rows_per_column as usize,
            columns: layout.columns_per_page as usize,
            column_break: layout.column_break,
        })
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.columns
    }

    #[tracing::instrument(skip_all, fields(records = records.len(), capacity = self.capacity()))]
    pub fn paginate(&self, records: &[InstructionRecord]) -> Vec<Page> {
        let mut pages = Vec::new();
        let mut current: Option<Page> = None;
        let mut column = 0usize;
        let mut row = 0usize;

        for record in records {
            if record.is_content() && (current.is_none() || column == self.columns) {
                if let Some(full) = current.take() {
                    pages.push(full);
                }
                current = Some(Page::new(pages.len()));
                column = 0;
                row = 0;
            }
            let page = current.get_or_insert_with(|| Page::new(pages.len()));

            page.entries.push(PageEntry {
                column,
                row,
                record: record.clone(),
            });

            if record.is_content() {
                row += 1;
                if row == self.rows {
                    column += 1;
                    row = 0;
                }
            } else if matches!(record, InstructionRecord::Footer { .. })
                && self.column_break == ColumnBreak::OnFooter
                && row != 0
            {
                column += 1;
                row = 0;
            }
        }

        if let Some(last) = current {
            pages.push(last);
        }

        tracing::debug!(pages = pages.len(), "pagination done");
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::AddressingMode;

    fn info(n: usize) -> InstructionRecord {
        InstructionRecord::Info { text: format!("row {}", n) }
    }

    fn footer() -> InstructionRecord {
        InstructionRecord::Footer {
            color_index: 1,
            color_name: "white".to_string(),
            occurrence: 1,
            total_occurrences: 1,
        }
    }

    fn paginator(rows: u32, columns: u32) -> Paginator {
        Paginator::new(&LayoutSpec::from_preset(rows, columns, AddressingMode::Paired)).unwrap()
    }

    #[test]
    fn empty_input_gives_no_pages() {
        assert!(paginator(3, 2).paginate(&[]).is_empty());
    }

    #[test]
    fn rejects_zero_geometry() {
        assert!(Paginator::new(&LayoutSpec::from_preset(0, 2, AddressingMode::Paired)).is_err());
        assert!(Paginator::new(&LayoutSpec::from_preset(2, 0, AddressingMode::Paired)).is_err());
    }

    #[test]
    fn fills_columns_then_pages() {
        let records: Vec<_> = (0..7).map(info).collect();
        let pages = paginator(2, 2).paginate(&records);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].content_rows(), 4);
        assert_eq!(pages[1].content_rows(), 3);
        assert_eq!(pages[1].index, 1);

        let slots: Vec<_> = pages[0].entries.iter().map(|e| (e.column, e.row)).collect();
        assert_eq!(slots, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert_eq!((pages[1].entries[2].column, pages[1].entries[2].row), (1, 0));
    }

    #[test]
    fn trailing_layout_records_stay_on_full_page() {
        let records = vec![info(0), info(1), footer(), InstructionRecord::Spacer];
        let pages = paginator(1, 2).paginate(&records);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].entries.len(), 4);
    }

    #[test]
    fn footer_break_moves_to_next_column() {
        let spec = LayoutSpec::from_preset(4, 2, AddressingMode::Paired)
            .with_column_break(ColumnBreak::OnFooter);
        let records = vec![info(0), footer(), info(1), info(2), footer(), info(3)];
        let pages = Paginator::new(&spec).unwrap().paginate(&records);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].content_rows(), 3);
        let last = pages[1].entries.last().unwrap();
        assert_eq!((last.column, last.row), (0, 0));
    }

    #[test]
    fn footer_at_column_top_does_not_skip_a_column() {
        let spec = LayoutSpec::from_preset(1, 2, AddressingMode::Paired)
            .with_column_break(ColumnBreak::OnFooter);
        let records = vec![info(0), footer(), info(1)];
        let pages = Paginator::new(&spec).unwrap().paginate(&records);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].entries[2].column, 1);
    }
}
