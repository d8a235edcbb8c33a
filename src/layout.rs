//! Layout Authority System
//!
//! Defines where the page layout of a deck comes from, so callers never
//! branch on "was this set by a preset or by the user".

use serde::{Deserialize, Serialize};

use crate::addressing::AddressingMode;

/// LayoutAuthority determines where layout settings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutAuthority {
    /// System defaults (fallback)
    #[default]
    System,
    /// Preset-defined layout
    Preset,
    /// User-provided overrides (with validation)
    User,
}

/// Whether a section footer pushes the cursor to the next column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnBreak {
    #[default]
    Never,
    OnFooter,
}

pub const MAX_ROWS_PER_COLUMN: u32 = 500;
pub const MAX_COLUMNS_PER_PAGE: u32 = 50;

/// Page geometry and addressing for one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSpec {
    #[serde(default)]
    pub authority: LayoutAuthority,
    #[serde(default = "default_rows")]
    pub rows_per_column: u32,
    #[serde(default = "default_columns")]
    pub columns_per_page: u32,
    #[serde(default)]
    pub mode: AddressingMode,
    #[serde(default)]
    pub column_break: ColumnBreak,
}

fn default_rows() -> u32 { 18 }
fn default_columns() -> u32 { 3 }

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            authority: LayoutAuthority::System,
            rows_per_column: default_rows(),
            columns_per_page: default_columns(),
            mode: AddressingMode::Paired,
            column_break: ColumnBreak::Never,
        }
    }
}

impl LayoutSpec {
    /// Create from preset authority
    pub fn from_preset(rows: u32, columns: u32, mode: AddressingMode) -> Self {
        Self {
            authority: LayoutAuthority::Preset,
            rows_per_column: rows,
            columns_per_page: columns,
            mode,
            column_break: ColumnBreak::Never,
        }
    }

    /// Create from user with validation
    pub fn from_user(rows: u32, columns: u32, mode: AddressingMode) -> Result<Self, &'static str> {
        if rows == 0 || rows > MAX_ROWS_PER_COLUMN {
            return Err("Rows per column must be between 1 and 500");
        }
        if columns == 0 || columns > MAX_COLUMNS_PER_PAGE {
            return Err("Columns per page must be between 1 and 50");
        }
        Ok(Self {
            authority: LayoutAuthority::User,
            rows_per_column: rows,
            columns_per_page: columns,
            mode,
            column_break: ColumnBreak::Never,
        })
    }

    pub fn with_column_break(mut self, column_break: ColumnBreak) -> Self {
        self.column_break = column_break;
        self
    }

    /// Content rows one page can hold. Zero means the layout is unusable.
    pub fn capacity(&self) -> usize {
        self.rows_per_column as usize * self.columns_per_page as usize
    }

    /// Any authority may hand us zero-sized geometry (presets are loaded
    /// from disk); this is the check every path goes through before paging.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.rows_per_column == 0 {
            return Err("Rows per column must be positive");
        }
        if self.columns_per_page == 0 {
            return Err("Columns per page must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_default_matches_printed_deck() {
        let spec = LayoutSpec::default();
        assert_eq!(spec.capacity(), 54);
        assert_eq!(spec.mode, AddressingMode::Paired);
        assert!(spec.check().is_ok());
    }

    #[test]
    fn user_layout_is_range_checked() {
        assert!(LayoutSpec::from_user(0, 3, AddressingMode::Paired).is_err());
        assert!(LayoutSpec::from_user(18, 0, AddressingMode::Paired).is_err());
        assert!(LayoutSpec::from_user(501, 3, AddressingMode::Paired).is_err());

        let spec = LayoutSpec::from_user(10, 2, AddressingMode::Single).unwrap();
        assert_eq!(spec.authority, LayoutAuthority::User);
        assert_eq!(spec.capacity(), 20);
    }

    #[test]
    fn preset_layout_with_zero_rows_fails_check() {
        let spec = LayoutSpec::from_preset(0, 3, AddressingMode::Paired);
        assert!(spec.check().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let spec: LayoutSpec = serde_json::from_str(r#"{"rowsPerColumn": 12, "mode": "single"}"#).unwrap();
        assert_eq!(spec.rows_per_column, 12);
        assert_eq!(spec.columns_per_page, 3);
        assert_eq!(spec.mode, AddressingMode::Single);
        assert_eq!(spec.column_break, ColumnBreak::Never);
    }
}
