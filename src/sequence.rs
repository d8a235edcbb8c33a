//! Instruction Sequence - Order Walk
//!
//! Walks the parsed order once and emits the flat record stream a renderer
//! paginates. Every counter lives inside a single `build` call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::addressing::{AddressError, NodeAddressFormatter, Side};
use crate::allocation::AllocationTable;
use crate::validation::{Diagnostic, LineRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: i64,
    pub to: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMeta {
    /// 1-based
    pub index: usize,
    pub name: String,
    pub hex: String,
}

/// Lines of one color, in generation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBucket {
    pub meta: ColorMeta,
    pub connections: Vec<Connection>,
}

impl ColorBucket {
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

pub const FALLBACK_HEX: &str = "#000000";

/// Group validated records into one bucket per color name, preserving
/// generation order inside each bucket.
///
/// Hex per color: first well-formed hex seen on that color's records, then
/// `palette_hex`, then black.
pub fn group_by_color(
    records: &[LineRecord],
    color_names: &[String],
    palette_hex: &[String],
) -> Vec<ColorBucket> {
    let mut buckets: Vec<ColorBucket> = color_names
        .iter()
        .enumerate()
        .map(|(i, name)| ColorBucket {
            meta: ColorMeta {
                index: i + 1,
                name: name.clone(),
                hex: String::new(),
            },
            connections: Vec::new(),
        })
        .collect();

    for record in records {
        let Ok(idx) = usize::try_from(record.color_index) else {
            continue;
        };
        let Some(bucket) = idx.checked_sub(1).and_then(|i| buckets.get_mut(i)) else {
            continue;
        };
        if bucket.meta.hex.is_empty() {
            if let Some(hex) = record.color_hex.as_deref().filter(|h| crate::validation::is_hex_color(h)) {
                bucket.meta.hex = hex.to_uppercase();
            }
        }
        bucket.connections.push(Connection {
            from: record.from_point,
            to: record.to_point,
        });
    }

    for (i, bucket) in buckets.iter_mut().enumerate() {
        if bucket.meta.hex.is_empty() {
            bucket.meta.hex = palette_hex
                .get(i)
                .filter(|h| crate::validation::is_hex_color(h))
                .map(|h| h.to_uppercase())
                .unwrap_or_else(|| FALLBACK_HEX.to_string());
        }
    }

    buckets
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstructionRecord {
    Info {
        text: String,
    },
    ColorHeader {
        color_index: usize,
        color_name: String,
        occurrence: usize,
        total_occurrences: usize,
        color_hex: String,
    },
    LineInstruction {
        from_label: String,
        to_label: String,
        from_side: Option<Side>,
        to_side: Option<Side>,
    },
    Footer {
        color_index: usize,
        color_name: String,
        occurrence: usize,
        total_occurrences: usize,
    },
    Spacer,
}

impl InstructionRecord {
    /// Whether the record takes up a row on the page.
    pub fn is_content(&self) -> bool {
        matches!(
            self,
            Self::Info { .. } | Self::ColorHeader { .. } | Self::LineInstruction { .. }
        )
    }
}

impl fmt::Display for InstructionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info { text } => f.write_str(text),
            Self::ColorHeader { color_name, occurrence, total_occurrences, .. } => {
                write!(f, "Now = {} {}/{}", color_name, occurrence, total_occurrences)
            }
            Self::LineInstruction { from_label, to_label, from_side, to_side } => {
                write!(f, "{:>3} {:>3}", from_label, to_label)?;
                if let (Some(a), Some(b)) = (from_side, to_side) {
                    write!(f, " {}/{}", a.abbrev(), b.abbrev())?;
                }
                Ok(())
            }
            Self::Footer { color_name, occurrence, total_occurrences, .. } => {
                write!(f, "Completed: {} group {}/{}", color_name, occurrence, total_occurrences)
            }
            Self::Spacer => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutput {
    pub records: Vec<InstructionRecord>,
    pub allocation: AllocationTable,
    /// Line count across all buckets, the denominator of progress text
    pub total_lines: usize,
    /// Line instructions actually emitted
    pub emitted_lines: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutput {
    pub fn line_instructions(&self) -> impl Iterator<Item = &InstructionRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r, InstructionRecord::LineInstruction { .. }))
    }
}

pub struct SequenceBuilder {
    formatter: NodeAddressFormatter,
}

impl SequenceBuilder {
    pub fn new(formatter: NodeAddressFormatter) -> Self {
        Self { formatter }
    }

    /// `buckets[i]` must describe color `i + 1`; `order` holds 1-based color
    /// indices as produced by [`crate::order::parse_order`].
    #[tracing::instrument(skip_all, fields(colors = buckets.len(), occurrences = order.len()))]
    pub fn build(&self, buckets: &[ColorBucket], order: &[usize]) -> BuildOutput {
        let lens: Vec<usize> = buckets.iter().map(ColorBucket::len).collect();
        let total_lines: usize = lens.iter().sum();
        let allocation = AllocationTable::compute(order, &lens);

        let mut records = Vec::with_capacity(total_lines + allocation.slices.len() * 5);
        let mut diagnostics = Vec::new();
        let mut emitted = 0usize;

        for slice in allocation.iter() {
            let bucket = &buckets[slice.color - 1];
            let meta = &bucket.meta;

            // Format first so progress text counts only what is really emitted
            let mut lines = Vec::with_capacity(slice.len());
            for (offset, conn) in bucket.connections[slice.range.clone()].iter().enumerate() {
                match self.line_instruction(conn) {
                    Ok(record) => lines.push(record),
                    Err(e) => {
                        let position = slice.range.start + offset;
                        tracing::warn!(color = %meta.name, position, error = %e, "skipping line instruction");
                        diagnostics.push(
                            Diagnostic::warning(
                                "endpoint",
                                format!("{} line {} skipped: {}", meta.name, position + 1, e),
                            ),
                        );
                    }
                }
            }

            let before = emitted;
            let after = emitted + lines.len();

            records.push(InstructionRecord::Info {
                text: format!("By Now {}/{}", before, total_lines),
            });
            records.push(InstructionRecord::Info {
                text: format!("By End {}/{}", after, total_lines),
            });
            records.push(InstructionRecord::ColorHeader {
                color_index: meta.index,
                color_name: meta.name.clone(),
                occurrence: slice.occurrence,
                total_occurrences: slice.total_occurrences,
                color_hex: meta.hex.clone(),
            });
            records.extend(lines);
            records.push(InstructionRecord::Footer {
                color_index: meta.index,
                color_name: meta.name.clone(),
                occurrence: slice.occurrence,
                total_occurrences: slice.total_occurrences,
            });
            records.push(InstructionRecord::Spacer);

            emitted = after;
        }

        tracing::debug!(total_lines, emitted, records = records.len(), "instruction sequence built");

        BuildOutput {
            records,
            allocation,
            total_lines,
            emitted_lines: emitted,
            diagnostics,
        }
    }

    fn line_instruction(&self, conn: &Connection) -> Result<InstructionRecord, AddressError> {
        let from = self.formatter.format(conn.from)?;
        let to = self.formatter.format(conn.to)?;
        Ok(InstructionRecord::LineInstruction {
            from_label: from.primary_label(),
            to_label: to.primary_label(),
            from_side: from.side,
            to_side: to.side,
        })
    }
}
