//! Line Allocation - Bucket Slicing Per Occurrence
//!
//! A color with `L` lines appearing `K` times in the order is cut into `K`
//! contiguous slices. The first `L % K` occurrences get `L / K + 1` lines,
//! the rest get `L / K`. Earlier occurrences take earlier lines.
//!
//! The whole table is computed before the instruction walk starts, so the
//! walk never mutates shared per-color counters.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Slice lengths for a bucket of `len` lines spread over `occurrences` slots.
///
/// Returns an empty vec when `occurrences == 0`: a color absent from the
/// order is never drawn.
pub fn split_lengths(len: usize, occurrences: usize) -> Vec<usize> {
    if occurrences == 0 {
        return Vec::new();
    }
    let base = len / occurrences;
    let remainder = len % occurrences;
    (0..occurrences)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// One entry per element of the parsed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceAllocation {
    /// 1-based color index
    pub color: usize,
    /// 1-based occurrence number for this color
    pub occurrence: usize,
    pub total_occurrences: usize,
    /// Range into the color's bucket
    pub range: Range<usize>,
}

impl SliceAllocation {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTable {
    pub slices: Vec<SliceAllocation>,
}

impl AllocationTable {
    /// Build the table for `order` (1-based color indices) given each
    /// color's bucket length, indexed 0-based.
    ///
    /// Indices in `order` with no matching bucket are skipped; the order
    /// parser has already filtered them, so this only guards direct callers.
    pub fn compute(order: &[usize], bucket_lens: &[usize]) -> Self {
        let mut occurrence_totals: BTreeMap<usize, usize> = BTreeMap::new();
        for &color in order {
            if (1..=bucket_lens.len()).contains(&color) {
                *occurrence_totals.entry(color).or_default() += 1;
            }
        }

        let lengths: BTreeMap<usize, Vec<usize>> = occurrence_totals
            .iter()
            .map(|(&color, &k)| (color, split_lengths(bucket_lens[color - 1], k)))
            .collect();

        let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
        let mut cursors: BTreeMap<usize, usize> = BTreeMap::new();
        let mut slices = Vec::with_capacity(order.len());

        for &color in order {
            let Some(color_lengths) = lengths.get(&color) else {
                continue;
            };
            let nth = seen.entry(color).or_default();
            let cursor = cursors.entry(color).or_default();
            let len = color_lengths[*nth];

            slices.push(SliceAllocation {
                color,
                occurrence: *nth + 1,
                total_occurrences: color_lengths.len(),
                range: *cursor..*cursor + len,
            });

            *nth += 1;
            *cursor += len;
        }

        tracing::debug!(slices = slices.len(), "allocation table computed");
        Self { slices }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SliceAllocation> {
        self.slices.iter()
    }
}
