//! Deck statistics: lines per color and fixture wear.
//!
//! Pure aggregation over the buckets; independent of order and pagination.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::addressing::{AddressingMode, NodeAddressFormatter};
use crate::sequence::ColorBucket;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorShare {
    pub color_index: usize,
    pub color_name: String,
    pub lines: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureUsage {
    /// Fixture index -> number of line ends on it
    pub histogram: BTreeMap<u64, u32>,
    pub min: u32,
    pub max: u32,
    pub average: f64,
    pub most_used: Option<u64>,
    pub least_used: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total_lines: usize,
    pub fixtures_needed: u64,
    /// Sorted by line count, largest first
    pub colors: Vec<ColorShare>,
    pub fixture_usage: FixtureUsage,
}

impl DeckStats {
    pub fn collect(buckets: &[ColorBucket], mode: AddressingMode, total_points: u64) -> Self {
        let total_lines: usize = buckets.iter().map(ColorBucket::len).sum();

        let mut colors: Vec<ColorShare> = buckets
            .iter()
            .map(|b| ColorShare {
                color_index: b.meta.index,
                color_name: b.meta.name.clone(),
                lines: b.len(),
                percentage: if total_lines > 0 {
                    b.len() as f64 / total_lines as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        colors.sort_by(|a, b| b.lines.cmp(&a.lines).then(a.color_index.cmp(&b.color_index)));

        let formatter = NodeAddressFormatter::new(mode);
        let mut histogram: BTreeMap<u64, u32> = BTreeMap::new();
        for conn in buckets.iter().flat_map(|b| b.connections.iter()) {
            for point in [conn.from, conn.to] {
                if let Ok(fixture) = formatter.fixture_of(point) {
                    *histogram.entry(fixture).or_default() += 1;
                }
            }
        }

        Self {
            total_lines,
            fixtures_needed: mode.fixture_count(total_points),
            colors,
            fixture_usage: FixtureUsage::from_histogram(histogram),
        }
    }
}

impl FixtureUsage {
    fn from_histogram(histogram: BTreeMap<u64, u32>) -> Self {
        // BTreeMap iterates in fixture order, so ties resolve to the lowest fixture
        let mut most: Option<(u64, u32)> = None;
        let mut least: Option<(u64, u32)> = None;
        for (&fixture, &count) in &histogram {
            if most.map_or(true, |(_, c)| count > c) {
                most = Some((fixture, count));
            }
            if least.map_or(true, |(_, c)| count < c) {
                least = Some((fixture, count));
            }
        }

        let sum: u64 = histogram.values().map(|&c| c as u64).sum();
        let average = if histogram.is_empty() {
            0.0
        } else {
            sum as f64 / histogram.len() as f64
        };

        Self {
            min: least.map_or(0, |(_, c)| c),
            max: most.map_or(0, |(_, c)| c),
            average,
            most_used: most.map(|(f, _)| f),
            least_used: least.map(|(f, _)| f),
            histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{ColorMeta, Connection};

    fn bucket(index: usize, name: &str, conns: &[(i64, i64)]) -> ColorBucket {
        ColorBucket {
            meta: ColorMeta { index, name: name.to_string(), hex: "#000000".to_string() },
            connections: conns.iter().map(|&(from, to)| Connection { from, to }).collect(),
        }
    }

    #[test]
    fn counts_lines_per_color() {
        let buckets = vec![
            bucket(1, "white", &[(0, 1)]),
            bucket(2, "black", &[(0, 2), (2, 3), (1, 3)]),
        ];
        let stats = DeckStats::collect(&buckets, AddressingMode::Paired, 8);

        assert_eq!(stats.total_lines, 4);
        assert_eq!(stats.fixtures_needed, 4);
        assert_eq!(stats.colors[0].color_name, "black");
        assert!((stats.colors[0].percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn fixture_histogram_in_paired_mode() {
        // Points 0,1 -> fixture 0; 2,3 -> fixture 1; 6 -> fixture 3
        let buckets = vec![bucket(1, "white", &[(0, 1), (2, 6), (3, 0)])];
        let stats = DeckStats::collect(&buckets, AddressingMode::Paired, 8);
        let usage = &stats.fixture_usage;

        assert_eq!(usage.histogram.get(&0), Some(&3));
        assert_eq!(usage.histogram.get(&1), Some(&2));
        assert_eq!(usage.histogram.get(&3), Some(&1));
        assert_eq!((usage.min, usage.max), (1, 3));
        assert_eq!(usage.most_used, Some(0));
        assert_eq!(usage.least_used, Some(3));
        assert!((usage.average - 2.0).abs() < 1e-9);
    }

    #[test]
    fn negative_points_are_not_counted() {
        let buckets = vec![bucket(1, "white", &[(-1, 4)])];
        let stats = DeckStats::collect(&buckets, AddressingMode::Single, 10);
        assert_eq!(stats.fixture_usage.histogram.len(), 1);
        assert_eq!(stats.fixture_usage.most_used, Some(4));
    }

    #[test]
    fn empty_buckets_give_zeroed_report() {
        let stats = DeckStats::collect(&[bucket(1, "white", &[])], AddressingMode::Paired, 0);
        assert_eq!(stats.total_lines, 0);
        assert_eq!(stats.colors[0].percentage, 0.0);
        assert_eq!(stats.fixture_usage.most_used, None);
        assert_eq!(stats.fixture_usage.average, 0.0);
    }
}
