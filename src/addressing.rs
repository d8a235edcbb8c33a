//! Node Addressing - Point Index to Fixture Label
//!
//! A point index is what the line generator produces. A fixture is what the
//! person holding the thread actually sees on the board.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How logical attachment points map onto physical fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    /// Two points share one fixture (picture hanger with a left and right hook)
    #[default]
    Paired,
    /// One fixture per point (nail board)
    Single,
}

impl AddressingMode {
    /// Number of fixtures needed to carry `total_points` points.
    pub fn fixture_count(self, total_points: u64) -> u64 {
        match self {
            Self::Paired => (total_points + 1) / 2,
            Self::Single => total_points,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn abbrev(self) -> &'static str {
        match self {
            Self::Left => "L",
            Self::Right => "R",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("Left"),
            Self::Right => f.write_str("Right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("point index {0} is negative")]
    Negative(i64),
}

/// A resolved point: fixture number, optional side, printable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    pub fixture: u64,
    pub side: Option<Side>,
    pub display: String,
}

impl NodeAddress {
    pub fn primary_label(&self) -> String {
        self.fixture.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeAddressFormatter {
    mode: AddressingMode,
}

impl NodeAddressFormatter {
    pub fn new(mode: AddressingMode) -> Self {
        Self { mode }
    }

    /// Fixture index a point lands on, without building the label.
    pub fn fixture_of(&self, point: i64) -> Result<u64, AddressError> {
        let point = u64::try_from(point).map_err(|_| AddressError::Negative(point))?;
        Ok(match self.mode {
            AddressingMode::Paired => point / 2,
            AddressingMode::Single => point,
        })
    }

    pub fn format(&self, point: i64) -> Result<NodeAddress, AddressError> {
        let fixture = self.fixture_of(point)?;
        let address = match self.mode {
            AddressingMode::Paired => {
                let side = if point % 2 == 0 { Side::Left } else { Side::Right };
                NodeAddress {
                    fixture,
                    side: Some(side),
                    display: format!("Fixture {} {}", fixture, side.abbrev()),
                }
            }
            AddressingMode::Single => NodeAddress {
                fixture,
                side: None,
                display: format!("Point {}", point),
            },
        };
        Ok(address)
    }
}
