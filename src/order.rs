//! Group Order Parsing
//!
//! Two accepted forms:
//! - Loop form: an all-digit string such as `"4"`, meaning "every color, in
//!   index order, four times over".
//! - Explicit form: a comma-separated list of 1-based color indices such as
//!   `"1,2,1,3"`.
//!
//! Parsing is total. Bad tokens are dropped, and an order that ends up empty
//! falls back to each color once.

use serde::{Deserialize, Serialize};

pub const SEPARATOR: char = ',';

/// Largest loop count the loop form accepts. Larger or overflowing counts
/// are dropped and the default order is used instead.
pub const MAX_LOOPS: usize = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderForm {
    Loop,
    Explicit,
    /// Nothing usable was given; each color once in index order
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOrder {
    pub form: OrderForm,
    /// 1-based color indices, one per occurrence
    pub indices: Vec<usize>,
    /// Tokens that were dropped, kept for diagnostics
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<String>,
}

impl ParsedOrder {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// How many times `color` (1-based) occurs in the order.
    pub fn occurrences_of(&self, color: usize) -> usize {
        self.indices.iter().filter(|&&c| c == color).count()
    }
}

/// Each color once, in increasing index order.
pub fn default_order(num_colors: usize) -> Vec<usize> {
    (1..=num_colors).collect()
}

pub fn parse_order(spec: &str, num_colors: usize) -> ParsedOrder {
    let trimmed = spec.trim();
    let mut dropped = Vec::new();

    let (form, indices) = if is_loop_form(trimmed) {
        match trimmed.parse::<usize>() {
            Ok(loops) if loops <= MAX_LOOPS => {
                let indices: Vec<usize> = (0..loops).flat_map(|_| 1..=num_colors).collect();
                (OrderForm::Loop, indices)
            }
            _ => {
                tracing::warn!(spec = trimmed, max = MAX_LOOPS, "loop count out of range");
                dropped.push(trimmed.to_string());
                (OrderForm::Loop, Vec::new())
            }
        }
    } else if trimmed.is_empty() {
        (OrderForm::Loop, default_order(num_colors))
    } else {
        let mut indices = Vec::new();
        for token in trimmed.split(SEPARATOR) {
            let token = token.trim();
            match token.parse::<usize>() {
                Ok(idx) if (1..=num_colors).contains(&idx) => indices.push(idx),
                _ => {
                    if !token.is_empty() {
                        tracing::warn!(token, num_colors, "dropping order token");
                    }
                    dropped.push(token.to_string());
                }
            }
        }
        (OrderForm::Explicit, indices)
    };

    if indices.is_empty() {
        tracing::debug!(spec, "order is empty, falling back to default order");
        return ParsedOrder {
            form: OrderForm::Default,
            indices: default_order(num_colors),
            dropped,
        };
    }

    ParsedOrder { form, indices, dropped }
}

fn is_loop_form(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
