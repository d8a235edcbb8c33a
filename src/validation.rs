//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured diagnostics for a single line record.
//! Policy decides what happens to the record: any Error drops it, Warnings
//! and Info keep it. Nothing here aborts an export.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

/// One absorbed anomaly. Collected across the whole export and handed back
/// as a single report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    /// Position of the offending record in the input line sequence
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub remediation: Vec<String>,
}

impl Diagnostic {
    pub fn error(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Error,
            message: message.into(),
            position: None,
            remediation: vec![],
        }
    }

    pub fn warning(rule: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ViolationSeverity::Warning,
            ..Self::error(rule, message)
        }
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_remediation(mut self, hint: impl Into<String>) -> Self {
        self.remediation.push(hint.into());
        self
    }
}

/// One entry of the line generator's output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineRecord {
    #[serde(default)]
    pub step: Option<u64>,
    #[serde(alias = "colorIndex")]
    pub color_index: i64,
    #[serde(default, alias = "colorHex")]
    pub color_hex: Option<String>,
    #[serde(default)]
    pub rgb: Option<Vec<i64>>,
    #[serde(alias = "from_pin", alias = "fromPoint")]
    pub from_point: i64,
    #[serde(alias = "to_pin", alias = "toPoint")]
    pub to_point: i64,
}

/// What a rule may look at besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    pub color_names: &'a [String],
}

/// Validation rule trait - produces diagnostics
pub trait RecordRule {
    fn name(&self) -> &'static str;
    fn check(&self, record: &LineRecord, ctx: &RecordContext<'_>) -> Vec<Diagnostic>;
}

// --- Concrete Rules ---

pub struct ColorIndexRule;

impl RecordRule for ColorIndexRule {
    fn name(&self) -> &'static str { "color_index" }

    fn check(&self, record: &LineRecord, ctx: &RecordContext<'_>) -> Vec<Diagnostic> {
        let known = ctx.color_names.len() as i64;
        if (1..=known).contains(&record.color_index) {
            return vec![];
        }
        vec![Diagnostic::error(
            self.name(),
            format!("color index {} does not name one of {} colors", record.color_index, known),
        )
        .with_remediation("Check that the color list matches the palette used to generate the lines")]
    }
}

pub struct ColorHexRule;

impl RecordRule for ColorHexRule {
    fn name(&self) -> &'static str { "color_hex" }

    fn check(&self, record: &LineRecord, _ctx: &RecordContext<'_>) -> Vec<Diagnostic> {
        match &record.color_hex {
            Some(hex) if !is_hex_color(hex) => vec![Diagnostic::warning(
                self.name(),
                format!("color hex {:?} is not of the form #RRGGBB", hex),
            )],
            _ => vec![],
        }
    }
}

pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Records that survived validation, plus everything that was said about
/// the ones that did and did not.
#[derive(Debug, Clone, Default)]
pub struct ValidatedLines {
    pub accepted: Vec<LineRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidatedLines {
    pub fn dropped(&self) -> usize {
        // One Error is enough to drop a record; count records, not errors
        let mut positions: Vec<_> = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == ViolationSeverity::Error)
            .filter_map(|d| d.position)
            .collect();
        positions.dedup();
        positions.len()
    }
}

/// Validator orchestrates rules and applies policy
pub struct Validator {
    rules: Vec<Box<dyn RecordRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(ColorIndexRule),
                Box::new(ColorHexRule),
            ],
        }
    }

    pub fn validate(&self, records: &[Value], color_names: &[String]) -> ValidatedLines {
        let ctx = RecordContext { color_names };
        let mut out = ValidatedLines::default();

        for (position, raw) in records.iter().enumerate() {
            let record = match LineRecord::deserialize(raw) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(position, error = %e, "dropping malformed line record");
                    out.diagnostics.push(
                        Diagnostic::error("schema", format!("malformed line record: {}", e))
                            .at(position),
                    );
                    continue;
                }
            };

            let mut rejected = false;
            for rule in &self.rules {
                for diagnostic in rule.check(&record, &ctx) {
                    if diagnostic.severity == ViolationSeverity::Error {
                        rejected = true;
                    }
                    out.diagnostics.push(diagnostic.at(position));
                }
            }

            if rejected {
                tracing::warn!(position, "dropping line record that failed validation");
            } else {
                out.accepted.push(record);
            }
        }

        out
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
