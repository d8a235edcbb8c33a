//! Export Pipeline - Single Entry Point
//!
//! Every deck goes through `build_deck`: boundary validation, order parsing,
//! allocation, the sequence walk, pagination. Local anomalies are collected
//! into the deck's diagnostics; only structural preconditions fail the call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::addressing::NodeAddressFormatter;
use crate::allocation::AllocationTable;
use crate::hashing::{compute_deck_hash, compute_job_hash};
use crate::layout::LayoutSpec;
use crate::order::{parse_order, ParsedOrder, MAX_LOOPS};
use crate::paginate::{Page, Paginator};
use crate::presets::{Preset, PresetRegistry};
use crate::sequence::{group_by_color, ColorBucket, SequenceBuilder};
use crate::stats::DeckStats;
use crate::validation::{Diagnostic, ValidatedLines, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No colors given: at least one color bucket is required")]
    NoColors,

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Preset {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),

    #[error("Version error: {0}")]
    VersionError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Raw line generator output; decoded and checked record by record
    #[serde(alias = "lineSequence")]
    pub line_sequence: Vec<Value>,
    #[serde(alias = "colorNames")]
    pub color_names: Vec<String>,
    #[serde(default, alias = "orderSpec", alias = "group_orders")]
    pub order_spec: String,
    #[serde(default, alias = "totalPoints")]
    pub total_points: u64,
    #[serde(default)]
    pub layout: LayoutSpec,
    /// Fallback hex per color when the records carry none
    #[serde(default)]
    pub palette_hex: Vec<String>,
    #[serde(default = "default_true")]
    pub include_stats: bool,
}

impl ExportRequest {
    pub fn new(line_sequence: Vec<Value>, color_names: Vec<String>, order_spec: impl Into<String>) -> Self {
        Self {
            line_sequence,
            color_names,
            order_spec: order_spec.into(),
            total_points: 0,
            layout: LayoutSpec::default(),
            palette_hex: vec![],
            include_stats: true,
        }
    }
}

/// What an export would do, without building records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPlan {
    pub order: ParsedOrder,
    pub allocation: AllocationTable,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionDeck {
    pub id: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub deck_hash: String,
    pub job_hash: String,
    pub order: ParsedOrder,
    pub layout: LayoutSpec,
    pub total_lines: usize,
    pub emitted_lines: usize,
    /// Input records rejected at the boundary
    pub dropped_records: usize,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub stats: Option<DeckStats>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The export pipeline - single entry point for deck generation
pub struct ExportPipeline {
    registry: PresetRegistry,
    validator: Validator,
}

impl ExportPipeline {
    pub fn new(registry: PresetRegistry) -> Self {
        Self {
            registry,
            validator: Validator::new(),
        }
    }

    /// List all available presets
    pub fn list_presets(&self) -> Vec<&Preset> {
        self.registry.list()
    }

    /// Fill a request from a preset: colors, order, board size, layout.
    pub fn request_from_preset(
        &self,
        preset_id: &str,
        line_sequence: Vec<Value>,
    ) -> Result<ExportRequest, PipelineError> {
        let preset = self.registry.get(preset_id)
            .ok_or_else(|| PipelineError::PresetNotFound(preset_id.to_string()))?;

        self.check_engine_version(preset)?;

        Ok(ExportRequest {
            line_sequence,
            color_names: preset.color_names(),
            order_spec: preset.group_orders.clone(),
            total_points: preset.nodes,
            layout: preset.layout_spec(),
            palette_hex: preset.palette_hex(),
            include_stats: true,
        })
    }

    /// Check the line sequence against the request's colors
    ///
    /// This is the ONLY validation entry point.
    pub fn validate_lines(&self, request: &ExportRequest) -> Result<ValidatedLines, PipelineError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        if request.color_names.is_empty() {
            return Err(PipelineError::NoColors);
        }

        Ok(self.validator.validate(&request.line_sequence, &request.color_names))
    }

    pub fn plan(&self, request: &ExportRequest) -> Result<ExportPlan, PipelineError> {
        let (buckets, order, validated) = self.prepare(request)?;
        let mut diagnostics = validated.diagnostics;
        let lens: Vec<usize> = buckets.iter().map(ColorBucket::len).collect();
        let allocation = AllocationTable::compute(&order.indices, &lens);
        diagnostics.extend(order_diagnostics(&order));
        Ok(ExportPlan { order, allocation, diagnostics })
    }

    /// Statistics only; no order walk or pagination.
    pub fn stats(&self, request: &ExportRequest) -> Result<DeckStats, PipelineError> {
        let (buckets, _, _) = self.prepare(request)?;
        Ok(DeckStats::collect(&buckets, request.layout.mode, request.total_points))
    }

    /// Build the full paginated deck
    ///
    /// Layout is checked before any record is touched.
    #[tracing::instrument(skip_all, fields(lines = request.line_sequence.len(), order = %request.order_spec))]
    pub fn build_deck(&self, request: &ExportRequest) -> Result<InstructionDeck, PipelineError> {
        let paginator = Paginator::new(&request.layout)
            .map_err(|e| PipelineError::InvalidLayout(e.to_string()))?;

        let (buckets, order, validated) = self.prepare(request)?;
        let dropped_records = validated.dropped();
        let mut diagnostics = validated.diagnostics;
        diagnostics.extend(order_diagnostics(&order));

        let builder = SequenceBuilder::new(NodeAddressFormatter::new(request.layout.mode));
        let built = builder.build(&buckets, &order.indices);
        diagnostics.extend(built.diagnostics);

        let pages = paginator.paginate(&built.records);

        let stats = request
            .include_stats
            .then(|| DeckStats::collect(&buckets, request.layout.mode, request.total_points));

        let deck_hash = compute_deck_hash(&pages)?;
        let job_hash = compute_job_hash(request, ENGINE_VERSION)?;

        tracing::info!(
            pages = pages.len(),
            emitted = built.emitted_lines,
            total = built.total_lines,
            dropped = dropped_records,
            diagnostics = diagnostics.len(),
            "deck built"
        );

        Ok(InstructionDeck {
            id: Uuid::new_v4().to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            deck_hash,
            job_hash,
            order,
            layout: request.layout,
            total_lines: built.total_lines,
            emitted_lines: built.emitted_lines,
            dropped_records,
            pages,
            stats,
            diagnostics,
        })
    }

    fn prepare(
        &self,
        request: &ExportRequest,
    ) -> Result<(Vec<ColorBucket>, ParsedOrder, ValidatedLines), PipelineError> {
        let validated = self.validate_lines(request)?;
        let buckets = group_by_color(&validated.accepted, &request.color_names, &request.palette_hex);
        let order = parse_order(&request.order_spec, request.color_names.len());
        tracing::debug!(form = ?order.form, occurrences = order.len(), "order parsed");
        Ok((buckets, order, validated))
    }

    fn check_engine_version(&self, preset: &Preset) -> Result<(), PipelineError> {
        let engine_ver = semver::Version::parse(ENGINE_VERSION)
            .map_err(|_| PipelineError::VersionError("Invalid engine version".into()))?;
        let min_ver = semver::Version::parse(&preset.engine_min_version)
            .map_err(|_| PipelineError::VersionError("Invalid preset min version".into()))?;

        if engine_ver < min_ver {
            return Err(PipelineError::EngineVersionMismatch(
                preset.id.clone(),
                preset.engine_min_version.clone(),
                ENGINE_VERSION.to_string(),
            ));
        }

        Ok(())
    }
}

fn order_diagnostics(order: &ParsedOrder) -> Vec<Diagnostic> {
    order
        .dropped
        .iter()
        .map(|token| {
            Diagnostic::warning("order_token", format!("order token {:?} ignored", token))
                .with_remediation(format!(
                    "Use 1-based color indices separated by commas, or a loop count up to {}",
                    MAX_LOOPS
                ))
        })
        .collect()
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new(PresetRegistry::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ViolationSeverity;
    use serde_json::json;

    fn request(order: &str) -> ExportRequest {
        let lines = (0..4)
            .map(|i| json!({"step": i, "color_index": 1 + i % 2, "color_hex": "#ffffff", "from_point": i, "to_point": i + 10}))
            .collect();
        ExportRequest::new(lines, vec!["white".into(), "black".into()], order)
    }

    #[test]
    fn plan_reports_allocation_and_dropped_tokens() {
        let plan = ExportPipeline::default().plan(&request("1,9,2,1")).unwrap();
        assert_eq!(plan.order.indices, vec![1, 2, 1]);
        assert_eq!(plan.allocation.slices.len(), 3);
        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(plan.diagnostics[0].rule, "order_token");
    }

    #[test]
    fn stats_only_path() {
        let stats = ExportPipeline::default().stats(&request("1")).unwrap();
        assert_eq!(stats.total_lines, 4);
    }

    #[test]
    fn oversized_loop_count_warns_and_uses_default_order() {
        let deck = ExportPipeline::default().build_deck(&request("100000000000")).unwrap();
        assert_eq!(deck.order.indices, vec![1, 2]);
        assert_eq!(deck.diagnostics.len(), 1);
        assert_eq!(deck.diagnostics[0].rule, "order_token");
        assert_eq!(deck.diagnostics[0].severity, ViolationSeverity::Warning);
        assert_eq!(deck.emitted_lines, 4);
    }

    #[test]
    fn deck_counts_dropped_records() {
        let mut req = request("1,2");
        req.line_sequence.push(json!({"color_index": 1, "from_point": "a", "to_point": 2}));
        req.line_sequence.push(json!({"color_index": 5, "from_point": 1, "to_point": 2}));
        let deck = ExportPipeline::default().build_deck(&req).unwrap();
        assert_eq!(deck.dropped_records, 2);
        assert_eq!(deck.emitted_lines, 4);
    }

    #[test]
    fn build_fails_fast_on_bad_layout() {
        let mut req = request("1,2");
        req.layout.columns_per_page = 0;
        let err = ExportPipeline::default().build_deck(&req).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidLayout(_)));
    }

    #[test]
    fn request_deserializes_from_camel_case_payload() {
        let req: ExportRequest = serde_json::from_value(json!({
            "lineSequence": [],
            "colorNames": ["white"],
            "orderSpec": "2",
            "totalPoints": 320
        }))
        .unwrap();
        assert_eq!(req.order_spec, "2");
        assert_eq!(req.total_points, 320);
        assert!(req.include_stats);
    }
}
