//! ThreadDeck Core - Thread Art Instruction Deck Engine
//!
//! # Guarantees
//! 1. Every accepted line is printed exactly once
//! 2. Order strings never fail, they degrade
//! 3. Split remainders go to the earliest occurrences
//! 4. Same inputs, same deck
//! 5. No page holds more content rows than it has slots
//! 6. Local anomalies are reported, never fatal

pub mod addressing;
pub mod order;
pub mod allocation;
pub mod validation;
pub mod sequence;
pub mod layout;
pub mod paginate;
pub mod stats;
pub mod presets;
pub mod hashing;
pub mod pipeline;

pub use addressing::{AddressingMode, NodeAddress, NodeAddressFormatter, Side};
pub use order::{parse_order, OrderForm, ParsedOrder};
pub use allocation::{split_lengths, AllocationTable, SliceAllocation};
pub use validation::{Diagnostic, LineRecord, Validator, ViolationSeverity};
pub use sequence::{ColorBucket, ColorMeta, Connection, InstructionRecord, SequenceBuilder};
pub use layout::{ColumnBreak, LayoutAuthority, LayoutSpec};
pub use paginate::{Page, PageEntry, Paginator};
pub use stats::DeckStats;
pub use presets::{Preset, PresetRegistry};
pub use hashing::{canonical_json, compute_deck_hash, compute_job_hash};
pub use pipeline::{ExportPipeline, ExportPlan, ExportRequest, InstructionDeck, PipelineError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
