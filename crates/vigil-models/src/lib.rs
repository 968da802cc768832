//! Shared models for the vigil highlight-clip backend.
//!
//! This crate is pure computation with no I/O:
//! - Timestamp parsing and formatting (`MM:SS` / `HH:MM:SS`)
//! - Segment planning: context windows, overlap merging, ordering
//! - Event timeline types and marker selection

pub mod event;
pub mod segment;
pub mod timestamp;

// Re-export common types
pub use event::{select_markers, EventAction, FootageAnalysis, MarkerFilter, Severity, TimelineEvent};
pub use segment::{
    build_segments, ClipPlan, PlanError, Segment, SegmentPlanner, SegmentRange,
    DEFAULT_CONTEXT_SECS,
};
pub use timestamp::{
    format_duration_label, format_fractional_seconds, format_seconds, parse_timestamp,
    TimestampError,
};
