//! Highlight segment planning.
//!
//! Turns a set of event markers into the ordered, non-overlapping time ranges
//! that get cut from the source footage and concatenated into one clip.
//!
//! Each marker is widened by a symmetric context window, clamped at zero.
//! Windows are swept in ascending order and any window that starts at or
//! before the end of the previous one is folded into it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timestamp::{format_seconds, parse_timestamp, TimestampError};

/// Default padding applied before and after every marker.
pub const DEFAULT_CONTEXT_SECS: u64 = 5;

/// Errors from building a segment plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Malformed timestamp '{marker}': {source}")]
    MalformedTimestamp {
        marker: String,
        #[source]
        source: TimestampError,
    },

    #[error("At least one timestamp marker is required")]
    EmptyInput,

    #[error("Context window must be non-negative, got {0} seconds")]
    InvalidContext(i64),
}

/// A contiguous range of footage, in whole seconds.
///
/// Both bounds are inclusive and `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "SegmentJson")]
pub struct Segment {
    start: u64,
    end: u64,
}

impl Segment {
    /// Create a segment, returning `None` if `start > end`.
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Window of `context_secs` on either side of `marker`, clamped at zero.
    pub fn around(marker: u64, context_secs: u64) -> Self {
        Self {
            start: marker.saturating_sub(context_secs),
            end: marker.saturating_add(context_secs),
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn duration_secs(&self) -> u64 {
        self.end - self.start
    }

    /// Start formatted as `MM:SS` / `HH:MM:SS`.
    pub fn start_text(&self) -> String {
        format_seconds(self.start)
    }

    /// End formatted as `MM:SS` / `HH:MM:SS`.
    pub fn end_text(&self) -> String {
        format_seconds(self.end)
    }

    pub fn to_range(&self) -> SegmentRange {
        SegmentRange {
            start: self.start_text(),
            end: self.end_text(),
        }
    }
}

/// Wire form of a [`Segment`]: its text range plus length in seconds.
#[derive(Serialize)]
struct SegmentJson {
    start: String,
    end: String,
    duration: u64,
}

impl From<Segment> for SegmentJson {
    fn from(segment: Segment) -> Self {
        Self {
            start: segment.start_text(),
            end: segment.end_text(),
            duration: segment.duration_secs(),
        }
    }
}

/// Text form of a segment, as handed to the media cutting tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentRange {
    /// Start timestamp (MM:SS or HH:MM:SS)
    pub start: String,
    /// End timestamp (MM:SS or HH:MM:SS)
    pub end: String,
}

/// Expands markers into merged, ordered segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlanner {
    context_secs: u64,
}

impl Default for SegmentPlanner {
    fn default() -> Self {
        Self {
            context_secs: DEFAULT_CONTEXT_SECS,
        }
    }
}

impl SegmentPlanner {
    /// Create a planner with the given context window.
    ///
    /// # Errors
    /// Returns [`PlanError::InvalidContext`] for a negative window.
    pub fn new(context_secs: i64) -> Result<Self, PlanError> {
        u64::try_from(context_secs)
            .map(|context_secs| Self { context_secs })
            .map_err(|_| PlanError::InvalidContext(context_secs))
    }

    /// Create a planner from an already non-negative window.
    pub fn with_context_secs(context_secs: u64) -> Self {
        Self { context_secs }
    }

    pub fn context_secs(&self) -> u64 {
        self.context_secs
    }

    /// Build the merged segment list for `markers`.
    ///
    /// Fails on the first malformed marker; no partial plan is returned.
    pub fn build<S: AsRef<str>>(&self, markers: &[S]) -> Result<Vec<Segment>, PlanError> {
        if markers.is_empty() {
            return Err(PlanError::EmptyInput);
        }

        let mut marker_secs = markers
            .iter()
            .map(|marker| {
                let marker = marker.as_ref();
                parse_timestamp(marker).map_err(|source| PlanError::MalformedTimestamp {
                    marker: marker.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<u64>, PlanError>>()?;
        marker_secs.sort_unstable();

        let mut segments: Vec<Segment> = Vec::with_capacity(marker_secs.len());
        for marker in marker_secs {
            let candidate = Segment::around(marker, self.context_secs);
            match segments.last_mut() {
                Some(last) if candidate.start <= last.end => {
                    last.end = last.end.max(candidate.end);
                }
                _ => segments.push(candidate),
            }
        }

        Ok(segments)
    }

    /// Build a [`ClipPlan`] for `markers`.
    pub fn plan<S: AsRef<str>>(&self, markers: &[S]) -> Result<ClipPlan, PlanError> {
        Ok(ClipPlan {
            segments: self.build(markers)?,
            context_secs: self.context_secs,
        })
    }
}

/// Build merged segments for `markers` with a `context_secs` window.
///
/// # Examples
/// ```
/// use vigil_models::segment::build_segments;
/// let segments = build_segments(&["00:10", "00:18"], 5).unwrap();
/// assert_eq!(segments.len(), 1);
/// assert_eq!(segments[0].start_text(), "00:05");
/// assert_eq!(segments[0].end_text(), "00:23");
/// ```
pub fn build_segments<S: AsRef<str>>(
    markers: &[S],
    context_secs: i64,
) -> Result<Vec<Segment>, PlanError> {
    SegmentPlanner::new(context_secs)?.build(markers)
}

/// An ordered editing plan: cut each segment, then concatenate in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipPlan {
    segments: Vec<Segment>,
    context_secs: u64,
}

impl ClipPlan {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn context_secs(&self) -> u64 {
        self.context_secs
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Sum of segment durations in seconds.
    pub fn total_duration_secs(&self) -> u64 {
        self.segments.iter().map(Segment::duration_secs).sum()
    }

    /// Segments in text form, in concatenation order.
    pub fn ranges(&self) -> Vec<SegmentRange> {
        self.segments.iter().map(Segment::to_range).collect()
    }
}

impl<'a> IntoIterator for &'a ClipPlan {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(segments: &[Segment]) -> Vec<(String, String)> {
        segments
            .iter()
            .map(|s| (s.start_text(), s.end_text()))
            .collect()
    }

    fn pair(start: &str, end: &str) -> (String, String) {
        (start.to_string(), end.to_string())
    }

    #[test]
    fn test_single_marker() {
        let segments = build_segments(&["01:00"], 5).unwrap();
        assert_eq!(ranges(&segments), vec![pair("00:55", "01:05")]);
        assert_eq!(segments[0].duration_secs(), 10);
    }

    #[test]
    fn test_clamps_at_zero() {
        let segments = build_segments(&["00:02"], 5).unwrap();
        assert_eq!(ranges(&segments), vec![pair("00:00", "00:07")]);
    }

    #[test]
    fn test_overlapping_windows_merge() {
        let segments = build_segments(&["00:10", "00:18"], 5).unwrap();
        assert_eq!(ranges(&segments), vec![pair("00:05", "00:23")]);
    }

    #[test]
    fn test_touching_windows_merge() {
        // [5,15] and [15,25]
        let segments = build_segments(&["00:10", "00:20"], 5).unwrap();
        assert_eq!(ranges(&segments), vec![pair("00:05", "00:25")]);
    }

    #[test]
    fn test_disjoint_windows_stay_separate() {
        let segments = build_segments(&["00:10", "01:00"], 5).unwrap();
        assert_eq!(
            ranges(&segments),
            vec![pair("00:05", "00:15"), pair("00:55", "01:05")]
        );
    }

    #[test]
    fn test_adjacent_but_not_touching_stay_separate() {
        // [5,15] and [16,26]
        let segments = build_segments(&["00:10", "00:21"], 5).unwrap();
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_duplicates_collapse() {
        let segments = build_segments(&["00:10", "00:10"], 5).unwrap();
        assert_eq!(ranges(&segments), vec![pair("00:05", "00:15")]);
    }

    #[test]
    fn test_order_independent() {
        let forward = build_segments(&["00:10", "01:00"], 5).unwrap();
        let reversed = build_segments(&["01:00", "00:10"], 5).unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_chain_of_overlaps_folds_into_one() {
        let segments = build_segments(&["00:40", "00:10", "00:30", "00:20"], 5).unwrap();
        assert_eq!(ranges(&segments), vec![pair("00:05", "00:45")]);
    }

    #[test]
    fn test_mixed_formats_and_hour_boundary() {
        let segments = build_segments(&["59:58", "01:00:30"], 5).unwrap();
        assert_eq!(
            ranges(&segments),
            vec![pair("59:53", "01:00:03"), pair("01:00:25", "01:00:35")]
        );
    }

    #[test]
    fn test_zero_context_produces_point_segments() {
        let segments = build_segments(&["00:10", "00:10", "00:11"], 0).unwrap();
        assert_eq!(
            ranges(&segments),
            vec![pair("00:10", "00:10"), pair("00:11", "00:11")]
        );
        assert_eq!(segments[0].duration_secs(), 0);
    }

    #[test]
    fn test_end_is_not_clamped_to_any_duration() {
        let segments = build_segments(&["10:00:00"], 30).unwrap();
        assert_eq!(segments[0].end(), 36_030);
    }

    #[test]
    fn test_empty_input_fails() {
        let markers: [&str; 0] = [];
        assert_eq!(build_segments(&markers, 5), Err(PlanError::EmptyInput));
    }

    #[test]
    fn test_malformed_marker_aborts_whole_plan() {
        let result = build_segments(&["00:10", "abc"], 5);
        match result {
            Err(PlanError::MalformedTimestamp { marker, source }) => {
                assert_eq!(marker, "abc");
                assert!(matches!(source, TimestampError::InvalidFormat(_)));
            }
            other => panic!("expected MalformedTimestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_context_fails() {
        assert_eq!(
            build_segments(&["00:10"], -1),
            Err(PlanError::InvalidContext(-1))
        );
    }

    #[test]
    fn test_output_is_sorted_and_disjoint() {
        let markers = ["03:00", "00:01", "01:59", "02:03", "00:09", "10:00", "00:04"];
        let segments = build_segments(&markers, 5).unwrap();
        for pair in segments.windows(2) {
            assert!(pair[0].end() < pair[1].start());
        }
        for segment in &segments {
            assert!(segment.start() <= segment.end());
        }
    }

    #[test]
    fn test_segment_new_rejects_inverted_range() {
        assert!(Segment::new(10, 5).is_none());
        assert_eq!(Segment::new(5, 10).map(|s| s.duration_secs()), Some(5));
    }

    #[test]
    fn test_plan_totals_and_ranges() {
        let plan = SegmentPlanner::default()
            .plan(&["00:10", "01:00"])
            .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.context_secs(), DEFAULT_CONTEXT_SECS);
        assert_eq!(plan.total_duration_secs(), 20);
        assert_eq!(
            plan.ranges(),
            vec![
                SegmentRange { start: "00:05".into(), end: "00:15".into() },
                SegmentRange { start: "00:55".into(), end: "01:05".into() },
            ]
        );
    }

    #[test]
    fn test_segment_serializes_with_duration() {
        let segment = Segment::around(60, 5);
        let json = serde_json::to_value(segment).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "start": "00:55", "end": "01:05", "duration": 10 })
        );

        let clamped = serde_json::to_value(Segment::around(2, 5)).unwrap();
        assert_eq!(
            clamped,
            serde_json::json!({ "start": "00:00", "end": "00:07", "duration": 7 })
        );
    }
}
