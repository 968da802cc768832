//! Event timeline models produced by footage analysis.
//!
//! The analysis service returns a timeline of typed events; operators pick
//! some of them as markers for a highlight clip.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How serious a detected event is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the analysis saw happening at an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[schemars(rename_all = "lowercase")]
pub enum EventAction {
    Weapon,
    Theft,
    Suspicious,
    Normal,
    Other,
}

impl EventAction {
    /// Parse from string (case-insensitive). Unknown labels map to `Other`.
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "weapon" => EventAction::Weapon,
            "theft" => EventAction::Theft,
            "suspicious" => EventAction::Suspicious,
            "normal" => EventAction::Normal,
            _ => EventAction::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Weapon => "weapon",
            EventAction::Theft => "theft",
            EventAction::Suspicious => "suspicious",
            EventAction::Normal => "normal",
            EventAction::Other => "other",
        }
    }
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EventAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// A single event on the analysis timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEvent {
    /// Event timestamp (MM:SS or HH:MM:SS)
    pub timestamp: String,

    pub action: EventAction,

    /// What is happening at this point in the footage
    #[serde(default)]
    pub description: String,

    /// Screenshot URL at this timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    pub severity: Severity,
}

/// Analysis result for one piece of footage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FootageAnalysis {
    /// e.g. "Theft Attempt", "Weapon Detection"
    pub detection_type: String,

    /// Event timeline, in the order the analysis reported it
    #[serde(default)]
    pub timestamps: Vec<TimelineEvent>,
}

impl FootageAnalysis {
    /// Markers for every event passing `filter`.
    pub fn markers(&self, filter: &MarkerFilter) -> Vec<String> {
        select_markers(&self.timestamps, filter)
    }
}

/// Criteria for picking timeline events as clip markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkerFilter {
    /// Minimum severity to include; `None` accepts all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<Severity>,

    /// Actions to include; empty accepts all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<EventAction>,
}

impl MarkerFilter {
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    pub fn with_action(mut self, action: EventAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn matches(&self, event: &TimelineEvent) -> bool {
        let severity_ok = self
            .min_severity
            .map_or(true, |min| event.severity >= min);
        let action_ok = self.actions.is_empty() || self.actions.contains(&event.action);
        severity_ok && action_ok
    }
}

/// Timestamp text of every event passing `filter`, in input order.
pub fn select_markers(events: &[TimelineEvent], filter: &MarkerFilter) -> Vec<String> {
    events
        .iter()
        .filter(|event| filter.matches(event))
        .map(|event| event.timestamp.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(timestamp: &str, action: EventAction, severity: Severity) -> TimelineEvent {
        TimelineEvent {
            timestamp: timestamp.to_string(),
            action,
            description: String::new(),
            screenshot: None,
            severity,
        }
    }

    fn timeline() -> Vec<TimelineEvent> {
        vec![
            event("00:05", EventAction::Normal, Severity::Low),
            event("00:15", EventAction::Suspicious, Severity::Medium),
            event("00:42", EventAction::Theft, Severity::High),
            event("01:10", EventAction::Weapon, Severity::Critical),
        ]
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_default_filter_selects_everything() {
        let markers = select_markers(&timeline(), &MarkerFilter::default());
        assert_eq!(markers, vec!["00:05", "00:15", "00:42", "01:10"]);
    }

    #[test]
    fn test_min_severity_filter() {
        let filter = MarkerFilter::default().with_min_severity(Severity::High);
        assert_eq!(select_markers(&timeline(), &filter), vec!["00:42", "01:10"]);
    }

    #[test]
    fn test_action_filter() {
        let filter = MarkerFilter::default()
            .with_action(EventAction::Theft)
            .with_action(EventAction::Suspicious);
        assert_eq!(select_markers(&timeline(), &filter), vec!["00:15", "00:42"]);
    }

    #[test]
    fn test_combined_filter() {
        let filter = MarkerFilter::default()
            .with_min_severity(Severity::Medium)
            .with_action(EventAction::Weapon);
        assert_eq!(select_markers(&timeline(), &filter), vec!["01:10"]);
    }

    #[test]
    fn test_analysis_deserializes_from_service_payload() {
        let payload = serde_json::json!({
            "detectionType": "Weapon Detection",
            "timestamps": [
                {
                    "timestamp": "00:15",
                    "action": "Weapon",
                    "description": "Person draws a knife",
                    "severity": "critical"
                },
                {
                    "timestamp": "01:23",
                    "action": "Loitering",
                    "description": "Person waits near exit",
                    "screenshot": "https://cdn.example.com/shot.jpg",
                    "severity": "low"
                }
            ]
        });

        let analysis: FootageAnalysis = serde_json::from_value(payload).unwrap();
        assert_eq!(analysis.detection_type, "Weapon Detection");
        assert_eq!(analysis.timestamps[0].action, EventAction::Weapon);
        assert_eq!(analysis.timestamps[1].action, EventAction::Other);
        assert_eq!(
            analysis.markers(&MarkerFilter::default().with_min_severity(Severity::High)),
            vec!["00:15"]
        );
    }
}
