use serde::{Deserialize, Serialize};

use crate::answer::{EmpathyTone, Pace};

/// Instructional stance of the tutor at a given level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleTone {
    Mentor,
    Partner,
}

/// Teaching style mapped from the situational-leadership level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub style: String,
    pub tone: StyleTone,
    pub pace: Pace,
}

/// Ad-hoc style correction emitted by a scenario detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleUpdate {
    pub pace: Pace,
    pub tone: EmpathyTone,
}

/// Metric readings the estimator evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotivationMetrics {
    pub engagement: f64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_avg_sec: Option<f64>,
}

/// Boolean signals derived from the metrics (thresholds with hysteresis)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MotivationSignals {
    pub low_conf: bool,
    pub low_eng: bool,
    pub slow: bool,
    pub fast: bool,
    pub success: bool,
}

/// Scenario detector labels, in evaluation priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Frustration,
    LowMetrics,
    SlowResponse,
    ShortReplies,
}

/// Motivational content attached on every evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotivationContent {
    pub phrase: String,
    pub challenge: String,
}

/// One motivation estimator evaluation, recorded into the Motivator slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotivationSnapshot {
    pub level: u8,
    pub level_name: String,
    pub style: Style,
    pub metrics: MotivationMetrics,
    pub signals: MotivationSignals,
    pub triggered: Vec<Scenario>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_update: Option<StyleUpdate>,
    pub drop_count: u32,
    pub motivation: MotivationContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection_question: Option<String>,
    pub ts: f64,
}
