use serde::{Deserialize, Serialize};

/// Question intent detected from the student utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Why,
    How,
    WhatIf,
    Examples,
}

/// Requested level of detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Detail {
    #[default]
    Short,
    Long,
}

/// Presentation pace. The values are surfaced to the student verbatim,
/// hence the Russian wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Pace {
    #[serde(rename = "упрощённый")]
    Simplified,
    #[default]
    #[serde(rename = "обычный")]
    Normal,
    #[serde(rename = "ускоренный")]
    Accelerated,
    #[serde(rename = "замедленный")]
    Slowed,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Simplified => "упрощённый",
            Pace::Normal => "обычный",
            Pace::Accelerated => "ускоренный",
            Pace::Slowed => "замедленный",
        }
    }
}

/// Discrete relational situation selecting empathy phrasing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Situation {
    #[default]
    Start,
    Success,
    Error,
    Doubt,
    Frustration,
    HelpRequest,
    End,
}

impl Situation {
    /// Situations framed before the answer; the rest go after it.
    pub fn prefers_intro(&self) -> bool {
        !matches!(self, Situation::Success | Situation::End)
    }
}

/// Emotional coloring of the empathy phrase; doubles as the TTS emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmpathyTone {
    Warm,
    #[default]
    Neutral,
    Calm,
    Excited,
}

impl EmpathyTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmpathyTone::Warm => "warm",
            EmpathyTone::Neutral => "neutral",
            EmpathyTone::Calm => "calm",
            EmpathyTone::Excited => "excited",
        }
    }
}

/// Empathy descriptor attached to every answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Empathy {
    pub situation: Situation,
    pub tone: EmpathyTone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outro: Option<String>,
}

/// The structured response record produced by the expert pipeline for one
/// turn. Appended to `ExpertSlot::dialog_history`; `last_answer` always
/// equals the last appended envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEnvelope {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    pub intents: Vec<Intent>,
    pub detail: Detail,
    pub answer: String,
    pub explanation: String,
    pub sources: Vec<String>,
    pub next_steps: Vec<String>,
    pub pace: Pace,
    pub tone: String,
    pub engagement: f64,
    pub confidence: f64,
    pub empathy: Empathy,
    pub answer_empathic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_avg_sec: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pace_wire_names() {
        assert_eq!(
            serde_json::to_string(&Pace::Simplified).unwrap(),
            "\"упрощённый\""
        );
        let back: Pace = serde_json::from_str("\"замедленный\"").unwrap();
        assert_eq!(back, Pace::Slowed);
    }

    #[test]
    fn test_situation_placement_policy() {
        assert!(Situation::Frustration.prefers_intro());
        assert!(Situation::Doubt.prefers_intro());
        assert!(Situation::Start.prefers_intro());
        assert!(!Situation::Success.prefers_intro());
        assert!(!Situation::End.prefers_intro());
    }
}
