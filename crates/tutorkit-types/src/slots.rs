use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use uuid::Uuid;

use crate::answer::{AnswerEnvelope, Empathy};
use crate::motivation::{MotivationSnapshot, Style};
use crate::stage::Stage;
use crate::task::Task;
use crate::util::clip01;

/// FIFO cap on the event-bus log
pub const BUS_LOG_LIMIT: usize = 200;
/// Cap on retained motivation snapshots
pub const MOTIVATOR_HISTORY_LIMIT: usize = 20;

/// Lesson goals derived by the cartographer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Goals {
    pub main_goal: String,
    pub subgoals: Vec<String>,
    pub level: String,
}

/// Knowledge fragments grouped by kind, capped at five per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct KnowledgeTypes {
    pub facts: Vec<String>,
    pub procedures: Vec<String>,
    pub meta: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CartographerSlot {
    pub goals: Goals,
    pub knowledge_types: KnowledgeTypes,
    pub text_map: String,
    pub doc_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OrganizerSlot {
    pub tasks: Vec<Task>,
}

impl OrganizerSlot {
    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }
}

/// Expert state: dialog memory plus the semantic metrics the motivator reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertSlot {
    pub dialog_history: Vec<AnswerEnvelope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_answer: Option<AnswerEnvelope>,
    pub engagement: f64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_interaction_time: Option<f64>,
    pub latency_buffer: VecDeque<f64>,
}

impl Default for ExpertSlot {
    fn default() -> Self {
        Self {
            dialog_history: Vec::new(),
            last_answer: None,
            // Neutral midpoint; a fresh student is neither engaged nor lost.
            engagement: 0.5,
            confidence: 0.5,
            last_interaction_time: None,
            latency_buffer: VecDeque::new(),
        }
    }
}

impl ExpertSlot {
    pub fn nudge_engagement(&mut self, delta: f64) {
        self.engagement = clip01(self.engagement + delta);
    }

    pub fn nudge_confidence(&mut self, delta: f64) {
        self.confidence = clip01(self.confidence + delta);
    }

    /// Append to the latency ring, dropping the oldest samples past `window`.
    pub fn push_latency(&mut self, latency_sec: f64, window: usize) {
        self.latency_buffer.push_back(latency_sec);
        while self.latency_buffer.len() > window {
            self.latency_buffer.pop_front();
        }
    }

    pub fn latency_avg(&self) -> Option<f64> {
        if self.latency_buffer.is_empty() {
            return None;
        }
        Some(self.latency_buffer.iter().sum::<f64>() / self.latency_buffer.len() as f64)
    }

    /// Append an envelope; `last_answer` always mirrors the tail of history.
    pub fn push_answer(&mut self, envelope: AnswerEnvelope) {
        self.dialog_history.push(envelope.clone());
        self.last_answer = Some(envelope);
    }

    pub fn clear_dialog(&mut self) {
        self.dialog_history.clear();
        self.last_answer = None;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MotivatorSlot {
    pub level: u8,
    pub history: Vec<MotivationSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<MotivationSnapshot>,
    pub drop_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_ts: Option<f64>,
}

impl MotivatorSlot {
    pub fn seeded(level: u8) -> Self {
        Self {
            level: level.clamp(1, 4),
            ..Self::default()
        }
    }

    /// Record a snapshot, keeping the history bounded.
    pub fn record(&mut self, snapshot: MotivationSnapshot) {
        self.level = snapshot.level;
        self.drop_count = snapshot.drop_count;
        self.last_seen_ts = Some(snapshot.ts);
        self.history.push(snapshot.clone());
        let overflow = self.history.len().saturating_sub(MOTIVATOR_HISTORY_LIMIT);
        if overflow > 0 {
            self.history.drain(..overflow);
        }
        self.last = Some(snapshot);
    }
}

/// Summary computed at wrapup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonSummary {
    pub topic: String,
    pub answers_count: usize,
    pub work_turns: u32,
    pub tasks_available: bool,
    pub motivation_level: u8,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConductorSlot {
    pub stage: Stage,
    pub work_turns: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LessonSummary>,
    pub timestamps: BTreeMap<String, f64>,
}

/// One bus log record. Carries payload key names only, never values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub ts: f64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub payload_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSlot {
    pub id: Uuid,
    pub log: Vec<LogRecord>,
}

impl Default for BusSlot {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            log: Vec::new(),
        }
    }
}

impl BusSlot {
    /// Append a record with FIFO truncation at `limit`.
    pub fn push(&mut self, record: LogRecord, limit: usize) {
        self.log.push(record);
        let overflow = self.log.len().saturating_sub(limit);
        if overflow > 0 {
            self.log.drain(..overflow);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReflectionSlot {
    pub asked: Vec<String>,
    pub answers: Vec<String>,
}

/// Word-level timing returned by a synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub t0: f64,
    pub t1: f64,
    pub word: String,
}

/// Cached synthesis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsRecord {
    pub path: String,
    pub sr: u32,
    pub word_ts: Vec<WordTiming>,
    pub phonemes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TtsSlot {
    pub cache: HashMap<String, TtsRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Last empathy descriptor applied by the relational tuner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TunerSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<Empathy>,
}
