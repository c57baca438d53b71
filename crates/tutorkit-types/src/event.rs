use serde::{Deserialize, Serialize};

use crate::answer::{AnswerEnvelope, EmpathyTone};
use crate::motivation::MotivationSnapshot;
use crate::slots::{Goals, LessonSummary, LogRecord, OrganizerSlot, WordTiming};
use crate::stage::Stage;

/// Canonical event types dispatched over the session bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Init,
    StudentQuestion,
    StudentReflection,
    ExpertAnswer,
    GoalsReady,
    TasksReady,
    OrganizerUpdate,
    MotivationUpdate,
    AskReflection,
    ReflectionAnswer,
    StageChanged,
    LessonFinished,
    Restart,
    TtsDone,
    TtsFailed,
    Error,
    Warning,
}

impl EventType {
    pub const ALL: [EventType; 17] = [
        EventType::Init,
        EventType::StudentQuestion,
        EventType::StudentReflection,
        EventType::ExpertAnswer,
        EventType::GoalsReady,
        EventType::TasksReady,
        EventType::OrganizerUpdate,
        EventType::MotivationUpdate,
        EventType::AskReflection,
        EventType::ReflectionAnswer,
        EventType::StageChanged,
        EventType::LessonFinished,
        EventType::Restart,
        EventType::TtsDone,
        EventType::TtsFailed,
        EventType::Error,
        EventType::Warning,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventType::Init => "init",
            EventType::StudentQuestion => "student_question",
            EventType::StudentReflection => "student_reflection",
            EventType::ExpertAnswer => "expert_answer",
            EventType::GoalsReady => "goals_ready",
            EventType::TasksReady => "tasks_ready",
            EventType::OrganizerUpdate => "organizer_update",
            EventType::MotivationUpdate => "motivation_update",
            EventType::AskReflection => "ask_reflection",
            EventType::ReflectionAnswer => "reflection_answer",
            EventType::StageChanged => "stage_changed",
            EventType::LessonFinished => "lesson_finished",
            EventType::Restart => "restart",
            EventType::TtsDone => "tts_done",
            EventType::TtsFailed => "tts_failed",
            EventType::Error => "error",
            EventType::Warning => "warning",
        }
    }
}

/// Restart scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartMode {
    Stage,
    Full,
}

/// Typed event payloads. The variant determines the event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    Init,
    StudentQuestion {
        text: String,
    },
    StudentReflection {
        text: String,
    },
    ExpertAnswer {
        question: String,
        answer: Box<AnswerEnvelope>,
    },
    GoalsReady {
        goals: Goals,
    },
    TasksReady {
        has_tasks: bool,
    },
    OrganizerUpdate {
        organizer: Box<OrganizerSlot>,
    },
    MotivationUpdate {
        last: Box<MotivationSnapshot>,
    },
    AskReflection {
        reason: String,
        turns: u32,
    },
    ReflectionAnswer {
        text: String,
    },
    StageChanged {
        stage: Stage,
        reason: Option<String>,
    },
    LessonFinished {
        summary: Box<LessonSummary>,
    },
    Restart {
        mode: RestartMode,
        reason: Option<String>,
    },
    TtsDone {
        text: String,
        audio: String,
        sr: u32,
        word_ts: Vec<WordTiming>,
        phonemes: Vec<String>,
        emotion: EmpathyTone,
    },
    TtsFailed {
        reason: String,
        fallback_text: String,
    },
    Error {
        reason: String,
        during: String,
    },
    Warning {
        msg: String,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::Init => EventType::Init,
            EventPayload::StudentQuestion { .. } => EventType::StudentQuestion,
            EventPayload::StudentReflection { .. } => EventType::StudentReflection,
            EventPayload::ExpertAnswer { .. } => EventType::ExpertAnswer,
            EventPayload::GoalsReady { .. } => EventType::GoalsReady,
            EventPayload::TasksReady { .. } => EventType::TasksReady,
            EventPayload::OrganizerUpdate { .. } => EventType::OrganizerUpdate,
            EventPayload::MotivationUpdate { .. } => EventType::MotivationUpdate,
            EventPayload::AskReflection { .. } => EventType::AskReflection,
            EventPayload::ReflectionAnswer { .. } => EventType::ReflectionAnswer,
            EventPayload::StageChanged { .. } => EventType::StageChanged,
            EventPayload::LessonFinished { .. } => EventType::LessonFinished,
            EventPayload::Restart { .. } => EventType::Restart,
            EventPayload::TtsDone { .. } => EventType::TtsDone,
            EventPayload::TtsFailed { .. } => EventType::TtsFailed,
            EventPayload::Error { .. } => EventType::Error,
            EventPayload::Warning { .. } => EventType::Warning,
        }
    }

    /// Key names present in the payload. Logged instead of values so the
    /// bus log stays small and free of student text.
    pub fn payload_keys(&self) -> Vec<&'static str> {
        match self {
            EventPayload::Init => vec![],
            EventPayload::StudentQuestion { .. }
            | EventPayload::StudentReflection { .. }
            | EventPayload::ReflectionAnswer { .. } => vec!["text"],
            EventPayload::ExpertAnswer { .. } => vec!["question", "answer"],
            EventPayload::GoalsReady { .. } => vec!["goals"],
            EventPayload::TasksReady { .. } => vec!["has_tasks"],
            EventPayload::OrganizerUpdate { .. } => vec!["organizer"],
            EventPayload::MotivationUpdate { .. } => vec!["last"],
            EventPayload::AskReflection { .. } => vec!["reason", "turns"],
            EventPayload::StageChanged { reason, .. } => match reason {
                Some(_) => vec!["stage", "reason"],
                None => vec!["stage"],
            },
            EventPayload::LessonFinished { .. } => vec!["summary"],
            EventPayload::Restart { reason, .. } => match reason {
                Some(_) => vec!["mode", "reason"],
                None => vec!["mode"],
            },
            EventPayload::TtsDone { .. } => {
                vec!["text", "audio", "sr", "word_ts", "phonemes", "emotion"]
            }
            EventPayload::TtsFailed { .. } => vec!["reason", "fallback_text"],
            EventPayload::Error { .. } => vec!["reason", "during"],
            EventPayload::Warning { .. } => vec!["msg"],
        }
    }
}

/// A dispatched event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub source: String,
    pub ts: f64,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(source: impl Into<String>, ts: f64, payload: EventPayload) -> Self {
        Self {
            event_type: payload.event_type(),
            source: source.into(),
            ts,
            payload,
        }
    }

    /// Keys-only projection appended to the bus log.
    pub fn to_log_record(&self) -> LogRecord {
        LogRecord {
            ts: self.ts,
            event_type: self.event_type.name().to_string(),
            source: self.source.clone(),
            payload_keys: self
                .payload
                .payload_keys()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
