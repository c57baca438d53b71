//! Expert pipeline: one student utterance in, one answer envelope out.
//!
//! The turn runs as a fixed sequence — reset check, latency measurement,
//! semantic metric update, detector pass — followed by the constructed
//! stage pipeline `Retrieve → Compose → Frame → Instrument` over a shared
//! draft, and finalization into the Expert slot.

mod empathy;
mod followup;
mod intents;
mod stages;

pub use empathy::RelationalTuner;
pub use followup::{augment_query, is_followup};
pub use intents::{build_next_steps, detect_detail, detect_intents, make_explanation};
pub use stages::{Compose, Frame, Instrument, PipelineStage, Retrieve};

use serde::{Deserialize, Serialize};

use tutorkit_types::{
    AnswerEnvelope, Detail, Empathy, EmpathyTone, Intent, Pace, SessionContext, SharedClock,
    Situation,
};

use crate::search::SearchIndex;

/// Fixed reply when retrieval has nothing to offer
pub const APOLOGY: &str = "Пока нет подходящих материалов в базе.";

/// Tunables of the expert pipeline, injected at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpertTuning {
    /// Replies faster than this read as engagement
    pub fast_latency_sec: f64,
    /// Replies slower than this read as drifting away
    pub slow_latency_sec: f64,
    /// Latency ring size
    pub latency_window: usize,
    /// Character cap of the short answer
    pub brief_limit: usize,
    /// Character cap of the concatenated retrieval base
    pub snippet_limit: usize,
    /// Documents requested per retrieval
    pub top_k: usize,
    /// Utterances that wipe the dialog memory
    pub reset_phrases: Vec<String>,
}

impl Default for ExpertTuning {
    fn default() -> Self {
        Self {
            fast_latency_sec: 12.0,
            slow_latency_sec: 45.0,
            latency_window: 8,
            brief_limit: 300,
            snippet_limit: 800,
            top_k: 2,
            reset_phrases: [
                "сброс",
                "reset",
                "забудь всё",
                "очисти память",
                "новая тема",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

/// Engagement nudge for a fast/slow reply
const ENGAGEMENT_NUDGE: f64 = 0.06;
/// Confidence nudges for negative/positive wording
const CONFIDENCE_DROP: f64 = 0.07;
const CONFIDENCE_LIFT: f64 = 0.05;

const NEGATIVE_MARKERS: &[&str] = &["не понимаю", "сложно", "устал", "плохо"];
const POSITIVE_MARKERS: &[&str] = &["получилось", "спасибо", "понятно", "легко"];

/// Outcome of one expert turn
#[derive(Debug, Clone, PartialEq)]
pub enum ExpertReply {
    /// A reset phrase wiped the dialog memory; no envelope was produced
    DialogCleared,
    Answer(Box<AnswerEnvelope>),
}

/// Work-in-progress response shared by the pipeline stages
#[derive(Debug, Clone)]
pub struct Draft {
    pub question: String,
    pub query: String,
    pub in_reply_to: Option<String>,
    pub intents: Vec<Intent>,
    pub detail: Detail,
    pub latency_sec: Option<f64>,
    pub base: String,
    pub sources: Vec<String>,
    pub answer: String,
    pub explanation: String,
    pub next_steps: Vec<String>,
    pub pace: Pace,
    pub tone: String,
    pub empathy: Empathy,
    pub answer_empathic: String,
    pub latency_avg_sec: Option<f64>,
}

pub struct ExpertPipeline {
    tuning: ExpertTuning,
    clock: SharedClock,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl ExpertPipeline {
    pub fn new(index: Box<dyn SearchIndex>, tuning: ExpertTuning, clock: SharedClock) -> Self {
        let stages: Vec<Box<dyn PipelineStage>> = vec![
            Box::new(Retrieve::new(index, tuning.clone())),
            Box::new(Compose::new(tuning.clone())),
            Box::new(Frame::new(RelationalTuner)),
            Box::new(Instrument::new(tuning.clone())),
        ];
        Self {
            tuning,
            clock,
            stages,
        }
    }

    fn is_reset(&self, text: &str) -> bool {
        let lowered = text.trim().to_lowercase();
        self.tuning
            .reset_phrases
            .iter()
            .any(|p| p.as_str() == lowered)
    }

    /// Run one turn against the session context.
    pub fn respond(&self, text: &str, ctx: &mut SessionContext) -> ExpertReply {
        let question = text.trim().to_string();

        if self.is_reset(&question) {
            ctx.progress.expert_mut().clear_dialog();
            tracing::debug!("dialog memory cleared by reset phrase");
            return ExpertReply::DialogCleared;
        }

        let now = self.clock.now_ts();
        ctx.last_user_question = Some(question.clone());

        // Latency against the previous interaction. The slot timestamp is
        // only advanced at the very end of the turn so nested readers see a
        // consistent prior value.
        let expert = ctx.progress.expert_mut();
        let latency_sec = expert
            .last_interaction_time
            .map(|prev| (now - prev).max(0.0));

        // Semantic metric update.
        if let Some(latency) = latency_sec {
            if latency <= self.tuning.fast_latency_sec {
                expert.nudge_engagement(ENGAGEMENT_NUDGE);
            } else if latency >= self.tuning.slow_latency_sec {
                expert.nudge_engagement(-ENGAGEMENT_NUDGE);
            }
        }
        let lowered = question.to_lowercase();
        if NEGATIVE_MARKERS.iter().any(|m| lowered.contains(m)) {
            expert.nudge_confidence(-CONFIDENCE_DROP);
        }
        if POSITIVE_MARKERS.iter().any(|m| lowered.contains(m)) {
            expert.nudge_confidence(CONFIDENCE_LIFT);
        }

        let (query, in_reply_to) = augment_query(&question, &expert.dialog_history);

        let mut draft = Draft {
            question: question.clone(),
            query,
            in_reply_to,
            intents: detect_intents(&question),
            detail: detect_detail(&question),
            latency_sec,
            base: String::new(),
            sources: Vec::new(),
            answer: String::new(),
            explanation: String::new(),
            next_steps: Vec::new(),
            pace: Pace::Normal,
            tone: String::new(),
            empathy: Empathy::default(),
            answer_empathic: String::new(),
            latency_avg_sec: None,
        };

        for stage in &self.stages {
            if let Err(err) = stage.apply(&mut draft, ctx) {
                tracing::warn!(stage = stage.name(), %err, "pipeline stage degraded");
                if stage.name() == "frame" {
                    frame_fallback(&mut draft);
                }
            }
        }

        let expert = ctx.progress.expert_mut();
        expert.last_interaction_time = Some(now);
        let envelope = AnswerEnvelope {
            question: draft.question,
            in_reply_to: draft.in_reply_to,
            intents: draft.intents,
            detail: draft.detail,
            answer: draft.answer,
            explanation: draft.explanation,
            sources: draft.sources,
            next_steps: draft.next_steps,
            pace: draft.pace,
            tone: draft.tone,
            engagement: expert.engagement,
            confidence: expert.confidence,
            empathy: draft.empathy,
            answer_empathic: draft.answer_empathic,
            latency_sec: draft.latency_sec,
            latency_avg_sec: draft.latency_avg_sec,
        };
        expert.push_answer(envelope.clone());
        ExpertReply::Answer(Box::new(envelope))
    }
}

/// Framing must never break response emission.
fn frame_fallback(draft: &mut Draft) {
    draft.answer_empathic = draft.answer.clone();
    draft.empathy = Empathy {
        situation: Situation::Start,
        tone: EmpathyTone::Warm,
        intro: None,
        outro: None,
    };
}
