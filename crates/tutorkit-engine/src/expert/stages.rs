use tutorkit_types::{head_chars, truncate_chars, Pace, SessionContext};

use super::empathy::RelationalTuner;
use super::intents::{build_next_steps, make_explanation};
use super::{Draft, ExpertTuning, APOLOGY};
use crate::error::Result;
use crate::search::SearchIndex;

/// One layer of the response pipeline.
///
/// Stages are composed at construction time and run in order over the
/// shared draft; a failing stage degrades per its contract instead of
/// aborting the turn.
pub trait PipelineStage {
    fn name(&self) -> &'static str;
    fn apply(&self, draft: &mut Draft, ctx: &mut SessionContext) -> Result<()>;
}

/// Query the knowledge index and collect the base text.
pub struct Retrieve {
    index: Box<dyn SearchIndex>,
    tuning: ExpertTuning,
}

impl Retrieve {
    pub fn new(index: Box<dyn SearchIndex>, tuning: ExpertTuning) -> Self {
        Self { index, tuning }
    }
}

impl PipelineStage for Retrieve {
    fn name(&self) -> &'static str {
        "retrieve"
    }

    fn apply(&self, draft: &mut Draft, _ctx: &mut SessionContext) -> Result<()> {
        let hits = match self.index.search(&draft.query, self.tuning.top_k) {
            Ok(hits) => hits,
            Err(err) => {
                // Retrieval trouble is not the student's problem.
                tracing::warn!(%err, "retrieval failed, degrading to apology");
                Vec::new()
            }
        };
        if hits.is_empty() {
            draft.base = APOLOGY.to_string();
            draft.sources.clear();
            return Ok(());
        }
        let joined = hits
            .iter()
            .map(|h| h.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        draft.base = head_chars(&joined, self.tuning.snippet_limit);
        draft.sources = hits.into_iter().map(|h| h.source).collect();
        Ok(())
    }
}

/// Select style from confidence and assemble answer, explanation and next
/// steps from the detected intents.
pub struct Compose {
    tuning: ExpertTuning,
}

impl Compose {
    pub fn new(tuning: ExpertTuning) -> Self {
        Self { tuning }
    }
}

impl PipelineStage for Compose {
    fn name(&self) -> &'static str {
        "compose"
    }

    fn apply(&self, draft: &mut Draft, ctx: &mut SessionContext) -> Result<()> {
        let confidence = ctx
            .progress
            .expert
            .as_ref()
            .map(|e| e.confidence)
            .unwrap_or(0.5);
        let (pace, tone) = if confidence < 0.3 {
            (Pace::Simplified, "дружелюбный наставник")
        } else if confidence > 0.7 {
            (Pace::Accelerated, "партнёр по проекту")
        } else {
            (Pace::Normal, "нейтральный преподаватель")
        };
        draft.pace = pace;
        draft.tone = tone.to_string();

        draft.answer = match draft.detail {
            tutorkit_types::Detail::Short => {
                truncate_chars(draft.base.trim(), self.tuning.brief_limit)
            }
            tutorkit_types::Detail::Long => draft.base.trim().to_string(),
        };
        draft.explanation = make_explanation(&draft.base, &draft.intents, draft.detail);
        draft.next_steps = build_next_steps(&draft.intents, ctx.progress.organizer.as_ref());
        Ok(())
    }
}

/// Empathy framing over the composed answer.
pub struct Frame {
    tuner: RelationalTuner,
}

impl Frame {
    pub fn new(tuner: RelationalTuner) -> Self {
        Self { tuner }
    }
}

impl PipelineStage for Frame {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn apply(&self, draft: &mut Draft, ctx: &mut SessionContext) -> Result<()> {
        let confidence = ctx
            .progress
            .expert
            .as_ref()
            .map(|e| e.confidence)
            .unwrap_or(0.5);
        let (empathy, framed) =
            self.tuner
                .embellish(&draft.question, &draft.answer, confidence, ctx);
        draft.empathy = empathy.clone();
        draft.answer_empathic = framed;
        ctx.progress.relational_tuner_mut().last = Some(empathy);
        Ok(())
    }
}

/// Latency bookkeeping: feed the ring, compute the running average and let
/// a persistently slow or fast student override the pace.
pub struct Instrument {
    tuning: ExpertTuning,
}

impl Instrument {
    pub fn new(tuning: ExpertTuning) -> Self {
        Self { tuning }
    }
}

impl PipelineStage for Instrument {
    fn name(&self) -> &'static str {
        "instrument"
    }

    fn apply(&self, draft: &mut Draft, ctx: &mut SessionContext) -> Result<()> {
        let expert = ctx.progress.expert_mut();
        if let Some(latency) = draft.latency_sec {
            expert.push_latency(latency, self.tuning.latency_window);
        }
        draft.latency_avg_sec = expert.latency_avg();
        if let Some(avg) = draft.latency_avg_sec {
            if avg > self.tuning.slow_latency_sec {
                draft.pace = Pace::Simplified;
            } else if avg < self.tuning.fast_latency_sec {
                draft.pace = Pace::Accelerated;
            }
        }
        Ok(())
    }
}
