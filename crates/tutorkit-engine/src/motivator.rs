//! Motivation estimator: a four-level situational model over the expert
//! metrics, with hysteresis on the thresholds and priority-ordered scenario
//! detectors.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use tutorkit_types::{
    token_count, EmpathyTone, MotivationContent, MotivationMetrics, MotivationSignals,
    MotivationSnapshot, MotivatorSlot, Pace, Scenario, SessionContext, SharedClock, Style,
    StyleTone, StyleUpdate, TaskStatus,
};

/// Thresholds of the estimator, injected at construction
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MotivatorTuning {
    pub conf_low: f64,
    pub conf_high: f64,
    pub eng_low: f64,
    pub eng_high: f64,
    pub lat_slow_sec: f64,
    pub lat_fast_sec: f64,
    pub hysteresis: f64,
}

impl Default for MotivatorTuning {
    fn default() -> Self {
        Self {
            conf_low: 0.38,
            conf_high: 0.72,
            eng_low: 0.40,
            eng_high: 0.68,
            lat_slow_sec: 45.0,
            lat_fast_sec: 12.0,
            hysteresis: 0.06,
        }
    }
}

/// Scenario keyword set; superset of the expert's negative markers
const FRUSTRATION_MARKERS: &[&str] = &["не понимаю", "сложно", "устал", "не получается"];

/// Metric floor below which the student counts as disengaged
const LOW_METRIC_FLOOR: f64 = 0.4;
/// A reply of this many tokens or fewer counts as a short reply
const SHORT_REPLY_TOKENS: usize = 3;
/// Scenario matches before a reflection prompt is forced
const REFLECTION_DROP_THRESHOLD: u32 = 3;

const REFLECTION_PROMPTS: &[&str] = &[
    "Что в сегодняшней теме было самым сложным?",
    "Какой шаг ты сделал бы по-другому?",
    "Что помогло тебе продвинуться сегодня?",
    "Какую часть материала стоит повторить?",
    "Чему ты научился за это занятие?",
];

struct LevelProfile {
    name: &'static str,
    style: &'static str,
    tone: StyleTone,
    pace: Pace,
    phrases: &'static [&'static str],
    challenges: &'static [&'static str],
}

/// Situational-leadership ladder: directing → coaching → supporting →
/// delegating.
fn level_profile(level: u8) -> &'static LevelProfile {
    const LEVELS: [LevelProfile; 4] = [
        LevelProfile {
            name: "новичок",
            style: "директивный",
            tone: StyleTone::Mentor,
            pace: Pace::Simplified,
            phrases: &[
                "Отличный старт! Каждый шаг делает тебя увереннее.",
                "Ты только начинаешь, и это уже смело.",
            ],
            challenges: &[
                "Повтори за мной один приём и опиши его своими словами.",
                "Найди в материалах одно новое понятие и объясни его.",
            ],
        },
        LevelProfile {
            name: "разочарованный ученик",
            style: "наставнический",
            tone: StyleTone::Mentor,
            pace: Pace::Normal,
            phrases: &[
                "Спад — это часть пути. Продолжим в удобном темпе.",
                "Сложности сейчас — признак того, что ты растёшь.",
            ],
            challenges: &[
                "Выбери самый непонятный фрагмент и задай по нему вопрос.",
                "Сделай маленький шаг: выполни первую часть задания.",
            ],
        },
        LevelProfile {
            name: "способный, но осторожный",
            style: "поддерживающий",
            tone: StyleTone::Partner,
            pace: Pace::Normal,
            phrases: &[
                "У тебя уже получается — доверяй своим решениям.",
                "Ты знаешь больше, чем тебе кажется.",
            ],
            challenges: &[
                "Реши задание без подсказок и сверься с критериями.",
                "Объясни тему так, как объяснил бы однокурснику.",
            ],
        },
        LevelProfile {
            name: "самостоятельный",
            style: "делегирующий",
            tone: StyleTone::Partner,
            pace: Pace::Accelerated,
            phrases: &[
                "Отличный уровень — выбирай себе вызов сам.",
                "Ты ведёшь занятие не хуже преподавателя.",
            ],
            challenges: &[
                "Придумай собственный кейс и разбери его по критериям.",
                "Найди слабое место в готовом примере и предложи правку.",
            ],
        },
    ];
    &LEVELS[usize::from(level.clamp(1, 4)) - 1]
}

pub struct Motivator {
    tuning: MotivatorTuning,
    clock: SharedClock,
}

impl Motivator {
    pub fn new(tuning: MotivatorTuning, clock: SharedClock) -> Self {
        Self { tuning, clock }
    }

    /// Evaluate one turn: derive signals, shift the level by at most one
    /// step, run the scenario detectors and record a snapshot into the
    /// Motivator slot.
    pub fn evaluate(&self, question: &str, ctx: &mut SessionContext) -> MotivationSnapshot {
        let now = self.clock.now_ts();
        let t = &self.tuning;

        let (engagement, confidence, latency_avg, last_latency) = match &ctx.progress.expert {
            Some(expert) => (
                expert.engagement,
                expert.confidence,
                expert.latency_avg(),
                expert.last_answer.as_ref().and_then(|a| a.latency_sec),
            ),
            None => (0.5, 0.5, None, None),
        };
        let last_task_status = last_task_status(ctx);

        if ctx.progress.motivator.is_none() {
            ctx.progress.motivator = Some(MotivatorSlot::seeded(ctx.student_level));
        }
        let (prev_level, prev_drop_count, prev_prompt) = {
            let slot = ctx.progress.motivator_mut();
            (
                slot.level,
                slot.drop_count,
                slot.history
                    .iter()
                    .rev()
                    .find_map(|s| s.reflection_question.clone()),
            )
        };

        let signals = MotivationSignals {
            low_conf: confidence < t.conf_low - t.hysteresis,
            low_eng: engagement < t.eng_low - t.hysteresis,
            slow: latency_avg.is_some_and(|v| v > t.lat_slow_sec),
            fast: latency_avg.is_some_and(|v| v < t.lat_fast_sec),
            success: last_task_status == Some(TaskStatus::Completed)
                || confidence > t.conf_high + t.hysteresis,
        };

        // At most one step per evaluation; hysteresis keeps mid-band
        // readings from oscillating the level.
        let level = if signals.low_conf || signals.low_eng || signals.slow {
            prev_level.saturating_sub(1).max(1)
        } else if signals.success && (engagement > t.eng_high || signals.fast) {
            (prev_level + 1).min(4)
        } else {
            prev_level
        };

        let (triggered, reaction, style_update) =
            self.detect_scenarios(question, engagement, confidence, last_latency, latency_avg);
        let drop_count = prev_drop_count + triggered.len() as u32;

        let reflection_question = if drop_count >= REFLECTION_DROP_THRESHOLD
            || (signals.low_conf && signals.low_eng)
        {
            Some(pick_prompt(prev_prompt.as_deref()))
        } else {
            None
        };

        let profile = level_profile(level);
        let mut rng = rand::thread_rng();
        let motivation = MotivationContent {
            phrase: profile
                .phrases
                .choose(&mut rng)
                .copied()
                .unwrap_or_default()
                .to_string(),
            challenge: profile
                .challenges
                .choose(&mut rng)
                .copied()
                .unwrap_or_default()
                .to_string(),
        };

        let snapshot = MotivationSnapshot {
            level,
            level_name: profile.name.to_string(),
            style: Style {
                style: profile.style.to_string(),
                tone: profile.tone,
                pace: profile.pace,
            },
            metrics: MotivationMetrics {
                engagement,
                confidence,
                latency_avg_sec: latency_avg,
            },
            signals,
            triggered,
            reaction,
            style_update,
            drop_count,
            motivation,
            reflection_question,
            ts: now,
        };

        tracing::debug!(
            level = snapshot.level,
            drop_count = snapshot.drop_count,
            triggered = snapshot.triggered.len(),
            "motivation evaluated"
        );
        ctx.progress.motivator_mut().record(snapshot.clone());
        snapshot
    }

    /// Priority-ordered detectors; the first match wins and bumps the drop
    /// counter.
    fn detect_scenarios(
        &self,
        question: &str,
        engagement: f64,
        confidence: f64,
        last_latency: Option<f64>,
        latency_avg: Option<f64>,
    ) -> (Vec<Scenario>, Option<String>, Option<StyleUpdate>) {
        let lowered = question.to_lowercase();
        let effective_latency = last_latency.or(latency_avg);

        if FRUSTRATION_MARKERS.iter().any(|m| lowered.contains(m)) {
            return (
                vec![Scenario::Frustration],
                Some("Вижу, что сейчас трудно. Сбавим темп и разберём по шагам.".to_string()),
                Some(StyleUpdate {
                    pace: Pace::Slowed,
                    tone: EmpathyTone::Warm,
                }),
            );
        }
        if engagement < LOW_METRIC_FLOOR || confidence < LOW_METRIC_FLOOR {
            return (
                vec![Scenario::LowMetrics],
                Some("Поддержу примерами и короткими шагами.".to_string()),
                Some(StyleUpdate {
                    pace: Pace::Normal,
                    tone: EmpathyTone::Warm,
                }),
            );
        }
        if effective_latency.is_some_and(|v| v > self.tuning.lat_slow_sec) {
            return (
                vec![Scenario::SlowResponse],
                Some("Не торопись, у нас достаточно времени.".to_string()),
                Some(StyleUpdate {
                    pace: Pace::Slowed,
                    tone: EmpathyTone::Neutral,
                }),
            );
        }
        if token_count(question) <= SHORT_REPLY_TOKENS {
            return (
                vec![Scenario::ShortReplies],
                Some("Попробуй сформулировать мысль чуть подробнее.".to_string()),
                Some(StyleUpdate {
                    pace: Pace::Slowed,
                    tone: EmpathyTone::Warm,
                }),
            );
        }
        (Vec::new(), None, None)
    }

    /// Record the student's answer to a reflection prompt.
    pub fn record_reflection_answer(&self, ctx: &mut SessionContext, text: &str) {
        ctx.progress.reflection_mut().answers.push(text.to_string());
    }
}

/// Status of the most recently touched task: latest end time, then latest
/// start time, then the last task that left `not_started`.
fn last_task_status(ctx: &SessionContext) -> Option<TaskStatus> {
    let organizer = ctx.progress.organizer.as_ref()?;
    let by_end = organizer
        .tasks
        .iter()
        .filter(|t| t.end_time.is_some())
        .max_by(|a, b| a.end_time.partial_cmp(&b.end_time).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(task) = by_end {
        return Some(task.status);
    }
    let by_start = organizer
        .tasks
        .iter()
        .filter(|t| t.start_time.is_some())
        .max_by(|a, b| {
            a.start_time
                .partial_cmp(&b.start_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if let Some(task) = by_start {
        return Some(task.status);
    }
    organizer
        .tasks
        .iter()
        .rev()
        .find(|t| t.status != TaskStatus::NotStarted)
        .map(|t| t.status)
}

/// Pick a reflection prompt, avoiding an immediate repeat of the previous
/// one.
fn pick_prompt(previous: Option<&str>) -> String {
    let mut rng = rand::thread_rng();
    let candidates: Vec<&&str> = REFLECTION_PROMPTS
        .iter()
        .filter(|p| Some(**p) != previous)
        .collect();
    candidates
        .choose(&mut rng)
        .map(|p| p.to_string())
        .unwrap_or_else(|| REFLECTION_PROMPTS[0].to_string())
}
