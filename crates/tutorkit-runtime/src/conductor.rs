//! Lesson conductor: the lifecycle state machine driving
//! `start → goals → tasks → work → reflection → wrapup → finished`.
//!
//! All lifecycle state lives in the Conductor slot; the only mutation path
//! is `set_stage`, which validates the declared edge set, stamps the
//! timestamp and publishes `stage_changed`.

use std::rc::Rc;

use tutorkit_types::{
    EventPayload, EventType, LessonSummary, Pace, RestartMode, Stage, Style, StyleTone,
};

use tutorkit_engine::{Cartographer, ExpertPipeline, ExpertReply, Organizer};

use crate::bus::EventBus;

const SOURCE: &str = "conductor";

/// Prompt used when the motivator has not produced one yet
const DEFAULT_REFLECTION_PROMPT: &str = "Что на этом занятии было для тебя самым полезным?";

pub struct Conductor {
    cartographer: Cartographer,
    organizer: Organizer,
    expert: Rc<ExpertPipeline>,
    docs: Rc<Vec<String>>,
    min_work_turns: u32,
}

impl Conductor {
    pub fn new(expert: Rc<ExpertPipeline>, docs: Rc<Vec<String>>, min_work_turns: u32) -> Self {
        Self {
            cartographer: Cartographer,
            organizer: Organizer,
            expert,
            docs,
            min_work_turns,
        }
    }

    /// Register the conductor's handlers on the bus.
    pub fn attach(self, bus: &EventBus) {
        let this = Rc::new(self);

        let conductor = Rc::clone(&this);
        bus.subscribe(EventType::Init, move |_, bus| conductor.on_init(bus));

        let conductor = Rc::clone(&this);
        bus.subscribe(EventType::GoalsReady, move |_, bus| {
            conductor.on_goals_ready(bus)
        });

        let conductor = Rc::clone(&this);
        bus.subscribe(EventType::TasksReady, move |_, bus| {
            conductor.on_tasks_ready(bus)
        });

        let conductor = Rc::clone(&this);
        bus.subscribe(EventType::StudentQuestion, move |event, bus| {
            let EventPayload::StudentQuestion { text } = &event.payload else {
                return Ok(());
            };
            conductor.on_student_question(bus, text)
        });

        let conductor = Rc::clone(&this);
        bus.subscribe(EventType::ExpertAnswer, move |_, bus| {
            conductor.on_expert_answer(bus)
        });

        let conductor = Rc::clone(&this);
        bus.subscribe(EventType::AskReflection, move |_, bus| {
            conductor.on_ask_reflection(bus)
        });

        bus.subscribe(EventType::StudentReflection, move |event, bus| {
            let EventPayload::StudentReflection { text } = &event.payload else {
                return Ok(());
            };
            // Normalized and processed under its canonical type.
            bus.publish(
                SOURCE,
                EventPayload::ReflectionAnswer { text: text.clone() },
            );
            Ok(())
        });

        let conductor = Rc::clone(&this);
        bus.subscribe(EventType::ReflectionAnswer, move |event, bus| {
            let EventPayload::ReflectionAnswer { text } = &event.payload else {
                return Ok(());
            };
            conductor.on_reflection_answer(bus, text)
        });

        let conductor = Rc::clone(&this);
        bus.subscribe(EventType::Restart, move |event, bus| {
            let EventPayload::Restart { mode, .. } = &event.payload else {
                return Ok(());
            };
            conductor.on_restart(bus, *mode)
        });
    }

    fn current_stage(&self, bus: &EventBus) -> Stage {
        let ctx = bus.context();
        let stage = ctx
            .borrow()
            .progress
            .conductor
            .as_ref()
            .map(|slot| slot.stage)
            .unwrap_or_default();
        stage
    }

    /// Single stage accessor: validates the edge set, stamps the entry
    /// timestamp and publishes `stage_changed` on every mutation.
    fn set_stage(&self, bus: &EventBus, next: Stage, reason: Option<&str>) -> anyhow::Result<()> {
        let ctx = bus.context();
        {
            let mut ctx = ctx.borrow_mut();
            let slot = ctx.progress.conductor_mut();
            let prev = slot.stage;
            if !Stage::can_transition(prev, next) {
                drop(ctx);
                bus.publish(
                    SOURCE,
                    EventPayload::Warning {
                        msg: format!(
                            "недопустимый переход: {} → {}",
                            prev.name(),
                            next.name()
                        ),
                    },
                );
                return Ok(());
            }
            slot.stage = next;
            let ts = bus.clock().now_ts();
            slot.timestamps.insert(format!("stage:{}", next.name()), ts);
        }
        bus.publish(
            SOURCE,
            EventPayload::StageChanged {
                stage: next,
                reason: reason.map(str::to_string),
            },
        );
        Ok(())
    }

    fn on_init(&self, bus: &EventBus) -> anyhow::Result<()> {
        let stage = self.current_stage(bus);
        // A finished lesson can be re-opened by a fresh init.
        if !matches!(stage, Stage::Start | Stage::Goals | Stage::Finished) {
            bus.publish(
                SOURCE,
                EventPayload::Warning {
                    msg: format!("init проигнорирован в стадии {}", stage.name()),
                },
            );
            return Ok(());
        }
        if stage == Stage::Finished {
            // Re-opened lesson: lifecycle counters start over, dialog and
            // motivation history stay.
            let ctx = bus.context();
            let mut ctx = ctx.borrow_mut();
            let slot = ctx.progress.conductor_mut();
            slot.work_turns = 0;
            slot.summary = None;
        }
        self.set_stage(bus, Stage::Goals, Some("init"))?;

        let ctx = bus.context();
        let topic = ctx.borrow().topic.clone();
        let slot = self.cartographer.derive(&topic, &self.docs);
        let goals = slot.goals.clone();
        ctx.borrow_mut().progress.cartographer = Some(slot);
        bus.publish("cartographer", EventPayload::GoalsReady { goals });
        Ok(())
    }

    fn on_goals_ready(&self, bus: &EventBus) -> anyhow::Result<()> {
        let stage = self.current_stage(bus);
        if !matches!(stage, Stage::Goals | Stage::Tasks) {
            return Ok(());
        }
        self.set_stage(bus, Stage::Tasks, None)?;

        // Re-read the slot: the goals may have been rewritten by a nested
        // publish between the triggering event and now.
        let ctx = bus.context();
        let goals = ctx
            .borrow()
            .progress
            .cartographer
            .as_ref()
            .map(|slot| slot.goals.clone())
            .unwrap_or_default();
        let slot = self.organizer.derive(&goals);
        let has_tasks = !slot.tasks.is_empty();
        ctx.borrow_mut().progress.organizer = Some(slot.clone());

        bus.publish(
            "organizer",
            EventPayload::OrganizerUpdate {
                organizer: Box::new(slot),
            },
        );
        bus.publish("organizer", EventPayload::TasksReady { has_tasks });
        Ok(())
    }

    fn on_tasks_ready(&self, bus: &EventBus) -> anyhow::Result<()> {
        let stage = self.current_stage(bus);
        if !matches!(stage, Stage::Tasks | Stage::Work) {
            return Ok(());
        }
        self.set_stage(bus, Stage::Work, None)
    }

    fn on_student_question(&self, bus: &EventBus, text: &str) -> anyhow::Result<()> {
        match self.current_stage(bus) {
            Stage::Start => {
                // Autostart: bring the lesson up first, then answer in the
                // stage the init chain landed on.
                bus.publish(SOURCE, EventPayload::Init);
                self.answer(bus, text)
            }
            Stage::Reflection => {
                // In reflection the utterance is the reflection.
                bus.publish(
                    SOURCE,
                    EventPayload::StudentReflection {
                        text: text.to_string(),
                    },
                );
                Ok(())
            }
            Stage::Goals | Stage::Tasks | Stage::Work => self.answer(bus, text),
            stage @ (Stage::Wrapup | Stage::Finished) => {
                bus.publish(
                    SOURCE,
                    EventPayload::Warning {
                        msg: format!(
                            "занятие в стадии {}; отправьте restart, чтобы продолжить",
                            stage.name()
                        ),
                    },
                );
                Ok(())
            }
        }
    }

    fn answer(&self, bus: &EventBus, text: &str) -> anyhow::Result<()> {
        let ctx = bus.context();
        let reply = {
            let mut ctx = ctx.borrow_mut();
            self.expert.respond(text, &mut ctx)
        };
        match reply {
            ExpertReply::DialogCleared => {
                bus.publish(
                    "expert",
                    EventPayload::Warning {
                        msg: "Память эксперта очищена.".to_string(),
                    },
                );
            }
            ExpertReply::Answer(envelope) => {
                bus.publish(
                    "expert",
                    EventPayload::ExpertAnswer {
                        question: envelope.question.clone(),
                        answer: envelope,
                    },
                );
            }
        }
        Ok(())
    }

    fn on_expert_answer(&self, bus: &EventBus) -> anyhow::Result<()> {
        if self.current_stage(bus) != Stage::Work {
            return Ok(());
        }
        let ctx = bus.context();
        let turns = {
            let mut ctx = ctx.borrow_mut();
            let slot = ctx.progress.conductor_mut();
            slot.work_turns += 1;
            slot.work_turns
        };
        if turns >= self.min_work_turns {
            bus.publish(
                SOURCE,
                EventPayload::AskReflection {
                    reason: "work_turns".to_string(),
                    turns,
                },
            );
        }
        Ok(())
    }

    fn on_ask_reflection(&self, bus: &EventBus) -> anyhow::Result<()> {
        let stage = self.current_stage(bus);
        if !matches!(stage, Stage::Work | Stage::Reflection) {
            return Ok(());
        }
        self.set_stage(bus, Stage::Reflection, None)?;

        let ctx = bus.context();
        let mut ctx = ctx.borrow_mut();
        let prompt = ctx
            .progress
            .motivator
            .as_ref()
            .and_then(|slot| slot.last.as_ref())
            .and_then(|snapshot| snapshot.reflection_question.clone())
            .unwrap_or_else(|| DEFAULT_REFLECTION_PROMPT.to_string());
        ctx.progress.reflection_mut().asked.push(prompt);
        Ok(())
    }

    fn on_reflection_answer(&self, bus: &EventBus, text: &str) -> anyhow::Result<()> {
        if self.current_stage(bus) != Stage::Reflection {
            bus.publish(
                SOURCE,
                EventPayload::Warning {
                    msg: "ответ на рефлексию вне стадии reflection".to_string(),
                },
            );
            return Ok(());
        }
        {
            let ctx = bus.context();
            let mut ctx = ctx.borrow_mut();
            ctx.progress.reflection_mut().answers.push(text.to_string());
        }
        self.set_stage(bus, Stage::Wrapup, Some("reflection_answer"))?;
        self.wrapup(bus)
    }

    /// Compute the lesson summary, then finish.
    fn wrapup(&self, bus: &EventBus) -> anyhow::Result<()> {
        let ctx = bus.context();
        let summary = {
            let mut ctx = ctx.borrow_mut();
            let topic = ctx.topic.clone();
            let answers_count = ctx
                .progress
                .expert
                .as_ref()
                .map(|slot| slot.dialog_history.len())
                .unwrap_or(0);
            let tasks_available = ctx
                .progress
                .organizer
                .as_ref()
                .map(|slot| !slot.tasks.is_empty())
                .unwrap_or(false);
            let (motivation_level, style) = match &ctx.progress.motivator {
                Some(slot) => (
                    slot.level,
                    slot.last
                        .as_ref()
                        .map(|snapshot| snapshot.style.clone())
                        .unwrap_or_else(default_style),
                ),
                None => (ctx.student_level, default_style()),
            };
            let conductor = ctx.progress.conductor_mut();
            let summary = LessonSummary {
                topic,
                answers_count,
                work_turns: conductor.work_turns,
                tasks_available,
                motivation_level,
                style,
            };
            conductor.summary = Some(summary.clone());
            summary
        };
        self.set_stage(bus, Stage::Finished, Some("wrapup"))?;
        bus.publish(
            SOURCE,
            EventPayload::LessonFinished {
                summary: Box::new(summary),
            },
        );
        Ok(())
    }

    fn on_restart(&self, bus: &EventBus, mode: RestartMode) -> anyhow::Result<()> {
        match mode {
            RestartMode::Stage => self.restart_stage(bus),
            RestartMode::Full => self.restart_full(bus),
        }
    }

    /// Re-enter the current stage by republishing its canonical entry
    /// event. History and counters are left untouched.
    fn restart_stage(&self, bus: &EventBus) -> anyhow::Result<()> {
        let stage = self.current_stage(bus);
        tracing::info!(stage = stage.name(), "stage restart");
        match stage {
            Stage::Goals => {
                bus.publish(SOURCE, EventPayload::Init);
                Ok(())
            }
            Stage::Tasks => {
                let ctx = bus.context();
                let goals = ctx
                    .borrow()
                    .progress
                    .cartographer
                    .as_ref()
                    .map(|slot| slot.goals.clone())
                    .unwrap_or_default();
                bus.publish("cartographer", EventPayload::GoalsReady { goals });
                Ok(())
            }
            Stage::Work => {
                let ctx = bus.context();
                let has_tasks = ctx
                    .borrow()
                    .progress
                    .organizer
                    .as_ref()
                    .map(|slot| !slot.tasks.is_empty())
                    .unwrap_or(false);
                bus.publish("organizer", EventPayload::TasksReady { has_tasks });
                Ok(())
            }
            Stage::Reflection => {
                let ctx = bus.context();
                let turns = ctx
                    .borrow()
                    .progress
                    .conductor
                    .as_ref()
                    .map(|slot| slot.work_turns)
                    .unwrap_or(0);
                bus.publish(
                    SOURCE,
                    EventPayload::AskReflection {
                        reason: "restart".to_string(),
                        turns,
                    },
                );
                Ok(())
            }
            Stage::Wrapup => self.wrapup(bus),
            Stage::Start | Stage::Finished => self.set_stage(bus, stage, Some("restart")),
        }
    }

    /// Full restart: wipe the dialog and lifecycle counters, keep the
    /// motivation history and the goal/task derivations, re-run init.
    fn restart_full(&self, bus: &EventBus) -> anyhow::Result<()> {
        let ctx = bus.context();
        {
            let mut ctx = ctx.borrow_mut();
            let motivation_level = ctx.progress.motivator.as_ref().map(|slot| slot.level);
            tracing::info!(
                ?motivation_level,
                history_len = ctx
                    .progress
                    .expert
                    .as_ref()
                    .map(|slot| slot.dialog_history.len())
                    .unwrap_or(0),
                "full restart"
            );
            ctx.progress.expert_mut().clear_dialog();
            let conductor = ctx.progress.conductor_mut();
            conductor.work_turns = 0;
            conductor.summary = None;
            ctx.progress.event_bus_mut().log.clear();
            if let Some(slot) = ctx.progress.motivator.as_mut() {
                slot.drop_count = 0;
            }
        }
        self.set_stage(bus, Stage::Start, Some("restart_full"))?;
        bus.publish(SOURCE, EventPayload::Init);
        Ok(())
    }
}

fn default_style() -> Style {
    Style {
        style: "наставнический".to_string(),
        tone: StyleTone::Mentor,
        pace: Pace::Normal,
    }
}
