//! Session bootstrap: builds the context, the bus and the services, and
//! subscribes them in a fixed registration order.

use std::cell::RefCell;
use std::rc::Rc;

use tutorkit_engine::{ExpertPipeline, Motivator, SearchHit, SearchIndex};
use tutorkit_index::TfidfIndex;
use tutorkit_types::{EventPayload, EventType, SessionContext, SharedClock, TaskStatus};

use crate::bus::{EventBus, SharedContext};
use crate::conductor::Conductor;
use crate::config::Config;
use crate::error::Result;
use crate::tts::{synthesizer_by_name, Synthesizer, TtsService};

/// Bridges the TF-IDF index into the engine's retrieval seam.
pub struct KnowledgeAdapter(pub TfidfIndex);

impl SearchIndex for KnowledgeAdapter {
    fn search(&self, query: &str, top_k: usize) -> tutorkit_engine::Result<Vec<SearchHit>> {
        Ok(self
            .0
            .search(query, top_k)
            .into_iter()
            .map(|doc| SearchHit {
                text: doc.text,
                source: doc.source,
                score: doc.score,
            })
            .collect())
    }
}

/// A fully wired single-session runtime.
///
/// Registration order is part of the contract: the motivator observes an
/// `expert_answer` before the conductor counts it, so a freshly produced
/// reflection prompt is available when the conductor asks for reflection;
/// the speech service runs last.
pub struct SessionRuntime {
    bus: EventBus,
}

impl SessionRuntime {
    /// Wire a session from configuration. The synthesizer argument overrides
    /// the configured one (used by tests to force failures).
    pub fn new(
        config: &Config,
        ctx: SessionContext,
        index: TfidfIndex,
        docs: Vec<String>,
        clock: SharedClock,
        synthesizer_override: Option<Box<dyn Synthesizer>>,
    ) -> Result<Self> {
        let ctx: SharedContext = Rc::new(RefCell::new(ctx));
        let bus = EventBus::new(Rc::clone(&ctx), Rc::clone(&clock), config.bus.log_limit);

        let expert = Rc::new(ExpertPipeline::new(
            Box::new(KnowledgeAdapter(index)),
            config.expert.clone(),
            Rc::clone(&clock),
        ));

        let motivator = Motivator::new(config.motivator, Rc::clone(&clock));
        attach_motivator(&bus, motivator);

        Conductor::new(expert, Rc::new(docs), config.conductor.min_work_turns).attach(&bus);

        let synthesizer = match synthesizer_override {
            Some(synthesizer) => Some(synthesizer),
            None if config.tts.enabled => match synthesizer_by_name(&config.tts.synthesizer) {
                Some(synthesizer) => Some(synthesizer),
                None => {
                    return Err(crate::Error::Config(format!(
                        "unknown synthesizer: {}",
                        config.tts.synthesizer
                    )));
                }
            },
            None => None,
        };
        if let Some(synthesizer) = synthesizer {
            TtsService::new(
                synthesizer,
                config.tts.voice.clone(),
                config.tts.rate,
                config.tts.dir.clone(),
                config.tts.cache_text_limit,
            )
            .attach(&bus);
        }

        Ok(Self { bus })
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn context(&self) -> SharedContext {
        self.bus.context()
    }

    /// Publish `init` and run the lesson up to `work`.
    pub fn start(&self) {
        self.bus.publish("runtime", EventPayload::Init);
    }

    /// Mark a task started. Unknown ids become `warning` events and the
    /// operation is a no-op.
    pub fn start_task(&self, task_id: &str) {
        let now = self.bus.clock().now_ts();
        let result = {
            let ctx = self.bus.context();
            let mut ctx = ctx.borrow_mut();
            tutorkit_engine::start_task(ctx.progress.organizer_mut(), task_id, now)
        };
        self.after_task_op(result);
    }

    /// Mark a task completed, computing its duration.
    pub fn complete_task(&self, task_id: &str) {
        let now = self.bus.clock().now_ts();
        let result = {
            let ctx = self.bus.context();
            let mut ctx = ctx.borrow_mut();
            tutorkit_engine::mark_task_complete(ctx.progress.organizer_mut(), task_id, now)
        };
        self.after_task_op(result);
    }

    /// Set a task status from its wire name, optionally recording the
    /// student's answer. Unknown statuses and ids become `warning` events.
    pub fn update_task(&self, task_id: &str, status: &str, answer: Option<&str>) {
        let status: TaskStatus = match status.parse() {
            Ok(status) => status,
            Err(msg) => {
                self.bus.publish("organizer", EventPayload::Warning { msg });
                return;
            }
        };
        let result = {
            let ctx = self.bus.context();
            let mut ctx = ctx.borrow_mut();
            tutorkit_engine::update_task_status(ctx.progress.organizer_mut(), task_id, status, answer)
        };
        self.after_task_op(result);
    }

    fn after_task_op(&self, result: tutorkit_engine::Result<()>) {
        match result {
            Ok(()) => {
                let organizer = {
                    let ctx = self.bus.context();
                    let ctx = ctx.borrow();
                    ctx.progress.organizer.clone().unwrap_or_default()
                };
                self.bus.publish(
                    "organizer",
                    EventPayload::OrganizerUpdate {
                        organizer: Box::new(organizer),
                    },
                );
            }
            Err(err) => {
                self.bus.publish(
                    "organizer",
                    EventPayload::Warning {
                        msg: err.to_string(),
                    },
                );
            }
        }
    }
}

/// The motivation estimator observes every expert answer and publishes its
/// snapshot.
fn attach_motivator(bus: &EventBus, motivator: Motivator) {
    bus.subscribe(EventType::ExpertAnswer, move |event, bus| {
        let EventPayload::ExpertAnswer { question, .. } = &event.payload else {
            return Ok(());
        };
        let ctx = bus.context();
        let snapshot = {
            let mut ctx = ctx.borrow_mut();
            motivator.evaluate(question, &mut ctx)
        };
        bus.publish(
            "motivator",
            EventPayload::MotivationUpdate {
                last: Box::new(snapshot),
            },
        );
        Ok(())
    });
}
