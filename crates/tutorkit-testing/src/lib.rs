//! Shared fixtures for integration tests: a manual clock, a scripted
//! session builder, an all-types event recorder and failure-path stubs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tutorkit_engine::{SearchHit, SearchIndex};
use tutorkit_index::TfidfIndex;
use tutorkit_runtime::{Config, EventBus, SessionRuntime, Synthesis, Synthesizer};
use tutorkit_types::{
    Clock, EmpathyTone, Event, EventType, SessionContext, SharedClock, Stage,
};

/// Clock driven by the test; wrap in `Rc` and keep a handle to advance it.
#[derive(Debug, Default)]
pub struct ManualClock(Cell<f64>);

impl ManualClock {
    pub fn starting_at(ts: f64) -> Rc<Self> {
        Rc::new(Self(Cell::new(ts)))
    }

    pub fn set(&self, ts: f64) {
        self.0.set(ts);
    }

    pub fn advance(&self, seconds: f64) {
        self.0.set(self.0.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now_ts(&self) -> f64 {
        self.0.get()
    }
}

/// Small Russian lesson corpus about infographics.
pub fn sample_docs() -> Vec<String> {
    vec![
        "Инфографика — это сочетание данных, текста и визуальных образов. \
         Сначала подготовьте данные: соберите источники и проверьте цифры."
            .to_string(),
        "Столбчатая диаграмма подходит для сравнения значений между категориями. \
         Используйте не больше пяти цветов. Сравните варианты и выберите читаемый."
            .to_string(),
        "Алгоритм подготовки: определите аудиторию, выполните отбор данных, \
         постройте макет и проверьте критерии качества."
            .to_string(),
    ]
}

/// Default session context for the fixtures.
pub fn sample_context() -> SessionContext {
    SessionContext::new("Цифровая культура", 1, "Инфографика", 2)
        .expect("fixture context is valid")
}

/// Build a wired runtime over the sample corpus and a manual clock.
///
/// Returns the runtime together with the clock handle so tests can drive
/// latency.
pub fn sample_runtime(
    mut configure: impl FnMut(&mut Config),
    synthesizer: Option<Box<dyn Synthesizer>>,
) -> (SessionRuntime, Rc<ManualClock>) {
    let mut config = Config::default();
    // Keep test artifacts out of the working directory.
    let scratch = std::env::temp_dir().join("tutorkit-testing");
    config.tts.dir = scratch.join("tts");
    config.export.dir = scratch.join("exports");
    configure(&mut config);

    let clock = ManualClock::starting_at(1_000.0);
    let shared_clock: SharedClock = clock.clone();
    let docs = sample_docs();
    let index = TfidfIndex::fit(docs.clone());
    let runtime = SessionRuntime::new(
        &config,
        sample_context(),
        index,
        docs,
        shared_clock,
        synthesizer,
    )
    .expect("fixture runtime wires");
    (runtime, clock)
}

/// Records every dispatched event; subscribe it last so the rest of the
/// wiring has already run when a record lands.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<Event>>>,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let recorder = Self::default();
        for event_type in EventType::ALL {
            let events = Rc::clone(&recorder.events);
            bus.subscribe(event_type, move |event, _| {
                events.borrow_mut().push(event.clone());
                Ok(())
            });
        }
        recorder
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn types(&self) -> Vec<EventType> {
        self.events.borrow().iter().map(|e| e.event_type).collect()
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Synthesizer that always fails; drives the `tts_failed` path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSynthesizer;

impl Synthesizer for FailingSynthesizer {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn synthesize(
        &self,
        _text: &str,
        _voice: &str,
        _emotion: EmpathyTone,
        _rate: f64,
    ) -> anyhow::Result<Synthesis> {
        anyhow::bail!("synth backend unavailable")
    }
}

/// Index stub returning fixed hits regardless of the query.
pub struct StaticIndex(pub Vec<SearchHit>);

impl SearchIndex for StaticIndex {
    fn search(&self, _query: &str, top_k: usize) -> tutorkit_engine::Result<Vec<SearchHit>> {
        Ok(self.0.iter().take(top_k).cloned().collect())
    }
}

/// Assert the conductor is in the expected stage.
pub fn assert_stage(runtime: &SessionRuntime, expected: Stage) {
    let ctx = runtime.context();
    let ctx = ctx.borrow();
    let stage = ctx
        .progress
        .conductor
        .as_ref()
        .map(|slot| slot.stage)
        .unwrap_or_default();
    assert_eq!(stage, expected, "unexpected lifecycle stage");
}
