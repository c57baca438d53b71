//! Expert pipeline over a real TF-IDF index: retrieval, composition,
//! framing and latency behavior across a multi-turn dialog.

use std::cell::Cell;
use std::rc::Rc;

use tutorkit_engine::{
    ExpertPipeline, ExpertReply, ExpertTuning, Motivator, MotivatorTuning, SearchHit, SearchIndex,
};
use tutorkit_index::TfidfIndex;
use tutorkit_types::{Clock, Detail, Pace, SessionContext, SharedClock};

struct TestClock(Cell<f64>);

impl Clock for TestClock {
    fn now_ts(&self) -> f64 {
        self.0.get()
    }
}

/// Same bridge the runtime uses, local to the test.
struct IndexAdapter(TfidfIndex);

impl SearchIndex for IndexAdapter {
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

fn corpus() -> Vec<String> {
    vec![
        "Инфографика — это сочетание данных, текста и визуальных образов.".to_string(),
        "Столбчатая диаграмма подходит для сравнения значений между категориями.".to_string(),
        "Алгоритм подготовки: определите аудиторию, выполните отбор данных, постройте макет."
            .to_string(),
    ]
}

fn setup() -> (ExpertPipeline, Rc<TestClock>, SessionContext) {
    let clock = Rc::new(TestClock(Cell::new(10_000.0)));
    let shared: SharedClock = clock.clone();
    let pipeline = ExpertPipeline::new(
        Box::new(IndexAdapter(TfidfIndex::fit(corpus()))),
        ExpertTuning::default(),
        shared,
    );
    let ctx = SessionContext::new("Цифровая культура", 1, "Инфографика", 2).unwrap();
    (pipeline, clock, ctx)
}

fn answer(pipeline: &ExpertPipeline, ctx: &mut SessionContext, text: &str) -> tutorkit_types::AnswerEnvelope {
    match pipeline.respond(text, ctx) {
        ExpertReply::Answer(envelope) => *envelope,
        ExpertReply::DialogCleared => panic!("unexpected dialog reset"),
    }
}

#[test]
fn retrieval_ranks_the_comparison_doc_for_a_comparison_question() {
    let (pipeline, _clock, mut ctx) = setup();
    let envelope = answer(&pipeline, &mut ctx, "Какая диаграмма подходит для сравнения значений?");
    assert_eq!(envelope.sources.first().map(String::as_str), Some("doc_2"));
    assert!(envelope.answer.contains("диаграмма"));
    assert_eq!(envelope.detail, Detail::Short);
}

#[test]
fn long_detail_request_keeps_the_full_base() {
    let (pipeline, _clock, mut ctx) = setup();
    let envelope = answer(
        &pipeline,
        &mut ctx,
        "Расскажи подробно, как подготовить данные для инфографики",
    );
    assert_eq!(envelope.detail, Detail::Long);
    assert!(envelope.explanation.contains("Как действовать"));
}

#[test]
fn followup_thread_reaches_the_previous_topic() {
    let (pipeline, clock, mut ctx) = setup();
    answer(&pipeline, &mut ctx, "Какая диаграмма подходит для сравнения значений?");
    clock.0.set(10_005.0);
    let envelope = answer(&pipeline, &mut ctx, "поясни");
    assert_eq!(
        envelope.in_reply_to.as_deref(),
        Some("Какая диаграмма подходит для сравнения значений?")
    );
    // The augmented query still retrieves the comparison document.
    assert_eq!(envelope.sources.first().map(String::as_str), Some("doc_2"));
}

#[test]
fn slow_dialog_settles_into_simplified_pace() {
    let (pipeline, clock, mut ctx) = setup();
    answer(&pipeline, &mut ctx, "Какая диаграмма подходит для сравнения значений?");
    let mut now = 10_000.0;
    let mut last = Pace::Normal;
    for _ in 0..4 {
        now += 90.0;
        clock.0.set(now);
        last = answer(
            &pipeline,
            &mut ctx,
            "Расскажи ещё раз про выбор типа диаграммы для отчёта",
        )
        .pace;
    }
    assert_eq!(last, Pace::Simplified);

    let expert = ctx.progress.expert.as_ref().unwrap();
    assert!(expert.latency_buffer.len() <= 8);
    assert!(expert.latency_avg().unwrap() > 45.0);
}

#[test]
fn motivator_follows_a_deteriorating_dialog() {
    let (pipeline, clock, mut ctx) = setup();
    let motivator = {
        let shared: SharedClock = clock.clone();
        Motivator::new(MotivatorTuning::default(), shared)
    };

    let mut now = 10_000.0;
    for text in ["не понимаю", "это сложно", "я устал"] {
        now += 60.0;
        clock.0.set(now);
        answer(&pipeline, &mut ctx, text);
        motivator.evaluate(text, &mut ctx);
    }

    let slot = ctx.progress.motivator.as_ref().unwrap();
    assert_eq!(slot.level, 1);
    assert!(slot.drop_count >= 3);
    assert!(slot
        .history
        .iter()
        .any(|snapshot| snapshot.reflection_question.is_some()));
    // Hysteresis: a single neutral turn does not bounce the level back.
    clock.0.set(now + 10.0);
    answer(&pipeline, &mut ctx, "Хорошо, давай продолжим разбирать материал");
    let snapshot = motivator.evaluate("Хорошо, давай продолжим разбирать материал", &mut ctx);
    assert_eq!(snapshot.level, 1);
}
