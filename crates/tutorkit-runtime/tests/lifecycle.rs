//! End-to-end lifecycle scenarios over a fully wired session runtime.

use tutorkit_testing::{assert_stage, sample_runtime, EventRecorder, FailingSynthesizer};
use tutorkit_types::{EventPayload, EventType, RestartMode, Scenario, Stage};

fn question(text: &str) -> EventPayload {
    EventPayload::StudentQuestion {
        text: text.to_string(),
    }
}

fn stage_changes(recorder: &EventRecorder) -> Vec<Stage> {
    recorder
        .events()
        .into_iter()
        .filter_map(|event| match event.payload {
            EventPayload::StageChanged { stage, .. } => Some(stage),
            _ => None,
        })
        .collect()
}

#[test]
fn smooth_lesson_runs_to_finished() {
    let (runtime, clock) = sample_runtime(|_| {}, None);
    let recorder = EventRecorder::attach(runtime.bus());

    runtime.start();
    assert_stage(&runtime, Stage::Work);
    assert_eq!(
        stage_changes(&recorder),
        vec![Stage::Goals, Stage::Tasks, Stage::Work]
    );
    let tasks_ready: Vec<bool> = recorder
        .events()
        .into_iter()
        .filter_map(|event| match event.payload {
            EventPayload::TasksReady { has_tasks } => Some(has_tasks),
            _ => None,
        })
        .collect();
    assert_eq!(tasks_ready, vec![true]);

    runtime.bus().publish(
        "cli",
        question("С чего начать подготовку данных для инфографики?"),
    );
    clock.advance(6.0);
    runtime.bus().publish(
        "cli",
        question("Как выбрать подходящий тип диаграммы для сравнения?"),
    );
    assert_stage(&runtime, Stage::Reflection);
    assert_eq!(recorder.count(EventType::AskReflection), 1);

    runtime.bus().publish(
        "cli",
        EventPayload::StudentReflection {
            text: "Немного волновался, но стало понятнее.".to_string(),
        },
    );

    assert_stage(&runtime, Stage::Finished);
    let ctx = runtime.context();
    let ctx = ctx.borrow();
    let expert = ctx.progress.expert.as_ref().unwrap();
    assert_eq!(expert.dialog_history.len(), 2);

    let conductor = ctx.progress.conductor.as_ref().unwrap();
    let summary = conductor.summary.as_ref().unwrap();
    assert_eq!(summary.answers_count, 2);
    assert_eq!(summary.work_turns, 2);
    assert!(summary.tasks_available);
    assert_eq!(summary.topic, "Инфографика");

    let reflection = ctx.progress.reflection.as_ref().unwrap();
    assert_eq!(reflection.asked.len(), 1);
    assert_eq!(
        reflection.answers,
        vec!["Немного волновался, но стало понятнее."]
    );
    assert_eq!(recorder.count(EventType::LessonFinished), 1);
}

#[test]
fn frustration_scenario_slows_the_style_and_asks_reflection() {
    let (runtime, _clock) = sample_runtime(|config| config.conductor.min_work_turns = 5, None);
    runtime.start();

    for text in ["не понимаю", "сложно", "устал", "хм"] {
        runtime.bus().publish("cli", question(text));
    }

    let ctx = runtime.context();
    let ctx = ctx.borrow();
    let motivator = ctx.progress.motivator.as_ref().unwrap();
    assert!(motivator.drop_count >= 1);

    let frustrated = motivator
        .history
        .iter()
        .any(|snapshot| snapshot.triggered.contains(&Scenario::Frustration));
    assert!(frustrated);

    let snapshot = motivator
        .history
        .iter()
        .find(|snapshot| snapshot.triggered.contains(&Scenario::Frustration))
        .unwrap();
    let update = snapshot.style_update.as_ref().unwrap();
    assert_eq!(update.pace, tutorkit_types::Pace::Slowed);
    assert_eq!(update.tone, tutorkit_types::EmpathyTone::Warm);

    // Repeated scenario hits eventually force a reflection prompt.
    assert!(motivator
        .history
        .iter()
        .any(|snapshot| snapshot.reflection_question.is_some()));
}

#[test]
fn low_motivation_drops_at_most_one_level_per_event() {
    let (runtime, _clock) = sample_runtime(|config| config.conductor.min_work_turns = 5, None);
    runtime.start();
    {
        let ctx = runtime.context();
        let mut ctx = ctx.borrow_mut();
        let expert = ctx.progress.expert_mut();
        expert.engagement = 0.32;
        expert.confidence = 0.28;
        expert.push_latency(50.0, 8);
    }

    let starting_level = 2; // student_level of the fixture context
    let mut previous = starting_level;
    for text in ["Да", "Не понимаю", "Хм…"] {
        runtime.bus().publish("cli", question(text));
        let ctx = runtime.context();
        let ctx = ctx.borrow();
        let level = ctx.progress.motivator.as_ref().unwrap().level;
        assert!(
            (i32::from(previous) - i32::from(level)).abs() <= 1,
            "level moved more than one step"
        );
        assert!(level >= 1);
        previous = level;
    }
    assert!(previous <= starting_level);

    let ctx = runtime.context();
    let ctx = ctx.borrow();
    let motivator = ctx.progress.motivator.as_ref().unwrap();
    assert!(motivator.history.iter().any(|snapshot| {
        snapshot.triggered.contains(&Scenario::LowMetrics)
            || snapshot.triggered.contains(&Scenario::SlowResponse)
    }));
}

#[test]
fn stage_restart_reenters_work_without_losing_state() {
    let (runtime, _clock) = sample_runtime(|_| {}, None);
    runtime.start();
    runtime
        .bus()
        .publish("cli", question("С чего начать подготовку данных?"));
    assert_stage(&runtime, Stage::Work);

    let recorder = EventRecorder::attach(runtime.bus());
    runtime.bus().publish(
        "cli",
        EventPayload::Restart {
            mode: RestartMode::Stage,
            reason: None,
        },
    );

    assert_eq!(stage_changes(&recorder), vec![Stage::Work]);
    assert_stage(&runtime, Stage::Work);

    let ctx = runtime.context();
    let ctx = ctx.borrow();
    assert_eq!(
        ctx.progress.expert.as_ref().unwrap().dialog_history.len(),
        1
    );
    assert_eq!(ctx.progress.conductor.as_ref().unwrap().work_turns, 1);
}

#[test]
fn full_restart_clears_dialog_but_keeps_motivation() {
    let (runtime, _clock) = sample_runtime(|_| {}, None);
    runtime.start();
    runtime
        .bus()
        .publish("cli", question("С чего начать подготовку данных?"));

    let (level_before, history_before) = {
        let ctx = runtime.context();
        let ctx = ctx.borrow();
        let slot = ctx.progress.motivator.as_ref().unwrap();
        (slot.level, slot.history.len())
    };
    assert!(history_before > 0);

    let recorder = EventRecorder::attach(runtime.bus());
    runtime.bus().publish(
        "cli",
        EventPayload::Restart {
            mode: RestartMode::Full,
            reason: Some("начать заново".to_string()),
        },
    );

    assert_eq!(
        stage_changes(&recorder),
        vec![Stage::Start, Stage::Goals, Stage::Tasks, Stage::Work]
    );
    assert_stage(&runtime, Stage::Work);

    let ctx = runtime.context();
    let ctx = ctx.borrow();
    let expert = ctx.progress.expert.as_ref().unwrap();
    assert!(expert.dialog_history.is_empty());
    assert!(expert.last_answer.is_none());

    let conductor = ctx.progress.conductor.as_ref().unwrap();
    assert_eq!(conductor.work_turns, 0);
    assert!(conductor.summary.is_none());

    let motivator = ctx.progress.motivator.as_ref().unwrap();
    assert_eq!(motivator.level, level_before);
    assert_eq!(motivator.history.len(), history_before);
    assert_eq!(motivator.drop_count, 0);

    // Goal and task derivations survive a full restart.
    assert!(ctx.progress.cartographer.is_some());
    assert!(ctx.progress.organizer.is_some());
}

#[test]
fn reinit_from_finished_replays_the_fresh_stage_sequence() {
    let (runtime, _clock) = sample_runtime(|_| {}, None);
    runtime.start();
    runtime.bus().publish("cli", question("С чего начать?"));
    runtime.bus().publish("cli", question("Как выбрать тип диаграммы?"));
    runtime.bus().publish(
        "cli",
        EventPayload::StudentReflection {
            text: "Стало понятнее.".to_string(),
        },
    );
    assert_stage(&runtime, Stage::Finished);

    let recorder = EventRecorder::attach(runtime.bus());
    runtime.bus().publish("cli", EventPayload::Init);
    assert_eq!(
        stage_changes(&recorder),
        vec![Stage::Goals, Stage::Tasks, Stage::Work]
    );
    assert_stage(&runtime, Stage::Work);
}

#[test]
fn autostart_answers_a_question_from_cold_start() {
    let (runtime, _clock) = sample_runtime(|_| {}, None);
    let recorder = EventRecorder::attach(runtime.bus());

    // No init published: the first question must bring the lesson up.
    runtime
        .bus()
        .publish("cli", question("Как выбрать тип диаграммы?"));

    assert_stage(&runtime, Stage::Work);
    assert_eq!(recorder.count(EventType::ExpertAnswer), 1);
    let ctx = runtime.context();
    let ctx = ctx.borrow();
    assert_eq!(
        ctx.progress.expert.as_ref().unwrap().dialog_history.len(),
        1
    );
}

#[test]
fn question_in_reflection_is_normalized_to_reflection_answer() {
    let (runtime, _clock) = sample_runtime(|_| {}, None);
    let recorder = EventRecorder::attach(runtime.bus());
    runtime.start();
    runtime.bus().publish("cli", question("С чего начать?"));
    runtime.bus().publish("cli", question("Как выбрать тип диаграммы?"));
    assert_stage(&runtime, Stage::Reflection);

    runtime
        .bus()
        .publish("cli", question("Было сложно, но интересно."));

    assert_eq!(recorder.count(EventType::ReflectionAnswer), 1);
    assert_stage(&runtime, Stage::Finished);
}

#[test]
fn reset_phrase_mid_lesson_clears_dialog_and_warns() {
    let (runtime, _clock) = sample_runtime(|_| {}, None);
    let recorder = EventRecorder::attach(runtime.bus());
    runtime.start();
    runtime.bus().publish("cli", question("С чего начать?"));
    recorder.clear();

    runtime.bus().publish("cli", question("сброс"));

    assert_eq!(recorder.count(EventType::ExpertAnswer), 0);
    assert_eq!(recorder.count(EventType::Warning), 1);
    let ctx = runtime.context();
    let ctx = ctx.borrow();
    assert!(ctx.progress.expert.as_ref().unwrap().dialog_history.is_empty());
    // The cleared turn does not count as work.
    assert_eq!(ctx.progress.conductor.as_ref().unwrap().work_turns, 1);
}

#[test]
fn stage_transitions_stay_on_the_declared_graph() {
    let (runtime, clock) = sample_runtime(|_| {}, None);
    let recorder = EventRecorder::attach(runtime.bus());
    runtime.start();
    for text in ["С чего начать?", "Как выбрать тип диаграммы?"] {
        clock.advance(3.0);
        runtime.bus().publish("cli", question(text));
    }
    runtime.bus().publish(
        "cli",
        EventPayload::StudentReflection {
            text: "Понятнее.".to_string(),
        },
    );

    let stages = stage_changes(&recorder);
    let mut previous = Stage::Start;
    for stage in stages {
        assert!(
            Stage::can_transition(previous, stage),
            "undeclared transition {:?} -> {:?}",
            previous,
            stage
        );
        previous = stage;
    }
    assert_eq!(previous, Stage::Finished);
}

#[test]
fn tts_failure_does_not_stop_the_lesson() {
    let (runtime, _clock) = sample_runtime(|_| {}, Some(Box::new(FailingSynthesizer)));
    let recorder = EventRecorder::attach(runtime.bus());
    runtime.start();

    runtime.bus().publish("cli", question("С чего начать?"));

    assert_eq!(recorder.count(EventType::TtsDone), 0);
    assert_eq!(recorder.count(EventType::TtsFailed), 1);
    let failed = recorder
        .events()
        .into_iter()
        .find_map(|event| match event.payload {
            EventPayload::TtsFailed {
                reason,
                fallback_text,
            } => Some((reason, fallback_text)),
            _ => None,
        })
        .unwrap();
    assert!(!failed.0.is_empty());
    assert!(!failed.1.is_empty());

    // The session continues: the next question is still answered.
    runtime.bus().publish("cli", question("Как выбрать тип диаграммы?"));
    assert_eq!(recorder.count(EventType::ExpertAnswer), 2);
}
