//! Export artifacts produced from a finished session.

use tempfile::TempDir;

use tutorkit_runtime::ExportService;
use tutorkit_testing::{sample_runtime, EventRecorder};
use tutorkit_types::{Clock, EventPayload};

#[test]
fn finished_session_exports_json_and_csv() {
    let (runtime, clock) = sample_runtime(|_| {}, None);
    let recorder = EventRecorder::attach(runtime.bus());
    runtime.start();
    for text in ["С чего начать?", "Как выбрать тип диаграммы?"] {
        clock.advance(4.0);
        runtime.bus().publish(
            "cli",
            EventPayload::StudentQuestion {
                text: text.to_string(),
            },
        );
    }
    runtime.bus().publish(
        "cli",
        EventPayload::StudentReflection {
            text: "Стало понятнее.".to_string(),
        },
    );

    let dir = TempDir::new().unwrap();
    let ctx = runtime.context();
    let ctx = ctx.borrow();
    let paths = ExportService::new(&ctx)
        .export(dir.path(), clock.now_ts())
        .unwrap();

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
    let meta = &document["meta"];
    assert_eq!(meta["topic"], "Инфографика");
    assert_eq!(meta["discipline"], "Цифровая культура");
    assert_eq!(
        meta["session_id"].as_str().unwrap(),
        ctx.progress.event_bus.as_ref().unwrap().id.to_string()
    );
    assert!(meta["saved_at"].as_str().unwrap().starts_with("1970-01-01"));

    let modules = &meta["modules"];
    assert_eq!(modules["expert"]["history_len"], 2);
    assert_eq!(
        modules["expert"]["last_question"],
        "Как выбрать тип диаграммы?"
    );
    assert_eq!(modules["organizer"]["tasks_count"], 3);
    assert_eq!(modules["conductor"]["stage"], "finished");
    assert_eq!(modules["conductor"]["work_turns"], 2);
    assert!(modules["conductor"]["summary"]["tasks_available"]
        .as_bool()
        .unwrap());
    assert!(modules["motivator"]["level"].as_u64().unwrap() >= 1);

    // One CSV row per log record, plus the header.
    let log_len = document["eventbus_log"].as_array().unwrap().len();
    let csv_content = std::fs::read_to_string(&paths.csv).unwrap();
    assert_eq!(csv_content.lines().count(), log_len + 1);
    assert!(csv_content
        .lines()
        .next()
        .unwrap()
        .starts_with("ts,ts_human,type,source,payload_keys"));
    assert!(csv_content.contains("student_question"));
    assert!(csv_content.contains("lesson_finished"));

    // The recorder saw every event the log kept (log is a suffix).
    assert!(log_len <= recorder.events().len());
}
