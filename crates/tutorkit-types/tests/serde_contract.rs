//! Wire-format contract of the exported records: field names and enum
//! values are part of the log/export surface and must not drift.

use tutorkit_types::{
    AnswerEnvelope, Detail, Empathy, EmpathyTone, Event, EventPayload, Intent, Pace, Situation,
    Stage, Task, TaskKind, TaskStatus,
};

fn envelope() -> AnswerEnvelope {
    AnswerEnvelope {
        question: "Почему важна палитра?".to_string(),
        in_reply_to: None,
        intents: vec![Intent::Why, Intent::Examples],
        detail: Detail::Short,
        answer: "Палитра задаёт читаемость.".to_string(),
        explanation: "Почему это важно: …".to_string(),
        sources: vec!["doc_1".to_string()],
        next_steps: vec!["Сверься с чек-листом.".to_string()],
        pace: Pace::Simplified,
        tone: "дружелюбный наставник".to_string(),
        engagement: 0.56,
        confidence: 0.43,
        empathy: Empathy {
            situation: Situation::Doubt,
            tone: EmpathyTone::Warm,
            intro: Some("Сомневаться — значит думать.".to_string()),
            outro: None,
        },
        answer_empathic: "Сомневаться — значит думать.\n\nПалитра задаёт читаемость.".to_string(),
        latency_sec: Some(8.0),
        latency_avg_sec: Some(9.5),
    }
}

#[test]
fn envelope_wire_names() {
    let json = serde_json::to_value(envelope()).unwrap();
    assert_eq!(json["intents"], serde_json::json!(["why", "examples"]));
    assert_eq!(json["detail"], "short");
    assert_eq!(json["pace"], "упрощённый");
    assert_eq!(json["empathy"]["situation"], "doubt");
    assert_eq!(json["empathy"]["tone"], "warm");
    // Absent optionals are omitted, not null.
    assert!(json.get("in_reply_to").is_none());
    assert!(json["empathy"].get("outro").is_none());
}

#[test]
fn envelope_round_trips() {
    let original = envelope();
    let json = serde_json::to_string(&original).unwrap();
    let back: AnswerEnvelope = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
}

#[test]
fn event_type_field_is_named_type() {
    let event = Event::new(
        "cli",
        1.5,
        EventPayload::StageChanged {
            stage: Stage::Work,
            reason: None,
        },
    );
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "stage_changed");
    assert_eq!(json["source"], "cli");
}

#[test]
fn task_status_values_match_the_contract() {
    let task = Task {
        id: "task_2".to_string(),
        goal: "Применить знания".to_string(),
        kind: TaskKind::Action,
        instruction: "Задание: применить знания".to_string(),
        hints: vec![],
        evaluation_criteria: vec![],
        start_time: Some(10.0),
        status: TaskStatus::NeedsReview,
        end_time: None,
        duration_sec: None,
        is_completed: false,
        student_answer: None,
    };
    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["type"], "action");
    assert_eq!(json["status"], "needs_review");
    assert!(json.get("end_time").is_none());
}
