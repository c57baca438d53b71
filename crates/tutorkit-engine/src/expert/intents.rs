use once_cell::sync::Lazy;
use regex::Regex;

use tutorkit_types::{Detail, Intent, OrganizerSlot, TaskKind};

static INTENT_PATTERNS: Lazy<Vec<(Intent, Vec<Regex>)>> = Lazy::new(|| {
    let compile = |patterns: &[&str]| {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("static intent pattern"))
            .collect::<Vec<_>>()
    };
    vec![
        (
            Intent::Why,
            compile(&[r"\bпочему\b", r"\bзачем\b", r"\bпо какой причине\b"]),
        ),
        (
            Intent::How,
            compile(&[
                r"\bкак\b",
                r"\bкаким образом\b",
                r"\bпорядок\b",
                r"\bшаг(и|ов)\b",
            ]),
        ),
        (Intent::WhatIf, compile(&[r"\bчто если\b", r"\bа если\b"])),
        (
            Intent::Examples,
            compile(&[r"\bпример(ы)?\b", r"\bкейсы?\b", r"\bиллюстраци(я|и)\b"]),
        ),
    ]
});

static DETAIL_SHORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(кратко|коротко|в двух словах)\b").expect("static pattern"));
static DETAIL_LONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(подробно|развернуто|детально)\b").expect("static pattern"));

/// Detect the question intents. Defaults to `how`; a bare definition
/// question («что такое …») reads as a request for examples.
pub fn detect_intents(question: &str) -> Vec<Intent> {
    let q = question.to_lowercase();
    let hits: Vec<Intent> = INTENT_PATTERNS
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|p| p.is_match(&q)))
        .map(|(intent, _)| *intent)
        .collect();
    if !hits.is_empty() {
        return hits;
    }
    if q.starts_with("что такое") {
        vec![Intent::Examples]
    } else {
        vec![Intent::How]
    }
}

/// Lexical detail request; short unless the student explicitly asks to
/// expand.
pub fn detect_detail(question: &str) -> Detail {
    let q = question.to_lowercase();
    if DETAIL_SHORT.is_match(&q) {
        return Detail::Short;
    }
    if DETAIL_LONG.is_match(&q) {
        return Detail::Long;
    }
    Detail::Short
}

fn intent_section(intent: Intent) -> &'static str {
    match intent {
        Intent::Why => {
            "Почему это важно:\n\
             - Связь с целями занятия\n\
             - Какие ошибки предотвращает\n\
             - Как влияет на результат"
        }
        Intent::How => {
            "Как действовать (шаги):\n\
             1) Изучите требования\n\
             2) Подготовьте данные/макет\n\
             3) Примените правила из материалов\n\
             4) Проверьте критерии качества"
        }
        Intent::WhatIf => {
            "Что если (разбор вариантов):\n\
             - Если данных мало → используйте минималистичную схему\n\
             - Если аудитория не экспертная → упрощайте подписи\n\
             - Если форм-фактор узкий → избегайте перегруза"
        }
        Intent::Examples => {
            "Примеры/кейсы:\n\
             - Одностраничная инфографика для отчёта\n\
             - Сравнительная диаграмма для презентации\n\
             - Пояснительная визуализация для учебного плаката"
        }
    }
}

fn format_sections(intents: &[Intent]) -> String {
    intents
        .iter()
        .map(|intent| intent_section(*intent))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Assemble the explanation block: structural sections keyed by intent,
/// with the retrieved base as a lead-in when a long answer was requested.
pub fn make_explanation(answer_base: &str, intents: &[Intent], detail: Detail) -> String {
    let sections = format_sections(intents);
    match detail {
        Detail::Long => {
            if sections.is_empty() {
                answer_base.to_string()
            } else {
                format!("{}\n\n{}", answer_base, sections)
            }
        }
        Detail::Short => {
            if sections.is_empty() {
                "Ключевая мысль: см. основную часть ответа.".to_string()
            } else {
                sections
            }
        }
    }
}

/// Recommended next steps: the nearest open assignment first, then
/// intent-specific branches, with a neutral fallback.
pub fn build_next_steps(intents: &[Intent], organizer: Option<&OrganizerSlot>) -> Vec<String> {
    let mut steps = Vec::new();

    if let Some(slot) = organizer {
        let actionable = slot.tasks.iter().find(|t| {
            matches!(
                t.kind,
                TaskKind::Action | TaskKind::Text | TaskKind::Reflection
            )
        });
        if let Some(task) = actionable {
            steps.push(format!("Выполни задание: «{}»", task.instruction));
        }
    }
    if intents.contains(&Intent::How) {
        steps.push("Сверься с чек-листом качества из материалов занятия.".to_string());
    }
    if intents.contains(&Intent::Why) {
        steps.push("Выдели 2–3 аргумента, почему это важно именно для твоей аудитории.".to_string());
    }
    if intents.contains(&Intent::Examples) {
        steps.push("Найди 2 примера из реальных источников и кратко сравни их.".to_string());
    }
    if intents.contains(&Intent::WhatIf) {
        steps.push("Опиши 1–2 альтернативы для твоего кейса и выбери подходящую.".to_string());
    }
    if steps.is_empty() {
        steps.push("Задай уточняющий вопрос или перейди к выполнению ближайшего задания.".to_string());
    }
    steps
}
