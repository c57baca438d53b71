//! Cartographer: derives lesson goals and a knowledge map from the topic
//! and the loaded documents.

use tutorkit_types::{CartographerSlot, Goals, KnowledgeTypes};

/// Sentence fragments signalling a factual statement
const FACT_TRIGGERS: &[&str] = &["это", "называется", "является", "определяется как"];
/// Fragments signalling a procedure
const PROCEDURE_TRIGGERS: &[&str] = &[
    "сделайте",
    "выполните",
    "используйте",
    "шаг",
    "процесс",
    "алгоритм",
    "нужно",
];
/// Fragments signalling meta-knowledge (judgement, comparison)
const META_TRIGGERS: &[&str] = &[
    "оцените",
    "сравните",
    "выберите",
    "зачем",
    "почему",
    "что лучше",
    "преимущество",
];

/// Examples kept per knowledge kind
const KNOWLEDGE_CAP: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct Cartographer;

impl Cartographer {
    /// Derive the Cartographer slot for a topic over the loaded corpus.
    pub fn derive(&self, topic: &str, docs: &[String]) -> CartographerSlot {
        let goals = generate_goals(topic);
        let knowledge_types = extract_knowledge_types(docs);
        let text_map = render_text_map(&goals, &knowledge_types);
        CartographerSlot {
            goals,
            knowledge_types,
            text_map,
            doc_count: docs.len(),
        }
    }
}

/// Pedagogically layered goals: understanding → application → evaluation.
fn generate_goals(topic: &str) -> Goals {
    Goals {
        main_goal: format!("Изучить тему: {}", topic),
        subgoals: vec![
            format!("Объяснить ключевые понятия, связанные с темой «{}»", topic),
            "Применить знания для выполнения задания по теме".to_string(),
            "Оценить примеры/результаты на основе полученных знаний".to_string(),
        ],
        level: "понимание → применение → оценка".to_string(),
    }
}

/// Sentence-level trigger matching, capped per kind.
fn extract_knowledge_types(docs: &[String]) -> KnowledgeTypes {
    let mut kinds = KnowledgeTypes::default();
    for doc in docs {
        for sentence in doc.split(['.', '!', '?']) {
            let trimmed = sentence.trim();
            if trimmed.is_empty() {
                continue;
            }
            let lowered = trimmed.to_lowercase();
            let contains_any = |triggers: &[&str]| triggers.iter().any(|t| lowered.contains(t));
            if contains_any(FACT_TRIGGERS) {
                kinds.facts.push(trimmed.to_string());
            } else if contains_any(PROCEDURE_TRIGGERS) {
                kinds.procedures.push(trimmed.to_string());
            } else if contains_any(META_TRIGGERS) {
                kinds.meta.push(trimmed.to_string());
            }
        }
    }
    kinds.facts.truncate(KNOWLEDGE_CAP);
    kinds.procedures.truncate(KNOWLEDGE_CAP);
    kinds.meta.truncate(KNOWLEDGE_CAP);
    kinds
}

/// Human-readable lesson map printed at session start.
fn render_text_map(goals: &Goals, knowledge_types: &KnowledgeTypes) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Главная цель занятия: {}", goals.main_goal));
    lines.push("\nПодцели:".to_string());
    for (i, subgoal) in goals.subgoals.iter().enumerate() {
        lines.push(format!("  {}. {}", i + 1, subgoal));
    }
    lines.push(format!("\nУровень сложности: {}", goals.level));
    lines.push("\nТипы знаний:".to_string());
    if !knowledge_types.facts.is_empty() {
        lines.push("  Факты:".to_string());
        for fact in &knowledge_types.facts {
            lines.push(format!("    - {}", fact));
        }
    }
    if !knowledge_types.procedures.is_empty() {
        lines.push("  Процедуры:".to_string());
        for procedure in &knowledge_types.procedures {
            lines.push(format!("    - {}", procedure));
        }
    }
    if !knowledge_types.meta.is_empty() {
        lines.push("  Мета-знания:".to_string());
        for meta in &knowledge_types.meta {
            lines.push(format!("    - {}", meta));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<String> {
        vec![
            "Инфографика — это сочетание данных и дизайна. Используйте контрастные цвета. Сравните два макета и выберите лучший.".to_string(),
        ]
    }

    #[test]
    fn test_goals_follow_topic() {
        let slot = Cartographer.derive("Инфографика", &docs());
        assert_eq!(slot.goals.main_goal, "Изучить тему: Инфографика");
        assert_eq!(slot.goals.subgoals.len(), 3);
        assert!(slot.goals.subgoals[0].contains("Объяснить"));
        assert!(slot.goals.subgoals[1].contains("Применить"));
        assert!(slot.goals.subgoals[2].contains("Оценить"));
        assert_eq!(slot.doc_count, 1);
    }

    #[test]
    fn test_knowledge_extraction_by_triggers() {
        let slot = Cartographer.derive("Инфографика", &docs());
        assert_eq!(slot.knowledge_types.facts.len(), 1);
        assert!(slot.knowledge_types.facts[0].contains("это"));
        assert_eq!(slot.knowledge_types.procedures.len(), 1);
        assert!(slot.knowledge_types.procedures[0].contains("Используйте"));
        assert_eq!(slot.knowledge_types.meta.len(), 1);
        assert!(slot.knowledge_types.meta[0].contains("Сравните"));
    }

    #[test]
    fn test_knowledge_capped_at_five_per_kind() {
        let many: Vec<String> = (0..10)
            .map(|i| format!("Понятие {} — это термин из материалов.", i))
            .collect();
        let slot = Cartographer.derive("Инфографика", &many);
        assert_eq!(slot.knowledge_types.facts.len(), 5);
    }

    #[test]
    fn test_text_map_layout() {
        let goals = generate_goals("Инфографика");
        let kinds = KnowledgeTypes {
            facts: vec!["Инфографика — это формат".to_string()],
            procedures: vec![],
            meta: vec![],
        };
        insta::assert_snapshot!(render_text_map(&goals, &kinds), @r"
        Главная цель занятия: Изучить тему: Инфографика

        Подцели:
          1. Объяснить ключевые понятия, связанные с темой «Инфографика»
          2. Применить знания для выполнения задания по теме
          3. Оценить примеры/результаты на основе полученных знаний

        Уровень сложности: понимание → применение → оценка

        Типы знаний:
          Факты:
            - Инфографика — это формат
        ");
    }

    #[test]
    fn test_empty_corpus_still_yields_goals() {
        let slot = Cartographer.derive("Инфографика", &[]);
        assert_eq!(slot.doc_count, 0);
        assert!(slot.knowledge_types.facts.is_empty());
        assert!(!slot.text_map.is_empty());
    }
}
