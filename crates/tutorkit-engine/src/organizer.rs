//! Organizer: turns the cartographer's subgoals into typed tasks and owns
//! the task status operations.

use tutorkit_types::{Goals, OrganizerSlot, Task, TaskKind, TaskStatus};

use crate::error::{Error, Result};

const TEXT_VERBS: &[&str] = &["объяснить", "описать", "перечислить"];
const ACTION_VERBS: &[&str] = &["применить", "создать", "выполнить", "построить"];
const REFLECTION_VERBS: &[&str] = &["оценить", "анализировать", "сравнить", "обосновать"];

#[derive(Debug, Clone, Copy, Default)]
pub struct Organizer;

impl Organizer {
    /// Derive the Organizer slot from the cartographer goals.
    pub fn derive(&self, goals: &Goals) -> OrganizerSlot {
        OrganizerSlot {
            tasks: generate_tasks(goals),
        }
    }
}

/// One task per subgoal, typed by the verb family of the subgoal.
pub fn generate_tasks(goals: &Goals) -> Vec<Task> {
    goals
        .subgoals
        .iter()
        .enumerate()
        .map(|(i, subgoal)| {
            let lowered = subgoal.to_lowercase();
            let contains_any = |verbs: &[&str]| verbs.iter().any(|v| lowered.contains(v));

            let (kind, hints, criteria): (TaskKind, &[&str], &[&str]) =
                if contains_any(TEXT_VERBS) {
                    (
                        TaskKind::Text,
                        &["Используй термины из лекции", "Приведи простой пример"],
                        &["Наличие ключевых понятий", "Связность объяснения"],
                    )
                } else if contains_any(ACTION_VERBS) {
                    (
                        TaskKind::Action,
                        &["Вспомни алгоритм из базы знаний", "Сделай по шагам"],
                        &["Завершённость работы", "Соответствие требованиям"],
                    )
                } else if contains_any(REFLECTION_VERBS) {
                    (
                        TaskKind::Reflection,
                        &["Сравни два варианта", "Объясни свой выбор"],
                        &["Обоснованность", "Логичность рассуждений"],
                    )
                } else {
                    (
                        TaskKind::Text,
                        &["Начни с базового объяснения"],
                        &["Понятность ответа"],
                    )
                };

            Task {
                id: format!("task_{}", i + 1),
                goal: subgoal.clone(),
                kind,
                instruction: format!("Задание: {}", subgoal),
                hints: hints.iter().map(|s| s.to_string()).collect(),
                evaluation_criteria: criteria.iter().map(|s| s.to_string()).collect(),
                start_time: None,
                status: TaskStatus::NotStarted,
                end_time: None,
                duration_sec: None,
                is_completed: false,
                student_answer: None,
            }
        })
        .collect()
}

/// Mark a task started.
pub fn start_task(slot: &mut OrganizerSlot, task_id: &str, now: f64) -> Result<()> {
    let task = slot
        .task_mut(task_id)
        .ok_or_else(|| Error::Validation(format!("unknown task id: {}", task_id)))?;
    task.start_time = Some(now);
    task.is_completed = false;
    task.status = TaskStatus::InProgress;
    Ok(())
}

/// Mark a task completed, computing its duration when it was started.
pub fn mark_task_complete(slot: &mut OrganizerSlot, task_id: &str, now: f64) -> Result<()> {
    let task = slot
        .task_mut(task_id)
        .ok_or_else(|| Error::Validation(format!("unknown task id: {}", task_id)))?;
    task.end_time = Some(now);
    task.duration_sec = task.start_time.map(|start| (now - start).max(0.0));
    task.is_completed = true;
    task.status = TaskStatus::Completed;
    Ok(())
}

/// Set a task status, optionally recording the student's answer.
pub fn update_task_status(
    slot: &mut OrganizerSlot,
    task_id: &str,
    status: TaskStatus,
    answer: Option<&str>,
) -> Result<()> {
    let task = slot
        .task_mut(task_id)
        .ok_or_else(|| Error::Validation(format!("unknown task id: {}", task_id)))?;
    task.status = status;
    task.is_completed = status == TaskStatus::Completed;
    if let Some(text) = answer {
        task.student_answer = Some(text.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goals() -> Goals {
        Goals {
            main_goal: "Изучить тему: Инфографика".to_string(),
            subgoals: vec![
                "Объяснить ключевые понятия, связанные с темой «Инфографика»".to_string(),
                "Применить знания для выполнения задания по теме".to_string(),
                "Оценить примеры/результаты на основе полученных знаний".to_string(),
            ],
            level: "понимание → применение → оценка".to_string(),
        }
    }

    #[test]
    fn test_tasks_typed_by_verb_family() {
        let tasks = generate_tasks(&goals());
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].kind, TaskKind::Text);
        assert_eq!(tasks[1].kind, TaskKind::Action);
        assert_eq!(tasks[2].kind, TaskKind::Reflection);
        assert_eq!(tasks[0].id, "task_1");
        assert!(tasks[0].instruction.starts_with("Задание: "));
    }

    #[test]
    fn test_unmatched_verb_falls_back_to_text() {
        let goals = Goals {
            main_goal: String::new(),
            subgoals: vec!["Исследовать область применения".to_string()],
            level: String::new(),
        };
        let tasks = generate_tasks(&goals);
        assert_eq!(tasks[0].kind, TaskKind::Text);
        assert_eq!(tasks[0].hints, vec!["Начни с базового объяснения"]);
    }

    #[test]
    fn test_start_then_complete_computes_duration() {
        let mut slot = Organizer.derive(&goals());
        start_task(&mut slot, "task_2", 100.0).unwrap();
        assert_eq!(slot.tasks[1].status, TaskStatus::InProgress);
        mark_task_complete(&mut slot, "task_2", 160.0).unwrap();
        let task = &slot.tasks[1];
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.is_completed);
        assert_eq!(task.duration_sec, Some(60.0));
    }

    #[test]
    fn test_complete_without_start_has_no_duration() {
        let mut slot = Organizer.derive(&goals());
        mark_task_complete(&mut slot, "task_1", 160.0).unwrap();
        assert_eq!(slot.tasks[0].duration_sec, None);
        assert!(slot.tasks[0].is_completed);
    }

    #[test]
    fn test_unknown_task_id_is_rejected() {
        let mut slot = Organizer.derive(&goals());
        assert!(start_task(&mut slot, "task_9", 1.0).is_err());
        assert!(update_task_status(&mut slot, "task_9", TaskStatus::Completed, None).is_err());
        // No task was touched.
        assert!(slot.tasks.iter().all(|t| t.status == TaskStatus::NotStarted));
    }

    #[test]
    fn test_update_status_records_answer() {
        let mut slot = Organizer.derive(&goals());
        update_task_status(
            &mut slot,
            "task_1",
            TaskStatus::NeedsReview,
            Some("Мой ответ"),
        )
        .unwrap();
        assert_eq!(slot.tasks[0].status, TaskStatus::NeedsReview);
        assert_eq!(slot.tasks[0].student_answer.as_deref(), Some("Мой ответ"));
    }
}
