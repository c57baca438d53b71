use tutorkit_types::{
    token_count, Empathy, EmpathyTone, SessionContext, Situation, TaskStatus,
};

/// How many recent turns the short-reply signal looks at
const RECENT_TURNS: usize = 3;
/// A reply this short reads as disengagement
const SHORT_TOKENS: usize = 4;

/// Keyword families for the text classifier, checked in priority order.
const FRUSTRATION_MARKERS: &[&str] = &["не понимаю", "сложно", "устал", "не получается"];
const ERROR_MARKERS: &[&str] = &["ошибк", "не работает", "неправильно"];
const DOUBT_MARKERS: &[&str] = &["сомнева", "не уверен", "вряд ли"];
const HELP_MARKERS: &[&str] = &["помоги", "подскажи", "не знаю как"];
const SUCCESS_MARKERS: &[&str] = &["получилось", "спасибо", "понятно", "разобрался"];
const END_MARKERS: &[&str] = &["до свидания", "конец занятия", "завершим"];

/// Relational tuner: picks a situation and an empathy phrase for the turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationalTuner;

impl RelationalTuner {
    /// Detect the relational situation. Objective task/dialog signals win
    /// over the text classifier.
    pub fn detect_situation(&self, question: &str, ctx: &SessionContext) -> Situation {
        if let Some(organizer) = &ctx.progress.organizer {
            if organizer
                .tasks
                .iter()
                .any(|t| t.is_completed || t.status == TaskStatus::Completed)
            {
                return Situation::Success;
            }
            if organizer
                .tasks
                .iter()
                .any(|t| t.status == TaskStatus::NeedsReview)
            {
                return Situation::Error;
            }
        }

        if let Some(expert) = &ctx.progress.expert {
            // Current utterance plus the two turns before it.
            let mut recent: Vec<&str> = expert
                .dialog_history
                .iter()
                .rev()
                .take(RECENT_TURNS - 1)
                .map(|a| a.question.as_str())
                .collect();
            recent.push(question);
            if recent.len() >= RECENT_TURNS {
                let short = recent
                    .iter()
                    .filter(|q| token_count(q) <= SHORT_TOKENS)
                    .count();
                if short >= 2 {
                    return Situation::Frustration;
                }
            }
        }

        classify_text(question)
    }

    /// Tone selection: distress and pleas get warmth, wins get energy,
    /// goodbyes get calm.
    pub fn pick_tone(&self, situation: Situation, confidence: f64) -> EmpathyTone {
        match situation {
            Situation::Frustration
            | Situation::Doubt
            | Situation::Error
            | Situation::HelpRequest => EmpathyTone::Warm,
            Situation::Success => EmpathyTone::Excited,
            Situation::End => EmpathyTone::Calm,
            Situation::Start => {
                if confidence < 0.4 {
                    EmpathyTone::Warm
                } else {
                    EmpathyTone::Neutral
                }
            }
        }
    }

    /// Build the empathy descriptor and the framed answer text.
    pub fn embellish(
        &self,
        question: &str,
        answer: &str,
        confidence: f64,
        ctx: &SessionContext,
    ) -> (Empathy, String) {
        let situation = self.detect_situation(question, ctx);
        let tone = self.pick_tone(situation, confidence);
        let phrase = phrase_for(situation, tone).to_string();

        let (intro, outro) = if situation.prefers_intro() {
            (Some(phrase), None)
        } else {
            (None, Some(phrase))
        };

        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(text) = intro.as_deref() {
            parts.push(text);
        }
        parts.push(answer);
        if let Some(text) = outro.as_deref() {
            parts.push(text);
        }
        let framed = parts.join("\n\n");

        let empathy = Empathy {
            situation,
            tone,
            intro,
            outro,
        };
        (empathy, framed)
    }
}

fn classify_text(question: &str) -> Situation {
    let q = question.to_lowercase();
    let contains_any = |markers: &[&str]| markers.iter().any(|m| q.contains(m));
    if contains_any(FRUSTRATION_MARKERS) {
        Situation::Frustration
    } else if contains_any(ERROR_MARKERS) {
        Situation::Error
    } else if contains_any(DOUBT_MARKERS) {
        Situation::Doubt
    } else if contains_any(HELP_MARKERS) {
        Situation::HelpRequest
    } else if contains_any(SUCCESS_MARKERS) {
        Situation::Success
    } else if contains_any(END_MARKERS) {
        Situation::End
    } else {
        Situation::Start
    }
}

/// Phrase library indexed by (situation, tone).
fn phrase_for(situation: Situation, tone: EmpathyTone) -> &'static str {
    match (situation, tone) {
        (Situation::Start, EmpathyTone::Warm) => {
            "Рад, что ты здесь. Начнём спокойно, шаг за шагом."
        }
        (Situation::Start, _) => "Хороший вопрос для начала. Разберём по порядку.",
        (Situation::Success, EmpathyTone::Excited) => {
            "Отличная работа! Видно, что материал становится твоим."
        }
        (Situation::Success, _) => "Хороший результат, так держать.",
        (Situation::Error, _) => {
            "Ошибки — нормальная часть обучения. Посмотрим, что можно поправить."
        }
        (Situation::Doubt, _) => "Сомневаться — значит думать. Давай проверим вместе.",
        (Situation::Frustration, _) => {
            "Понимаю, что сейчас непросто. Сбавим темп и разберём по шагам."
        }
        (Situation::HelpRequest, _) => "Конечно, помогу. Начнём с главного.",
        (Situation::End, EmpathyTone::Calm) => "Хорошая работа сегодня. До встречи на следующем занятии!",
        (Situation::End, _) => "На сегодня всё. До встречи!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorkit_types::{Task, TaskKind};

    fn ctx() -> SessionContext {
        SessionContext::new("Цифровая культура", 1, "Инфографика", 2).unwrap()
    }

    fn task(status: TaskStatus, completed: bool) -> Task {
        Task {
            id: "task_1".to_string(),
            goal: "Применить знания".to_string(),
            kind: TaskKind::Action,
            instruction: "Задание: применить знания".to_string(),
            hints: vec![],
            evaluation_criteria: vec![],
            start_time: None,
            status,
            end_time: None,
            duration_sec: None,
            is_completed: completed,
            student_answer: None,
        }
    }

    #[test]
    fn test_completed_task_wins_over_text() {
        let mut ctx = ctx();
        ctx.progress.organizer_mut().tasks = vec![task(TaskStatus::Completed, true)];
        let tuner = RelationalTuner;
        // Even a frustrated utterance yields success while a task is done.
        assert_eq!(
            tuner.detect_situation("ничего не понимаю", &ctx),
            Situation::Success
        );
    }

    #[test]
    fn test_needs_review_task_reads_as_error() {
        let mut ctx = ctx();
        ctx.progress.organizer_mut().tasks = vec![task(TaskStatus::NeedsReview, false)];
        let tuner = RelationalTuner;
        assert_eq!(
            tuner.detect_situation("что дальше?", &ctx),
            Situation::Error
        );
    }

    #[test]
    fn test_classifier_families() {
        let ctx = ctx();
        let tuner = RelationalTuner;
        assert_eq!(
            tuner.detect_situation("я устал и ничего не выходит", &ctx),
            Situation::Frustration
        );
        assert_eq!(
            tuner.detect_situation("подскажи пожалуйста с палитрой", &ctx),
            Situation::HelpRequest
        );
        assert_eq!(
            tuner.detect_situation("спасибо, всё получилось", &ctx),
            Situation::Success
        );
        assert_eq!(
            tuner.detect_situation("какой размер шрифта выбрать", &ctx),
            Situation::Start
        );
    }

    #[test]
    fn test_placement_policy() {
        let ctx = ctx();
        let tuner = RelationalTuner;
        let (empathy, framed) = tuner.embellish("ничего не понимаю", "Ответ.", 0.5, &ctx);
        assert_eq!(empathy.situation, Situation::Frustration);
        assert!(empathy.intro.is_some());
        assert!(empathy.outro.is_none());
        assert!(framed.ends_with("Ответ."));

        let (empathy, framed) = tuner.embellish("спасибо, получилось", "Ответ.", 0.5, &ctx);
        assert_eq!(empathy.situation, Situation::Success);
        assert!(empathy.intro.is_none());
        assert!(empathy.outro.is_some());
        assert!(framed.starts_with("Ответ."));
    }
}
