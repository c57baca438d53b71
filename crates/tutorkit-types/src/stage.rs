use serde::{Deserialize, Serialize};

/// Lesson lifecycle stage.
///
/// The conductor only moves along the declared edge set below; every
/// violation is reported as a `warning` event and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Start,
    Goals,
    Tasks,
    Work,
    Reflection,
    Wrapup,
    Finished,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Goals => "goals",
            Stage::Tasks => "tasks",
            Stage::Work => "work",
            Stage::Reflection => "reflection",
            Stage::Wrapup => "wrapup",
            Stage::Finished => "finished",
        }
    }

    /// Declared transition graph: the forward chain, re-entry self-edges
    /// (stage restarts), the `any → start` edge used by a full restart and
    /// the `finished → goals` edge taken when `init` re-opens a finished
    /// lesson.
    pub fn can_transition(from: Stage, to: Stage) -> bool {
        use Stage::*;
        if from == to || to == Start {
            return true;
        }
        matches!(
            (from, to),
            (Start, Goals)
                | (Goals, Tasks)
                | (Tasks, Work)
                | (Work, Reflection)
                | (Reflection, Wrapup)
                | (Wrapup, Finished)
                | (Finished, Goals)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_chain() {
        let chain = [
            Stage::Start,
            Stage::Goals,
            Stage::Tasks,
            Stage::Work,
            Stage::Reflection,
            Stage::Wrapup,
            Stage::Finished,
        ];
        for pair in chain.windows(2) {
            assert!(Stage::can_transition(pair[0], pair[1]));
        }
    }

    #[test]
    fn test_no_skipping() {
        assert!(!Stage::can_transition(Stage::Start, Stage::Work));
        assert!(!Stage::can_transition(Stage::Goals, Stage::Reflection));
        assert!(!Stage::can_transition(Stage::Finished, Stage::Work));
    }

    #[test]
    fn test_restart_edges() {
        assert!(Stage::can_transition(Stage::Work, Stage::Work));
        assert!(Stage::can_transition(Stage::Finished, Stage::Start));
        assert!(Stage::can_transition(Stage::Work, Stage::Start));
        assert!(Stage::can_transition(Stage::Finished, Stage::Goals));
    }
}
