use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::slots::{
    BusSlot, CartographerSlot, ConductorSlot, ExpertSlot, MotivatorSlot, OrganizerSlot,
    ReflectionSlot, TtsSlot, TunerSlot,
};

/// Session delivery mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Live,
    Async,
}

/// Per-component state namespaces.
///
/// Slots materialize lazily: `None` until the owning component first writes,
/// the `*_mut` accessors establish the defaults. Every component mutates only
/// its own slot; cross-reads go through the plain fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Progress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cartographer: Option<CartographerSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<OrganizerSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expert: Option<ExpertSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivator: Option<MotivatorSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conductor: Option<ConductorSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_bus: Option<BusSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<ReflectionSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relational_tuner: Option<TunerSlot>,
}

impl Progress {
    pub fn cartographer_mut(&mut self) -> &mut CartographerSlot {
        self.cartographer.get_or_insert_with(Default::default)
    }

    pub fn organizer_mut(&mut self) -> &mut OrganizerSlot {
        self.organizer.get_or_insert_with(Default::default)
    }

    pub fn expert_mut(&mut self) -> &mut ExpertSlot {
        self.expert.get_or_insert_with(Default::default)
    }

    pub fn motivator_mut(&mut self) -> &mut MotivatorSlot {
        self.motivator.get_or_insert_with(Default::default)
    }

    pub fn conductor_mut(&mut self) -> &mut ConductorSlot {
        self.conductor.get_or_insert_with(Default::default)
    }

    pub fn event_bus_mut(&mut self) -> &mut BusSlot {
        self.event_bus.get_or_insert_with(Default::default)
    }

    pub fn reflection_mut(&mut self) -> &mut ReflectionSlot {
        self.reflection.get_or_insert_with(Default::default)
    }

    pub fn tts_mut(&mut self) -> &mut TtsSlot {
        self.tts.get_or_insert_with(Default::default)
    }

    pub fn relational_tuner_mut(&mut self) -> &mut TunerSlot {
        self.relational_tuner.get_or_insert_with(Default::default)
    }
}

/// The shared per-session state container.
///
/// Exclusively owned by the session; components receive a reference and
/// mutate only their own slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub discipline: String,
    pub lesson_number: u32,
    pub topic: String,
    pub student_level: u8,
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user_question: Option<String>,
    pub progress: Progress,
}

impl SessionContext {
    /// Construct a session context. Missing topic or discipline is the one
    /// fatal, construction-time misconfiguration: it surfaces to the caller
    /// directly because no bus exists yet to report it.
    pub fn new(
        discipline: impl Into<String>,
        lesson_number: u32,
        topic: impl Into<String>,
        student_level: u8,
    ) -> Result<Self> {
        let discipline = discipline.into();
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(Error::InvalidContext("topic must not be empty".to_string()));
        }
        if discipline.trim().is_empty() {
            return Err(Error::InvalidContext(
                "discipline must not be empty".to_string(),
            ));
        }
        if !(1..=4).contains(&student_level) {
            return Err(Error::InvalidContext(format!(
                "student_level must be in 1..=4, got {}",
                student_level
            )));
        }
        Ok(Self {
            discipline,
            lesson_number,
            topic,
            student_level,
            mode: Mode::Live,
            student_id: None,
            task_id: None,
            input_type: None,
            data: None,
            last_user_question: None,
            progress: Progress::default(),
        })
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_student_id(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }
}
