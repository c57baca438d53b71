//! Log export: a JSON artifact with session meta plus the bus log, and a
//! CSV projection of the log. Exports are the canonical diagnostic surface
//! of a finished session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;

use tutorkit_types::{ts_human, SessionContext};

/// Paths of the two written artifacts
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

pub struct ExportService<'a> {
    ctx: &'a SessionContext,
}

impl<'a> ExportService<'a> {
    pub fn new(ctx: &'a SessionContext) -> Self {
        Self { ctx }
    }

    /// Write both artifacts into `dir`, named by the session id.
    pub fn export(&self, dir: &Path, now: f64) -> Result<ExportPaths> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export dir: {}", dir.display()))?;

        let session_id = self
            .ctx
            .progress
            .event_bus
            .as_ref()
            .map(|slot| slot.id.to_string())
            .unwrap_or_else(|| "unbound".to_string());
        let short_id: String = session_id.chars().take(8).collect();

        let json_path = dir.join(format!("session_{}.json", short_id));
        let csv_path = dir.join(format!("session_{}.csv", short_id));

        self.write_json(&json_path, &session_id, now)?;
        self.write_csv(&csv_path)?;

        Ok(ExportPaths {
            json: json_path,
            csv: csv_path,
        })
    }

    fn write_json(&self, path: &Path, session_id: &str, now: f64) -> Result<()> {
        let ctx = self.ctx;
        let expert = ctx.progress.expert.as_ref();
        let motivator = ctx.progress.motivator.as_ref();
        let organizer = ctx.progress.organizer.as_ref();
        let conductor = ctx.progress.conductor.as_ref();
        let last_answer = expert.and_then(|slot| slot.last_answer.as_ref());

        let document = json!({
            "meta": {
                "session_id": session_id,
                "saved_at_ts": now,
                "saved_at": ts_human(now),
                "topic": ctx.topic,
                "discipline": ctx.discipline,
                "lesson_number": ctx.lesson_number,
                "modules": {
                    "expert": {
                        "history_len": expert.map(|slot| slot.dialog_history.len()).unwrap_or(0),
                        "last_question": last_answer.map(|a| a.question.clone()),
                        "intents": last_answer.map(|a| a.intents.clone()),
                        "detail": last_answer.map(|a| a.detail),
                    },
                    "motivator": {
                        "level": motivator.map(|slot| slot.level),
                        "last": motivator.and_then(|slot| slot.last.clone()),
                        "drop_count": motivator.map(|slot| slot.drop_count).unwrap_or(0),
                    },
                    "organizer": {
                        "tasks_count": organizer.map(|slot| slot.tasks.len()).unwrap_or(0),
                    },
                    "conductor": {
                        "stage": conductor.map(|slot| slot.stage),
                        "work_turns": conductor.map(|slot| slot.work_turns).unwrap_or(0),
                        "summary": conductor.and_then(|slot| slot.summary.clone()),
                    },
                },
            },
            "eventbus_log": ctx.progress.event_bus.as_ref().map(|slot| &slot.log),
        });

        let content = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write: {}", path.display()))?;
        Ok(())
    }

    fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create: {}", path.display()))?;
        writer.write_record(["ts", "ts_human", "type", "source", "payload_keys"])?;

        if let Some(slot) = self.ctx.progress.event_bus.as_ref() {
            for record in &slot.log {
                writer.write_record([
                    format!("{:.3}", record.ts),
                    ts_human(record.ts),
                    record.event_type.clone(),
                    record.source.clone(),
                    record.payload_keys.join("|"),
                ])?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}
