use std::io::BufRead;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use tutorkit_index::{load_documents, TfidfIndex};
use tutorkit_runtime::{Config, EventBus, ExportService, SessionRuntime};
use tutorkit_types::{
    EventPayload, EventType, SessionContext, SharedClock, Stage, SystemClock,
};

use crate::args::RunArgs;

pub fn handle(config_path: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    apply_overrides(&mut config, &args);

    let docs = match load_documents(&config.knowledge.dir) {
        Ok(docs) => docs,
        Err(err) => {
            // The expert degrades to its apology; the lesson still runs.
            eprintln!("Предупреждение: {}", err);
            Vec::new()
        }
    };
    let index = TfidfIndex::fit(docs.clone());

    let ctx = SessionContext::new(
        config.lesson.discipline.clone(),
        config.lesson.lesson_number,
        config.lesson.topic.clone(),
        config.lesson.student_level,
    )?
    .with_mode(config.lesson.mode);

    let clock: SharedClock = Rc::new(SystemClock);
    let runtime = SessionRuntime::new(&config, ctx, index, docs, Rc::clone(&clock), None)?;
    attach_printer(runtime.bus());

    runtime.start();
    print_lesson_map(&runtime);

    let mut answers_seen = 0usize;
    let mut prompts_seen = prompts_asked(&runtime);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text.to_lowercase().as_str(), "выход" | "exit" | "quit") {
            break;
        }

        runtime.bus().publish(
            "cli",
            EventPayload::StudentQuestion {
                text: text.to_string(),
            },
        );

        render_turn(&runtime, &mut answers_seen, &mut prompts_seen);

        if current_stage(&runtime) == Stage::Finished {
            break;
        }
    }

    export_logs(&runtime, &config, &clock)?;
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(kb) = &args.kb {
        config.knowledge.dir = kb.clone();
    }
    if let Some(topic) = &args.topic {
        config.lesson.topic = topic.clone();
    }
    if let Some(discipline) = &args.discipline {
        config.lesson.discipline = discipline.clone();
    }
    if let Some(lesson) = args.lesson {
        config.lesson.lesson_number = lesson;
    }
    if let Some(level) = args.level {
        config.lesson.student_level = level;
    }
    if let Some(dir) = &args.export_dir {
        config.export.dir = dir.clone();
    }
    if args.no_tts {
        config.tts.enabled = false;
    }
}

/// Print bus notices as they happen; answers are rendered per turn from the
/// context so they appear after the lifecycle chatter.
fn attach_printer(bus: &EventBus) {
    bus.subscribe(EventType::Warning, |event, _| {
        if let EventPayload::Warning { msg } = &event.payload {
            println!("{}", paint_dim(msg));
        }
        Ok(())
    });
    bus.subscribe(EventType::TtsFailed, |event, _| {
        if let EventPayload::TtsFailed { reason, .. } = &event.payload {
            println!("{}", paint_dim(&format!("Озвучка недоступна: {}", reason)));
        }
        Ok(())
    });
    bus.subscribe(EventType::TtsDone, |event, _| {
        if let EventPayload::TtsDone { audio, .. } = &event.payload {
            println!("{}", paint_dim(&format!("Аудио: {}", audio)));
        }
        Ok(())
    });
    bus.subscribe(EventType::LessonFinished, |event, _| {
        if let EventPayload::LessonFinished { summary } = &event.payload {
            println!("\n{}", paint_title("Занятие завершено"));
            println!("  Тема: {}", summary.topic);
            println!("  Ответов: {}", summary.answers_count);
            println!("  Рабочих ходов: {}", summary.work_turns);
            println!("  Уровень мотивации: {}", summary.motivation_level);
            println!("  Стиль: {} ({})", summary.style.style, summary.style.pace.as_str());
        }
        Ok(())
    });
    bus.subscribe(EventType::Error, |event, _| {
        if let EventPayload::Error { reason, during } = &event.payload {
            eprintln!("Ошибка обработчика ({}): {}", during, reason);
        }
        Ok(())
    });
}

fn print_lesson_map(runtime: &SessionRuntime) {
    let ctx = runtime.context();
    let ctx = ctx.borrow();
    if let Some(cartographer) = &ctx.progress.cartographer {
        println!("{}\n", cartographer.text_map);
    }
    if let Some(organizer) = &ctx.progress.organizer {
        println!("{}", paint_title("Задания"));
        for task in &organizer.tasks {
            println!("  [{}] {}", task.id, task.instruction);
        }
        println!();
    }
}

fn render_turn(runtime: &SessionRuntime, answers_seen: &mut usize, prompts_seen: &mut usize) {
    let ctx = runtime.context();
    let ctx = ctx.borrow();

    if let Some(expert) = &ctx.progress.expert {
        if expert.dialog_history.len() > *answers_seen {
            *answers_seen = expert.dialog_history.len();
            if let Some(answer) = &expert.last_answer {
                println!("\n{}", answer.answer_empathic);
                if !answer.sources.is_empty() {
                    println!("{}", paint_dim(&format!("Источники: {}", answer.sources.join(", "))));
                }
                for step in &answer.next_steps {
                    println!("{}", paint_dim(&format!("→ {}", step)));
                }
                println!();
            }
        }
    }

    if let Some(reflection) = &ctx.progress.reflection {
        if reflection.asked.len() > *prompts_seen {
            *prompts_seen = reflection.asked.len();
            if let Some(prompt) = reflection.asked.last() {
                println!("{}", paint_title(&format!("Вопрос для рефлексии: {}", prompt)));
            }
        }
    }
}

fn prompts_asked(runtime: &SessionRuntime) -> usize {
    let ctx = runtime.context();
    let ctx = ctx.borrow();
    ctx.progress
        .reflection
        .as_ref()
        .map(|slot| slot.asked.len())
        .unwrap_or(0)
}

fn current_stage(runtime: &SessionRuntime) -> Stage {
    let ctx = runtime.context();
    let ctx = ctx.borrow();
    ctx.progress
        .conductor
        .as_ref()
        .map(|slot| slot.stage)
        .unwrap_or_default()
}

fn export_logs(runtime: &SessionRuntime, config: &Config, clock: &SharedClock) -> Result<()> {
    let ctx = runtime.context();
    let ctx = ctx.borrow();
    let paths = ExportService::new(&ctx).export(&config.export.dir, clock.now_ts())?;
    println!(
        "{}",
        paint_dim(&format!(
            "Лог сессии: {} / {}",
            paths.json.display(),
            paths.csv.display()
        ))
    );
    Ok(())
}

fn paint_title(text: &str) -> String {
    if std::io::stdout().is_terminal() {
        text.bold().cyan().to_string()
    } else {
        text.to_string()
    }
}

fn paint_dim(text: &str) -> String {
    if std::io::stdout().is_terminal() {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}
