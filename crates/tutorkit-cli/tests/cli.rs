use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn knowledge_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("doc1.txt"),
        "Инфографика — это сочетание данных, текста и визуальных образов.",
    )
    .unwrap();
    fs::write(
        dir.path().join("doc2.txt"),
        "Столбчатая диаграмма подходит для сравнения значений между категориями.",
    )
    .unwrap();
    dir
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("tutorkit")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn check_reports_corpus_stats() {
    let kb = knowledge_dir();
    Command::cargo_bin("tutorkit")
        .unwrap()
        .args(["check", "--kb"])
        .arg(kb.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Документов: 2"));
}

#[test]
fn check_fails_on_missing_folder() {
    Command::cargo_bin("tutorkit")
        .unwrap()
        .args(["check", "--kb", "/nonexistent/tutorkit-kb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("knowledge dir not found"));
}

#[test]
fn full_session_over_stdin_finishes_cleanly() {
    let kb = knowledge_dir();
    let export = TempDir::new().unwrap();

    Command::cargo_bin("tutorkit")
        .unwrap()
        .args(["run", "--no-tts", "--topic", "Инфографика", "--kb"])
        .arg(kb.path())
        .arg("--export-dir")
        .arg(export.path())
        .write_stdin(
            "С чего начать подготовку данных?\n\
             Как выбрать подходящий тип диаграммы?\n\
             Немного волновался, но стало понятнее.\n",
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("Главная цель занятия"))
        .stdout(predicate::str::contains("Вопрос для рефлексии"))
        .stdout(predicate::str::contains("Занятие завершено"));

    let exported: Vec<_> = fs::read_dir(export.path()).unwrap().collect();
    assert_eq!(exported.len(), 2);
}
