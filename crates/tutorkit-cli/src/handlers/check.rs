use std::path::PathBuf;

use anyhow::Result;

use tutorkit_index::TfidfIndex;
use tutorkit_runtime::Config;

pub fn handle(config_path: Option<PathBuf>, kb: Option<PathBuf>) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = kb {
        config.knowledge.dir = dir;
    }

    let index = TfidfIndex::from_dir(&config.knowledge.dir)?;
    println!("Папка знаний: {}", config.knowledge.dir.display());
    println!("Документов: {}", index.doc_count());
    println!("Размер словаря: {}", index.vocab_size());
    if index.is_empty() {
        println!("База знаний пуста: эксперт будет отвечать заглушкой.");
    }
    Ok(())
}
