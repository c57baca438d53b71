use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tutorkit")]
#[command(about = "Interactive tutoring session over a local knowledge folder", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Knowledge folder with .txt/.md lesson documents
    #[arg(long)]
    pub kb: Option<PathBuf>,

    /// Lesson topic
    #[arg(long)]
    pub topic: Option<String>,

    /// Discipline name
    #[arg(long)]
    pub discipline: Option<String>,

    /// Lesson number
    #[arg(long)]
    pub lesson: Option<u32>,

    /// Student level, 1..=4
    #[arg(long)]
    pub level: Option<u8>,

    /// Directory for exported session logs
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Disable speech synthesis
    #[arg(long)]
    pub no_tts: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an interactive lesson: init, then stdin lines become questions
    Run(RunArgs),

    /// Index a knowledge folder and report corpus stats
    Check {
        /// Knowledge folder to inspect
        #[arg(long)]
        kb: Option<PathBuf>,
    },
}
