use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vnote_merge::MergeStrategy;

#[derive(Parser)]
#[command(name = "vnote", about = "VerseNote: verse-keyed notes and research", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory (defaults to $VNOTE_HOME, then ./.vnote)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write, delete or show the personal note on a verse
    Note(NoteArgs),
    /// Add or delete research entries
    Research(ResearchArgs),
    /// Export notes and cached Bible text as JSON
    Export(ExportArgs),
    /// Import a notes, Bible-text or combined backup document
    Import(ImportArgs),
    /// Render all notes as plain text or HTML
    Render(RenderArgs),
    /// Search notes and research
    Search(SearchArgs),
    /// Show store statistics
    Stats,
    /// Delete every record
    Clear(ClearArgs),
}

#[derive(Args)]
pub struct NoteArgs {
    #[command(subcommand)]
    pub action: NoteAction,
}

#[derive(Subcommand)]
pub enum NoteAction {
    /// Replace the note on a verse key, e.g. john_3_16
    Set { key: String, text: String },
    Delete { key: String },
    Show { key: String },
}

#[derive(Args)]
pub struct ResearchArgs {
    #[command(subcommand)]
    pub action: ResearchAction,
}

#[derive(Subcommand)]
pub enum ResearchAction {
    Add {
        key: String,
        query: String,
        response: String,
        #[arg(long)]
        selected: Option<String>,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    Delete { key: String, id: String },
}

#[derive(Args)]
pub struct ExportArgs {
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long, conflicts_with = "texts_only")]
    pub notes_only: bool,
    #[arg(long)]
    pub texts_only: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: PathBuf,
    /// replace, merge_newer, merge_combine or skip_existing
    #[arg(long)]
    pub strategy: Option<MergeStrategy>,
}

#[derive(Args)]
pub struct RenderArgs {
    #[arg(long, default_value = "text")]
    pub format: RenderFormat,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum RenderFormat {
    Text,
    Html,
}

#[derive(Args)]
pub struct SearchArgs {
    pub query: String,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Required; clearing cannot be undone
    #[arg(long)]
    pub yes: bool,
    /// Also drop cached Bible text
    #[arg(long)]
    pub texts: bool,
}
