use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use vnote_merge::{export_backup, export_notes, export_texts, CancellationToken, ImportReport, Reconciler};
use vnote_snapshot::{render_html, render_text};
use vnote_store::{ChapterTextStore, FileKvStore, ResearchDraft, VerseRecordStore};
use vnote_types::{PersonalNote, VerseKey, VerseRecord};

use crate::cli::*;
use crate::config::{resolve_data_dir, CliConfig};

/// Both stores of one data directory.
struct Stores {
    records: VerseRecordStore<FileKvStore>,
    texts: ChapterTextStore<FileKvStore>,
}

impl Stores {
    fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let records = FileKvStore::open(data_dir.join("notes"))
            .with_context(|| format!("opening notes store in {}", data_dir.display()))?;
        let texts = FileKvStore::open(data_dir.join("texts"))
            .with_context(|| format!("opening text store in {}", data_dir.display()))?;
        Ok(Self {
            records: VerseRecordStore::new(records),
            texts: ChapterTextStore::new(texts),
        })
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);
    let config = CliConfig::load(&data_dir)?;
    let stores = Stores::open(&data_dir)?;
    tracing::debug!(data_dir = %data_dir.display(), "opened stores");

    match cli.command {
        Command::Note(args) => cmd_note(&stores, args.action),
        Command::Research(args) => cmd_research(&stores, args.action),
        Command::Export(args) => cmd_export(&stores, &config, args),
        Command::Import(args) => cmd_import(&stores, &config, args),
        Command::Render(args) => cmd_render(&stores, args),
        Command::Search(args) => cmd_search(&stores, &args.query),
        Command::Stats => cmd_stats(&stores),
        Command::Clear(args) => cmd_clear(&stores, args),
    }
}

fn parse_key(key: &str) -> anyhow::Result<VerseKey> {
    VerseKey::parse(key).with_context(|| format!("invalid verse key {key:?}"))
}

fn cmd_note(stores: &Stores, action: NoteAction) -> anyhow::Result<()> {
    match action {
        NoteAction::Set { key, text } => {
            let key = parse_key(&key)?;
            let note = PersonalNote::new(text, stores.records.now());
            stores.records.save_note(&key, note)?;
            println!("{} Saved note on {}", "✓".green().bold(), key.reference().bold());
        }
        NoteAction::Delete { key } => {
            let key = parse_key(&key)?;
            stores.records.delete_note(&key)?;
            println!("{} Deleted note on {}", "✓".green().bold(), key.reference().bold());
        }
        NoteAction::Show { key } => {
            let key = parse_key(&key)?;
            match stores.records.get(&key)? {
                Some(record) => print_record(&record),
                None => println!("Nothing stored for {}", key.reference().bold()),
            }
        }
    }
    Ok(())
}

fn print_record(record: &VerseRecord) {
    println!("{}  {}", record.key.reference().bold(), record.key.to_string().dimmed());
    if let Some(note) = &record.personal_note {
        println!("  {} (updated {})", "Note".cyan(), note.updated_at);
        for line in note.plain_text().lines() {
            println!("    {line}");
        }
    }
    for entry in &record.ai_research {
        println!("  {} {}", "Research".cyan(), entry.id.dimmed());
        println!("    Q: {}", entry.query);
        println!("    A: {}", entry.response);
        if let Some(tags) = entry.tags.as_ref().filter(|t| !t.is_empty()) {
            println!("    Tags: {}", tags.join(", ").yellow());
        }
    }
}

fn cmd_research(stores: &Stores, action: ResearchAction) -> anyhow::Result<()> {
    match action {
        ResearchAction::Add { key, query, response, selected, tags } => {
            let key = parse_key(&key)?;
            let mut draft = ResearchDraft::new(query, response).with_tags(tags);
            if let Some(text) = selected {
                draft = draft.with_selected_text(text);
            }
            let id = stores.records.add_research(&key, draft)?;
            println!("{} Added research {} on {}", "✓".green().bold(), id.yellow(), key.reference().bold());
        }
        ResearchAction::Delete { key, id } => {
            let key = parse_key(&key)?;
            if stores.records.delete_research(&key, &id)? {
                println!("{} Deleted research {}", "✓".green().bold(), id.yellow());
            } else {
                println!("No research {} on {}", id.yellow(), key.reference().bold());
            }
        }
    }
    Ok(())
}

fn cmd_export(stores: &Stores, config: &CliConfig, args: ExportArgs) -> anyhow::Result<()> {
    let device_id = config.device_id.as_deref();
    let json = if args.notes_only {
        to_json(&export_notes(&stores.records, device_id)?, config.pretty)?
    } else if args.texts_only {
        to_json(&export_texts(&stores.texts)?, config.pretty)?
    } else {
        to_json(&export_backup(&stores.records, &stores.texts, device_id)?, config.pretty)?
    };
    write_output(args.output.as_deref(), &json)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} Wrote {}", "✓".green().bold(), path.display().to_string().bold());
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn cmd_import(stores: &Stores, config: &CliConfig, args: ImportArgs) -> anyhow::Result<()> {
    let raw = read_input(&args.file)?;
    let strategy = args.strategy.unwrap_or(config.default_strategy);
    let summary = Reconciler::new(&stores.records, &stores.texts)
        .import_document(&raw, strategy, &CancellationToken::new())
        .with_context(|| format!("importing {}", args.file.display()))?;

    println!("Imported {} using {}", summary.kind.to_string().bold(), strategy.to_string().cyan());
    if let Some(report) = &summary.notes {
        print_report("Notes", report);
    }
    if let Some(report) = &summary.texts {
        print_report("Bible text", report);
    }
    if !summary.success() {
        bail!("import finished with {} error(s)", summary.errors().len());
    }
    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_report(section: &str, report: &ImportReport) {
    println!(
        "  {}: {} imported, {} skipped, {} errors",
        section,
        report.imported.to_string().green(),
        report.skipped.to_string().yellow(),
        report.errors.len().to_string().red()
    );
    for error in &report.errors {
        println!("    {} {}", "✗".red(), error);
    }
}

fn cmd_render(stores: &Stores, args: RenderArgs) -> anyhow::Result<()> {
    let records = stores.records.scan_all()?;
    let rendered = match args.format {
        RenderFormat::Text => render_text(&records),
        RenderFormat::Html => render_html(&records),
    };
    write_output(args.output.as_deref(), &rendered)
}

fn cmd_search(stores: &Stores, query: &str) -> anyhow::Result<()> {
    let hits = stores.records.search(query)?;
    if hits.is_empty() {
        println!("No matches for {}", query.bold());
    }
    for record in &hits {
        print_record(record);
    }
    Ok(())
}

fn cmd_stats(stores: &Stores) -> anyhow::Result<()> {
    let stats = stores.records.stats()?;
    let chapters = stores.texts.scan_all()?.len();
    println!("Records:          {}", stats.records.to_string().bold());
    println!("Notes:            {}", stats.notes.to_string().bold());
    println!("Research entries: {}", stats.research_entries.to_string().bold());
    println!("Books:            {}", stats.books.join(", "));
    println!("Cached chapters:  {}", chapters.to_string().bold());
    Ok(())
}

fn cmd_clear(stores: &Stores, args: ClearArgs) -> anyhow::Result<()> {
    if !args.yes {
        bail!("refusing to clear without --yes");
    }
    stores.records.clear()?;
    if args.texts {
        stores.texts.clear()?;
    }
    println!("{} Cleared", "✓".green().bold());
    Ok(())
}
