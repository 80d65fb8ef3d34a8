//! Command-line interface for the wn_edit library.
//!
//! Manages lexicons in the local store and makes small edits to them.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{LevelFilter, debug, error, info};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wn_edit::{
    Capabilities, LoadOptions, NewSynset, Store, WordnetEditor,
    error::Result,
    models::PartOfSpeech,
    progress::{ProgressCallback, ProgressUpdate},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "WordNet lexicon editor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a custom database file (optional)
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Set verbosity level (use -v, -vv, or -vvv for increasing verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List installed lexicons
    List,
    /// Add the lexicons of a WN-LMF file (.xml or .xml.gz) to the database
    Import {
        file: PathBuf,
    },
    /// Write an installed lexicon to a WN-LMF file
    Export {
        /// Lexicon specifier, e.g. oewn:2024
        specifier: String,
        output: PathBuf,
        /// WN-LMF version to write
        #[arg(long, default_value = "1.4")]
        lmf_version: String,
    },
    /// Show synset, entry and sense counts of a lexicon
    Stats {
        specifier: String,
    },
    /// Look up a word in a lexicon, optionally filtering by part of speech (n, v, a, r, s)
    Lookup {
        specifier: String,
        word: String,
        pos: Option<PartOfSpeech>,
    },
    /// Add a synset to a lexicon and write or commit the result
    AddSynset {
        specifier: String,
        #[arg(long)]
        pos: PartOfSpeech,
        #[arg(long)]
        definition: String,
        /// Word to add to the synset (repeatable)
        #[arg(long = "word", required = true)]
        words: Vec<String>,
        /// Synset id the new synset is a hyponym of
        #[arg(long)]
        hypernym: Option<String>,
        /// File to export the edited lexicon to
        #[arg(long)]
        output: Option<PathBuf>,
        /// Version for the edited lexicon; required with --commit
        #[arg(long)]
        as_version: Option<String>,
        /// Add the edited lexicon to the database
        #[arg(long, default_value_t = false)]
        commit: bool,
    },
    /// Remove lexicons matching a specifier (use id:* for all versions)
    Remove {
        specifier: String,
    },
    /// Delete the database file
    ClearDb,
}

/// Sets up logging based on verbosity level.
fn setup_logging(verbose: u8) {
    let log_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

/// Creates a progress callback that draws one bar per import stage.
fn create_progress_callback(
    multi_progress: MultiProgress,
    progress_bars: Arc<Mutex<HashMap<String, ProgressBar>>>,
) -> ProgressCallback {
    Box::new(move |update: ProgressUpdate| {
        let Ok(mut bars) = progress_bars.lock() else {
            return true;
        };

        if update.current_item == 0 && !bars.contains_key(&update.stage_description) {
            let pb = multi_progress.add(ProgressBar::new(update.total_items.unwrap_or(0)));
            let style_template = if update.total_items.is_some() {
                "{prefix:>12.cyan.bold} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({percent}%) {msg}"
            } else {
                "{prefix:>12.cyan.bold} [{elapsed_precise}] {spinner} {msg}"
            };
            let style = ProgressStyle::default_bar()
                .template(style_template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-");
            pb.set_style(style);
            pb.set_prefix(update.stage_description.clone());
            pb.set_message(update.message.unwrap_or_default());
            pb.enable_steady_tick(Duration::from_millis(100));
            bars.insert(update.stage_description.clone(), pb);
        } else if let Some(pb) = bars.get(&update.stage_description) {
            pb.set_position(update.current_item);
            if let Some(msg) = update.message {
                pb.set_message(msg);
            }
            if let Some(total) = update.total_items {
                if update.current_item >= total {
                    pb.finish_and_clear();
                }
            }
        }
        true
    })
}

fn open_store(db_path: Option<&str>) -> Result<Store> {
    match db_path {
        Some(path) => Store::open(Path::new(path)),
        None => Store::open_default(),
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let start_time = Instant::now();
    let outcome = run(&cli);
    debug!("Command finished in {:.2?}", start_time.elapsed());

    if let Err(e) = outcome {
        error!("Command failed: {}", e);
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if let Commands::ClearDb = cli.command {
        info!("Clearing database...");
        Store::clear_database(cli.db_path.as_ref().map(PathBuf::from))?;
        println!("{}", "Database cleared successfully.".green());
        return Ok(());
    }

    let mut store = open_store(cli.db_path.as_deref())?;
    match &cli.command {
        Commands::List => handle_list(&store),
        Commands::Import { file } => handle_import(&mut store, file),
        Commands::Export {
            specifier,
            output,
            lmf_version,
        } => {
            let options = LoadOptions {
                lmf_version: lmf_version.clone(),
                ..Default::default()
            };
            let editor = WordnetEditor::open(&store, specifier, &options, Capabilities::default())?;
            editor.export(output)?;
            println!("Exported {} to {}", specifier.bold(), output.display());
            Ok(())
        }
        Commands::Stats { specifier } => {
            let editor = open_editor(&store, specifier)?;
            println!("{}: {}", editor.lexicon().specifier().bold().cyan(), editor.stats());
            Ok(())
        }
        Commands::Lookup {
            specifier,
            word,
            pos,
        } => handle_lookup(&store, specifier, word, *pos),
        Commands::AddSynset {
            specifier,
            pos,
            definition,
            words,
            hypernym,
            output,
            as_version,
            commit,
        } => {
            let options = LoadOptions {
                version: as_version.clone(),
                ..Default::default()
            };
            let mut editor =
                WordnetEditor::open(&store, specifier, &options, Capabilities::default())?;
            let mut new = NewSynset::new(*pos).definition(definition);
            for word in words {
                new = new.word(word);
            }
            let synset_id = editor.create_synset(new)?.id.clone();
            if let Some(target) = hypernym {
                if let Some(advisory) =
                    editor.add_synset_relation(&synset_id, target, "hypernym", true)?
                {
                    println!("{}", advisory.to_string().yellow());
                }
            }
            println!("Created synset {}", synset_id.green());
            if let Some(output) = output {
                editor.export(output)?;
                println!("Wrote {}", output.display());
            }
            if *commit {
                editor.commit(&mut store)?;
                println!("Committed {}", editor.lexicon().specifier().green());
            }
            Ok(())
        }
        Commands::Remove { specifier } => {
            let removed = store.remove_lexicon(specifier)?;
            println!("Removed {} lexicon(s).", removed.to_string().bold());
            Ok(())
        }
        Commands::ClearDb => Ok(()),
    }
}

fn open_editor(store: &Store, specifier: &str) -> Result<WordnetEditor> {
    WordnetEditor::open(
        store,
        specifier,
        &LoadOptions::default(),
        Capabilities::default(),
    )
}

fn handle_list(store: &Store) -> Result<()> {
    let lexicons = store.lexicons()?;
    if lexicons.is_empty() {
        println!("{}", "No lexicons installed.".yellow());
        return Ok(());
    }
    for info in lexicons {
        println!(
            "{}\t{}\t[{}]",
            info.specifier().bold().cyan(),
            info.label,
            info.language.dimmed()
        );
    }
    Ok(())
}

fn handle_import(store: &mut Store, file: &Path) -> Result<()> {
    let multi_progress = MultiProgress::new();
    let progress_bars = Arc::new(Mutex::new(HashMap::<String, ProgressBar>::new()));
    let callback = create_progress_callback(multi_progress.clone(), progress_bars.clone());

    let result = store.import_file(file, Some(callback));

    if let Ok(bars) = progress_bars.lock() {
        for pb in bars.values() {
            pb.finish_and_clear();
        }
    }
    drop(multi_progress);
    std::io::stdout().flush().ok();

    result?;
    println!("{}", format!("Imported {}", file.display()).green());
    Ok(())
}

/// Prints every sense of `word` with its definitions and synonyms.
fn handle_lookup(
    store: &Store,
    specifier: &str,
    word: &str,
    pos_filter: Option<PartOfSpeech>,
) -> Result<()> {
    let editor = open_editor(store, specifier)?;
    let entries = editor.find_entries(word, pos_filter);
    if entries.is_empty() {
        println!("No entries found for '{}'.", word.yellow());
        return Ok(());
    }

    for entry in entries {
        println!(
            "\n{} ~ {}",
            entry.lemma.written_form.bold().cyan(),
            entry.lemma.part_of_speech.to_string().italic()
        );
        if !entry.lemma.pronunciations.is_empty() {
            let prons: Vec<String> = entry
                .lemma
                .pronunciations
                .iter()
                .map(|p| format!("{}[{}]", p.text.green(), p.variety.dimmed()))
                .collect();
            println!("  Pronunciations: {}", prons.join(", "));
        }

        for (counter, sense) in entry.senses.iter().enumerate() {
            let Some(synset) = editor.get_synset(&sense.synset) else {
                println!("  {}: {}", (counter + 1).to_string().bold(), sense.synset.dimmed());
                continue;
            };
            for def in &synset.definitions {
                println!("  {}: {}", (counter + 1).to_string().bold(), def.text.trim());
            }
            for example in &synset.examples {
                println!("        {}", example.text.trim().italic());
            }

            let mut synonyms: Vec<&str> = editor
                .senses_for_synset(&synset.id)
                .into_iter()
                .filter(|s| s.id != sense.id)
                .filter_map(|s| editor.get_sense_entry(&s.id))
                .map(|e| e.lemma.written_form.as_str())
                .collect();
            synonyms.sort_unstable();
            synonyms.dedup();
            if !synonyms.is_empty() {
                println!(
                    "        {}: {}",
                    "Synonyms".magenta(),
                    synonyms.join(", ").green()
                );
            }
        }
    }
    println!();
    Ok(())
}
