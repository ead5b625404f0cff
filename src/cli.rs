use std::cmp;
use std::error::Error;
use std::path::PathBuf;
#[cfg(feature = "web")]
use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use jmdict_bot::data::normalize_language;
use jmdict_bot::{Analyzer, BotConfig, Entry, Lexicon, format, logging, snapshot};
use serde_json::json;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "jmdict-bot", about = "Japanese dictionary chat bot", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Config file; defaults to $CONFIG_PATH/config.json or ./config.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JMdict XML file or compiled snapshot, overriding the config.
    #[arg(long, global = true)]
    dict: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the webhook server.
    #[cfg(feature = "web")]
    Serve {
        /// Listen address, overriding the config.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// List every dictionary word found inside a phrase.
    #[command(alias = "analyze")]
    Analyse {
        #[arg(required = true)]
        phrase: Vec<String>,
    },
    /// Print the definitions indexed under an exact phrase.
    Define {
        phrase: String,
        /// Gloss language (ISO 639-2).
        #[arg(short, long)]
        lang: Option<String>,
    },
    /// Show every entry stored under a JMdict entry id.
    Show { entry_id: String },
    /// List phrases that start with the provided prefix.
    Prefix {
        prefix: String,
        /// Maximum number of matches to return.
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Parse the dictionary once and write a snapshot that loads much faster.
    Compile { output: PathBuf },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(None);

    let mut config = BotConfig::load(cli.config.as_deref())?;
    if let Some(dict) = cli.dict {
        config.jmdict_file = dict;
    }
    let as_json = cli.json;

    match cli.command {
        #[cfg(feature = "web")]
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            handle_serve(config)
        }
        Command::Analyse { phrase } => handle_analyse(&config, &phrase.join(" "), as_json),
        Command::Define { phrase, lang } => {
            let lang = lang.unwrap_or_else(|| config.default_language.clone());
            handle_define(&config, &phrase, &lang, as_json)
        }
        Command::Show { entry_id } => handle_show(&config, &entry_id, as_json),
        Command::Prefix { prefix, limit } => handle_prefix(&config, &prefix, limit, as_json),
        Command::Compile { output } => handle_compile(&config, output, as_json),
    }
}

fn open_lexicon(config: &BotConfig) -> Result<Lexicon, Box<dyn Error>> {
    Lexicon::open(&config.jmdict_file).map_err(|err| {
        format!(
            "failed to load dictionary {}: {err}",
            config.jmdict_file.display()
        )
        .into()
    })
}

#[cfg(feature = "web")]
fn handle_serve(config: BotConfig) -> Result<(), Box<dyn Error>> {
    use jmdict_bot::{Bot, BotSettings, Store, web};

    let lexicon = Arc::new(open_lexicon(&config)?);
    let store = match &config.store_path {
        Some(path) => Store::persistent(path)?,
        None => {
            info!("no store_path configured, channel state is kept in memory");
            Store::ephemeral()
        }
    };
    let bot = Arc::new(Bot::new(lexicon, store, BotSettings::from(&config)));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(web::serve(web::WebConfig::from(&config), bot))?;
    Ok(())
}

fn handle_analyse(config: &BotConfig, phrase: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let lexicon = Arc::new(open_lexicon(config)?);
    let matches = Analyzer::new(lexicon).analyse(phrase);

    if as_json {
        let payload = json!({ "phrase": phrase, "matches": matches });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if matches.is_empty() {
        println!("No dictionary words found in \"{phrase}\".");
    } else {
        let width = matches.len().to_string().len().max("#".len());
        println!("{:>width$}  {}", "#", "PHRASE", width = width);
        println!("{:->width$}  {}", "", "------", width = width);
        for (i, gram) in matches.iter().enumerate() {
            println!("{:>width$}  {}", i + 1, gram, width = width);
        }
    }
    Ok(())
}

fn handle_define(
    config: &BotConfig,
    phrase: &str,
    lang: &str,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let lexicon = open_lexicon(config)?;
    let entries = lexicon.lookup(phrase);
    if entries.is_empty() {
        return Err(format!("No entry found for phrase {phrase:?}").into());
    }

    if as_json {
        let payload: Vec<_> = entries.iter().map(|entry| entry_to_json(entry, lang)).collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for entry in entries {
            println!("[{}]", entry.entry_id);
            println!("{}", format::definition(entry, lang));
        }
    }
    Ok(())
}

fn handle_show(config: &BotConfig, entry_id: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let lexicon = open_lexicon(config)?;
    let entries = lexicon.by_id(entry_id);
    if entries.is_empty() {
        return Err(format!("No entry found for id {entry_id}").into());
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in entries {
            print_entry(entry);
        }
    }
    Ok(())
}

fn handle_prefix(
    config: &BotConfig,
    prefix: &str,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let limit = cmp::max(1, limit);
    let lexicon = open_lexicon(config)?;
    let matches = lexicon.prefix(prefix, limit);

    if as_json {
        let payload = json!({
            "prefix": prefix,
            "limit": limit,
            "results": matches.iter().map(|phrase| {
                json!({ "phrase": phrase, "entries": lexicon.lookup(phrase).len() })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if matches.is_empty() {
        println!("No phrases matched prefix \"{prefix}\".");
    } else {
        let width = matches
            .iter()
            .map(|phrase| phrase.chars().count())
            .max()
            .unwrap_or(0)
            .max("PHRASE".len());
        println!("Matches for prefix \"{prefix}\":");
        println!("{:<width$}  {}", "PHRASE", "ENTRIES", width = width);
        println!("{:-<width$}  {}", "", "-------", width = width);
        for phrase in &matches {
            println!(
                "{:<width$}  {}",
                phrase,
                lexicon.lookup(phrase).len(),
                width = width
            );
        }
    }
    Ok(())
}

fn handle_compile(config: &BotConfig, output: PathBuf, as_json: bool) -> Result<(), Box<dyn Error>> {
    let lexicon = open_lexicon(config)?;
    let bytes = snapshot::write(lexicon.entries(), &output)?;
    info!(output = %output.display(), bytes, "wrote snapshot");

    if as_json {
        let payload = json!({
            "source": config.jmdict_file,
            "output": output,
            "entries": lexicon.len(),
            "bytes": bytes,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "Wrote {} entries ({bytes} bytes) to {}",
            lexicon.len(),
            output.display()
        );
    }
    Ok(())
}

fn entry_to_json(entry: &Entry, lang: &str) -> serde_json::Value {
    json!({
        "entry_id": entry.entry_id,
        "headword": entry.headword(),
        "phrases": entry.phrases().collect::<Vec<_>>(),
        "language": lang,
        "glosses": entry
            .glosses_in(normalize_language(lang))
            .map(|gloss| gloss.definition.as_str())
            .collect::<Vec<_>>(),
        "definition": format::definition(entry, lang),
    })
}

fn print_entry(entry: &Entry) {
    println!("Entry {}", entry.entry_id);
    if !entry.kanji.is_empty() {
        let kanji: Vec<_> = entry.kanji.iter().map(|k| k.phrase.as_str()).collect();
        println!("  Kanji:    {}", kanji.join(", "));
    }
    let readings: Vec<_> = entry.readings.iter().map(|r| r.phrase.as_str()).collect();
    println!("  Readings: {}", readings.join(", "));
    for (i, sense) in entry.senses.iter().enumerate() {
        let glosses: Vec<String> = sense
            .glossary
            .iter()
            .map(|gloss| format!("{} [{}]", gloss.definition, gloss.language))
            .collect();
        println!("  {}. {}", i + 1, glosses.join("; "));
        if !sense.parts_of_speech.is_empty() {
            println!("     pos: {}", sense.parts_of_speech.join(", "));
        }
        for note in &sense.notes {
            println!("     note: {note}");
        }
    }
}
