use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command};
use diac::cache::PagedCache;
use diac::config::Config;
use diac::dictionary::Dictionary;
use diac::engine::Engine;
use diac::offset_index::OffsetIndex;
use diac::pipeline;

fn cli() -> ArgMatches {
    Command::new("diac")
        .about("Restores diacritics stripped from text, using a dictionary and a statistical trigram model")
        .version("0.1.0")
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Suppress the foreign-word advisory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("conflict")
                .short('c')
                .long("conflict")
                .help("Enable interactive disambiguation when multiple candidates are plausible")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("memory")
                .short('m')
                .long("memory")
                .help("Route model reads through the paged cache instead of direct file I/O")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("dictionary").long("dictionary").help("Path to the dictionary file"))
        .arg(Arg::new("offset-index").long("offset-index").help("Path to the offset index file"))
        .arg(Arg::new("model").long("model").help("Path to the trigram model file"))
        .arg(
            Arg::new("page-size")
                .long("page-size")
                .help("Cache page size in bytes; must be a power of two")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("warm-cache")
                .long("warm-cache")
                .help("Eagerly load every page of the model into the cache before processing (only meaningful with -m)")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("config").long("config").help("Path to a diac.config.json file"))
        .arg(Arg::new("input").help("Input file; absent means read standard input").index(1))
        .get_matches()
}

fn resolve_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(path) = matches.get_one::<String>("dictionary") {
        config.dictionary_path = PathBuf::from(path);
    }
    if let Some(path) = matches.get_one::<String>("offset-index") {
        config.offset_index_path = PathBuf::from(path);
    }
    if let Some(path) = matches.get_one::<String>("model") {
        config.model_path = PathBuf::from(path);
    }
    if let Some(&page_size) = matches.get_one::<usize>("page-size") {
        config.page_size = page_size;
    }
    if matches.get_flag("silent") {
        config.silent = true;
    }
    if matches.get_flag("conflict") {
        config.conflict = true;
    }
    if matches.get_flag("memory") {
        config.memory = true;
    }

    Ok(config)
}

fn run() -> anyhow::Result<()> {
    let matches = cli();
    let config = resolve_config(&matches)?;

    let dictionary = Dictionary::load(&config.dictionary_path)?;
    let offsets = OffsetIndex::load(&config.offset_index_path)?;

    let cache = if config.memory {
        let cache = Arc::new(PagedCache::open(&config.model_path, config.page_size)?);
        if matches.get_flag("warm-cache") {
            cache.load_all_pages();
        }
        Some(cache)
    } else {
        // `PagedCache::open` above already stats the model file for the `-m` path; the stream
        // path only opens it lazily per token, which would otherwise let a missing model file
        // silently degrade every token to its verbatim fallback instead of failing fast.
        std::fs::File::open(&config.model_path).map_err(|source| diac::DiacError::Model {
            path: config.model_path.clone(),
            source,
        })?;
        None
    };

    let engine = Engine::new(dictionary, offsets, config.model_path.clone(), cache, config.conflict);

    let mut input = String::new();
    match matches.get_one::<String>("input") {
        Some(path) => {
            std::fs::File::open(path)
                .and_then(|mut f| f.read_to_string(&mut input))
                .map_err(diac::DiacError::Input)?;
        }
        None => {
            std::io::stdin().read_to_string(&mut input).map_err(diac::DiacError::Input)?;
        }
    }

    let result = pipeline::run(&engine, &input);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(result.text.as_bytes()).map_err(diac::DiacError::Output)?;

    if !config.silent && result.exceeds_foreign_word_advisory() {
        eprintln!(
            "warning: {} of {} tokens had no dictionary or model coverage and were left unchanged",
            result.foreign_words.len(),
            result.token_count
        );
    }

    Ok(())
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("diac: {err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
