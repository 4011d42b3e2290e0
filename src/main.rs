use chrono::Local;
use clap::Parser;
use patlib::error::{PatternError, Result};
use patlib::matcher::{MatchConfig, PatternMatcher};
use patlib::pattern_set::{LoadOptions, PatternSet};
use patlib::pretty_print::dump;
use patlib::theory::{DocTheory, SentenceTheory};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Load a pattern file and optionally match it against a treebank
#[derive(Parser)]
struct Cli {
    /// Path to a pattern set file
    file: PathBuf,
    /// Directory searched for @INCLUDE targets
    #[arg(long = "include-dir")]
    include_dirs: Vec<PathBuf>,
    /// Macro symbol to @SET before reading
    #[arg(long = "set")]
    set_symbols: Vec<String>,
    /// Print every top level pattern after shortcut resolution
    #[arg(long)]
    dump: bool,
    /// Treebank file with one parse tree per line, matched as a single document
    #[arg(long)]
    doc: Option<PathBuf>,
}

fn read_treebank(path: &PathBuf) -> Result<DocTheory> {
    let text = std::fs::read_to_string(path).map_err(|source| PatternError::Io {
        path: path.clone(),
        source,
    })?;
    let mut doc = DocTheory::new(&path.to_string_lossy());
    for (number, line) in text.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        doc.add_sentence(SentenceTheory::from_treebank(number, line)?);
    }
    Ok(doc)
}

fn run(args: &Cli) -> Result<()> {
    let options = LoadOptions {
        include_dirs: args.include_dirs.clone(),
        set_symbols: args.set_symbols.clone(),
        ..LoadOptions::default()
    };
    let set = PatternSet::from_file(&args.file, &options)?;
    if args.dump {
        for &id in set.top_level() {
            println!("{}", dump(set.bank(), id));
        }
    }
    if let Some(path) = &args.doc {
        let doc = read_treebank(path)?;
        log::info!("Matching {} sentences of {:?}", doc.sentences.len(), path);
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default())?;
        for sentence in 0..doc.sentences.len() {
            let snippets = matcher.sentence_snippets(sentence)?;
            println!("{sentence}\t{}", snippets.len());
        }
        println!("doc\t{}", matcher.document_snippets()?.len());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();
    env_logger::builder()
        .format(|buf, record| {
            let level_style = buf.default_level_style(record.level()).bold();
            writeln!(
                buf,
                "{}|{level_style}{:7}{level_style:#}|{:10}| {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
    log::info!("Load pattern set: {:?}", args.file);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
