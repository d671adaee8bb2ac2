use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use alpha_forest::ForestConfig;
use alpha_protocol::SentenceId;
use alpha_reader::{read_conll, transform, AlphaForest, DependencyEncoding, FeatureSchema};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Trains and runs the alpha-forest hyperedge reader")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Trains a forest on a CSV of labelled cases and writes the model.
    Learn {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// JSON file with forest hyperparameters.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Reads CoNLL-U sentences and prints one hyperedge per sentence.
    Parse {
        #[arg(short, long, value_name = "FILE")]
        model: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Write here instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Suffix atoms with their part-of-speech tag.
        #[arg(long)]
        namespaces: bool,

        /// Emit JSON lines instead of bare hyperedges.
        #[arg(long)]
        json: bool,
    },
    /// Prints the CSV header expected by `learn`.
    Fields {
        #[arg(long)]
        one_hot_deps: bool,
    },
}

#[derive(Serialize)]
struct ParsedLine<'a> {
    id: String,
    text: &'a str,
    hyperedge: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Learn { input, output, config } => learn(&input, &output, config.as_deref()),
        Command::Parse { model, input, output, namespaces, json } => {
            parse(&model, &input, output.as_deref(), namespaces, json)
        }
        Command::Fields { one_hot_deps } => {
            let encoding = if one_hot_deps {
                DependencyEncoding::OneHot
            } else {
                DependencyEncoding::Literal
            };
            println!("{}", FeatureSchema::new(encoding).csv_header());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ForestConfig> {
    let Some(path) = path else {
        return Ok(ForestConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: ForestConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

fn learn(input: &Path, output: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let report = alpha_reader::learn(input, output, &config)
        .with_context(|| format!("training on {}", input.display()))?;
    info!(
        rows = report.rows,
        trees = report.trees,
        score = report.score,
        "model written to {}",
        output.display()
    );
    Ok(())
}

fn parse(
    model: &Path,
    input: &Path,
    output: Option<&Path>,
    namespaces: bool,
    json: bool,
) -> anyhow::Result<()> {
    let alpha = AlphaForest::load(model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let sentences = read_conll(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            fs::File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(sink);

    let count = sentences.len();
    for (i, sentence) in sentences.into_iter().enumerate() {
        let parsed = transform(sentence, &alpha)?;
        let hyperedge = parsed.to_hyperedge_str(namespaces)?;
        if json {
            let line = ParsedLine {
                id: sentence_id(i)?.to_string(),
                text: parsed.sentence().text(),
                hyperedge,
            };
            serde_json::to_writer(&mut out, &line)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", hyperedge)?;
        }
    }
    out.flush()?;

    info!(sentences = count, "done");
    Ok(())
}

fn sentence_id(index: usize) -> anyhow::Result<SentenceId> {
    let raw = u32::try_from(index).with_context(|| format!("sentence {} has no id", index))?;
    Ok(SentenceId::new(raw))
}
