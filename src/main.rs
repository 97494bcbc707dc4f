use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use titlecluster::cluster::vectorize_corpus;
use titlecluster::config::Config;
use titlecluster::embedding::{EmbeddingLookup, WordVectors};
use titlecluster::text::{
    Corpus, JiebaTokenizer, PretrainedTokenizer, Segmenter, Tokenizer, UnicodeWordTokenizer,
};

/// Titlecluster: group short titles by meaning.
///
/// Averages pre-trained word vectors into one vector per title, partitions
/// them with seeded k-means, and prints the most central titles of each
/// cluster after discarding the loosest clusters.
#[derive(Parser)]
#[command(name = "titlecluster", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster the titles in a file and print the ranked report
    Cluster {
        /// Text file with one title per line (UTF-8)
        input: PathBuf,

        #[command(flatten)]
        model: ModelArgs,

        /// Number of clusters (default: floor(sqrt(distinct titles)))
        #[arg(long, short = 'k')]
        clusters: Option<usize>,

        /// Seed for centroid initialization
        #[arg(long)]
        seed: Option<u64>,

        /// Distance used for ranking: euclidean or cosine
        #[arg(long)]
        metric: Option<String>,

        /// Iteration cap for k-means
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Independent seeded runs; the tightest partition is kept
        #[arg(long)]
        restarts: Option<usize>,

        /// Titles shown per cluster
        #[arg(long)]
        preview: Option<usize>,

        /// Drop floor(k / N) most dispersed clusters (0 keeps all)
        #[arg(long)]
        drop_divisor: Option<usize>,

        /// How unknown words enter the average: zero-counted or skip
        #[arg(long)]
        oov: Option<String>,

        /// Show titles with spaces between tokens
        #[arg(long)]
        keep_separators: bool,

        /// Print the report as JSON instead of colored text
        #[arg(long)]
        json: bool,
    },

    /// Report how much of a title file the embedding model covers
    Coverage {
        /// Text file with one title per line (UTF-8)
        input: PathBuf,

        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// word2vec model file (text or binary)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Model format: auto, text or binary
    #[arg(long)]
    format: Option<String>,

    /// HuggingFace tokenizer.json to use instead of word segmentation.
    /// Takes precedence over --segmenter
    #[arg(long)]
    tokenizer: Option<PathBuf>,

    /// Word segmentation: unicode (one token per CJK ideograph) or jieba
    /// (Chinese words). Pick the one the word2vec model was trained with
    #[arg(long)]
    segmenter: Option<String>,

    /// Lowercase tokens before lookup
    #[arg(long)]
    lowercase: bool,
}

impl ModelArgs {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(model) = &self.model {
            config.model_path = Some(model.clone());
        }
        if let Some(format) = &self.format {
            config.model_format = format.parse()?;
        }
        if let Some(tokenizer) = &self.tokenizer {
            config.tokenizer_path = Some(tokenizer.clone());
        }
        if let Some(segmenter) = &self.segmenter {
            config.segmenter = segmenter.parse()?;
        }
        if self.lowercase {
            config.lowercase = true;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("titlecluster=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cluster {
            input,
            model,
            clusters,
            seed,
            metric,
            max_iterations,
            restarts,
            preview,
            drop_divisor,
            oov,
            keep_separators,
            json,
        } => {
            let mut config = Config::load()?;
            model.apply(&mut config)?;
            if clusters.is_some() {
                config.clusters = clusters;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(metric) = metric {
                config.metric = metric.parse()?;
            }
            if let Some(max_iterations) = max_iterations {
                config.max_iterations = max_iterations;
            }
            if let Some(restarts) = restarts {
                config.restarts = restarts;
            }
            if let Some(preview) = preview {
                config.preview_limit = preview;
            }
            if let Some(drop_divisor) = drop_divisor {
                config.drop_divisor = drop_divisor;
            }
            if let Some(oov) = oov {
                config.oov_policy = oov.parse()?;
            }

            let vectors = load_model(&config)?;
            let tokenizer = create_tokenizer(&config)?;
            let corpus = Corpus::load(&input, tokenizer.as_ref())?;

            if corpus.is_empty() {
                anyhow::bail!(
                    "No non-empty titles found in {} ({} empty lines skipped)",
                    input.display(),
                    corpus.empty_removed
                );
            }

            let options = config.pipeline_options(keep_separators);
            let run = titlecluster::pipeline::run(&corpus, &vectors, &options)?;

            if json {
                println!("{}", titlecluster::output::report_json(&run.report)?);
            } else {
                titlecluster::output::terminal::display_report(&run.report);
            }
        }

        Commands::Coverage { input, model } => {
            let mut config = Config::load()?;
            model.apply(&mut config)?;

            let vectors = load_model(&config)?;
            let tokenizer = create_tokenizer(&config)?;
            let corpus = Corpus::load(&input, tokenizer.as_ref())?;

            let (_, stats) = vectorize_corpus(&corpus.sentences, &vectors, config.oov_policy)?;
            titlecluster::output::terminal::display_coverage(corpus.len(), &stats);
        }
    }

    Ok(())
}

/// Load the configured embedding model, with a spinner for large files.
fn load_model(config: &Config) -> Result<WordVectors> {
    let path = config.require_model()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("  {spinner} {msg}")?);
    spinner.set_message(format!("Loading word vectors from {}", path.display()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = WordVectors::load(path, config.model_format);
    spinner.finish_and_clear();
    let vectors = result?;

    if vectors.is_empty() {
        anyhow::bail!("Embedding model {} contains no words", path.display());
    }

    eprintln!(
        "{}",
        format!(
            "Loaded {} word vectors ({} dimensions)",
            vectors.len(),
            vectors.dimensionality()
        )
        .dimmed()
    );

    Ok(vectors)
}

/// Pick the tokenizer: a pretrained tokenizer.json if configured, the chosen segmenter otherwise.
fn create_tokenizer(config: &Config) -> Result<Box<dyn Tokenizer>> {
    if let Some(path) = &config.tokenizer_path {
        info!("Using pretrained tokenizer");
        return Ok(Box::new(PretrainedTokenizer::load(path)?));
    }
    info!(segmenter = %config.segmenter, "Using word segmenter");
    match config.segmenter {
        Segmenter::Unicode => Ok(Box::new(UnicodeWordTokenizer::new(config.lowercase))),
        Segmenter::Jieba => Ok(Box::new(JiebaTokenizer::new(config.lowercase))),
    }
}
