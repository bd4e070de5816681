use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use knn::{
    evaluation::{evaluate, write_report},
    image_adapter::{classify_image, decode_image, encode_image, labeled_samples, CLASS_ATTRIBUTE},
    knn::DEFAULT_K,
    sample_set::{equalize, DEFAULT_EPSILON},
    EqualizationPolicy, KNearestNeighbors, TieBreak,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Equalization {
    /// Train on every labeled pixel
    None,
    /// Keep only classes rarer than the rarest class
    StrictMinority,
    /// Keep as many pixels of every class as the rarest class has
    Downsample,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TieBreakArg {
    FirstSeen,
    LastSeen,
    SmallestValue,
}

impl From<TieBreakArg> for TieBreak {
    fn from(value: TieBreakArg) -> Self {
        match value {
            TieBreakArg::FirstSeen => TieBreak::FirstSeen,
            TieBreakArg::LastSeen => TieBreak::LastSeen,
            TieBreakArg::SmallestValue => TieBreak::SmallestValue,
        }
    }
}

/// Classify the pixels of an image by color with k-nearest neighbors
#[derive(Parser, Debug)]
#[command(name = "knn", version, about, long_about = None)]
struct Cli {
    /// Training image
    #[arg(long)]
    train: PathBuf,

    /// Ground-truth mask of the training image, class in the red channel
    #[arg(long)]
    labels: PathBuf,

    /// Image to classify
    #[arg(long)]
    input: PathBuf,

    /// Where to write the predicted mask
    #[arg(long)]
    output: PathBuf,

    /// Number of neighbors consulted per pixel
    #[arg(short, default_value_t = DEFAULT_K)]
    k: usize,

    /// Tolerance under which two class values are the same class
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    epsilon: f64,

    #[arg(long, value_enum, default_value_t = Equalization::Downsample)]
    equalization: Equalization,

    #[arg(long, value_enum, default_value_t = TieBreakArg::FirstSeen)]
    tie_break: TieBreakArg,

    /// Ground-truth mask of the input image, enables accuracy reporting
    #[arg(long)]
    truth: Option<PathBuf>,

    /// CSV file receiving per-class accuracy, requires --truth
    #[arg(long, requires = "truth")]
    report: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let start = Instant::now();

    let train = decode_image(&cli.train)
        .with_context(|| format!("reading training image {}", cli.train.display()))?;
    let labels = decode_image(&cli.labels)
        .with_context(|| format!("reading labels {}", cli.labels.display()))?;

    let samples = labeled_samples(&train, &labels).context("building training samples")?;
    info!(samples = samples.len(), "training base generated");

    let policy = match cli.equalization {
        Equalization::None => None,
        Equalization::StrictMinority => Some(EqualizationPolicy::StrictMinority),
        Equalization::Downsample => Some(EqualizationPolicy::Downsample),
    };
    let samples = match policy {
        Some(policy) => equalize(&samples, CLASS_ATTRIBUTE, cli.epsilon, policy)?,
        None => samples,
    };

    if samples.is_empty() {
        bail!(
            "no training samples left after {:?} equalization",
            cli.equalization
        );
    }
    info!(samples = samples.len(), "training samples equalized");

    let classifier = KNearestNeighbors::new(cli.k)
        .with_epsilon(cli.epsilon)
        .with_tie_break(cli.tie_break.into());

    let input = decode_image(&cli.input)
        .with_context(|| format!("reading input image {}", cli.input.display()))?;
    let output = classify_image(&input, &samples, &classifier).context("classifying image")?;

    encode_image(&output, &cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!(
        output = %cli.output.display(),
        elapsed = ?start.elapsed(),
        "mask generated"
    );

    if let Some(truth_path) = &cli.truth {
        let truth = decode_image(truth_path)
            .with_context(|| format!("reading truth {}", truth_path.display()))?;
        let evaluation = evaluate(&output, &truth)?;

        println!("knn accuracy: {:.3}%", evaluation.accuracy());
        for score in &evaluation.classes {
            println!("class {} accuracy: {:.3}%", score.class, score.accuracy());
        }

        if let Some(report_path) = &cli.report {
            write_report(&evaluation, report_path)
                .with_context(|| format!("writing report {}", report_path.display()))?;
        }
    }

    Ok(())
}
