use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "kinegraph", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a single frame and emit its state as JSON.
    Frame(FrameArgs),
    /// Evaluate a frame range and write one JSON file per frame.
    Sequence(SequenceArgs),
    /// Parse and validate a timeline document.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output JSON path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pretty-print the frame state.
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// First frame (inclusive).
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// End frame (exclusive; the document duration when omitted).
    #[arg(long)]
    end: Option<u64>,

    /// Output directory for per-frame JSON files.
    #[arg(long)]
    out_dir: PathBuf,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Evaluation chunk size (parallel mode only).
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Sequence(args) => cmd_sequence(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn read_doc_json(path: &Path) -> anyhow::Result<kinegraph::TimelineDocument> {
    let f = File::open(path).with_context(|| format!("open timeline '{}'", path.display()))?;
    let r = BufReader::new(f);
    let doc: kinegraph::TimelineDocument =
        serde_json::from_reader(r).with_context(|| "parse timeline JSON")?;
    Ok(doc)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let doc = read_doc_json(&args.in_path)?;
    let state = kinegraph::Evaluator::eval_frame(&doc, kinegraph::FrameIndex(args.frame))?;
    let json = if args.pretty {
        state.to_json_pretty()?
    } else {
        state.to_json()?
    };

    match args.out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(&out, &json)
                .with_context(|| format!("write frame state '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_sequence(args: SequenceArgs) -> anyhow::Result<()> {
    let doc = read_doc_json(&args.in_path)?;
    let end = args.end.unwrap_or_else(|| doc.duration_frames());
    let range =
        kinegraph::FrameRange::new(kinegraph::FrameIndex(args.start), kinegraph::FrameIndex(end))?;

    let threading = kinegraph::EvalThreading {
        parallel: args.parallel,
        chunk_size: args.chunk_size,
        threads: args.threads,
    };
    let states = kinegraph::eval_range(&doc, range, &threading)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    for state in &states {
        let path = args.out_dir.join(format!("frame_{:06}.json", state.frame.0));
        std::fs::write(&path, state.to_json()?)
            .with_context(|| format!("write frame state '{}'", path.display()))?;
    }

    eprintln!("wrote {} frames to {}", states.len(), args.out_dir.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let doc = read_doc_json(&args.in_path)?;
    doc.validate()?;
    eprintln!(
        "{}: ok ({} frames at {} fps)",
        args.in_path.display(),
        doc.duration_frames(),
        format_fps(doc.fps)
    );
    Ok(())
}

fn format_fps(fps: kinegraph::Fps) -> String {
    if fps.den == 1 {
        fps.num.to_string()
    } else {
        format!("{}/{}", fps.num, fps.den)
    }
}
