use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use incidence_race::{EncoderKind, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "incidence-race", version)]
struct Cli {
    /// Run configuration JSON. Missing fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only log warnings and errors (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every frame and assemble the animated GIF.
    Render(RenderArgs),
    /// Render a single date's frame as a PNG.
    Frame(FrameArgs),
    /// Write the cleaned table (with incidence and colors) as CSV.
    Table(TableArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Input CSV.
    #[arg(long = "in")]
    input: Option<PathBuf>,

    /// Directory holding one `<CODE>.png` icon per region.
    #[arg(long)]
    icons: Option<PathBuf>,

    /// Index of the first date to render.
    #[arg(long)]
    start_day: Option<usize>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory for the per-date PNG frames.
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Output GIF path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Animation encoder.
    #[arg(long, value_enum)]
    encoder: Option<EncoderChoice>,

    /// Fail the run when the encoder fails.
    #[arg(long)]
    strict_encode: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Date to render (`yyyy-mm-dd` or `dd/mm/yyyy`).
    #[arg(long)]
    date: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct TableArgs {
    /// Input CSV.
    #[arg(long = "in")]
    input: Option<PathBuf>,

    /// Output CSV path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncoderChoice {
    Magick,
    Builtin,
    None,
}

impl From<EncoderChoice> for EncoderKind {
    fn from(c: EncoderChoice) -> Self {
        match c {
            EncoderChoice::Magick => EncoderKind::Magick,
            EncoderChoice::Builtin => EncoderKind::Builtin,
            EncoderChoice::None => EncoderKind::None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let cfg = match &cli.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };

    match cli.cmd {
        Command::Render(args) => cmd_render(cfg, args),
        Command::Frame(args) => cmd_frame(cfg, args),
        Command::Table(args) => cmd_table(cfg, args),
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_input(cfg: &mut RunConfig, args: InputArgs) {
    if let Some(input) = args.input {
        cfg.input = input;
    }
    if let Some(icons) = args.icons {
        cfg.icon_dir = icons;
    }
    if let Some(start_day) = args.start_day {
        cfg.start_day = start_day;
    }
}

fn cmd_render(mut cfg: RunConfig, args: RenderArgs) -> anyhow::Result<()> {
    apply_input(&mut cfg, args.input);
    if let Some(dir) = args.frames_dir {
        cfg.frames_dir = dir;
    }
    if let Some(out) = args.out {
        cfg.animation_out = out;
    }
    if let Some(encoder) = args.encoder {
        cfg.encoder = encoder.into();
    }
    cfg.strict_encode |= args.strict_encode;

    let summary = incidence_race::run(&cfg)?;

    eprintln!(
        "wrote {} of {} frames to {}",
        summary.frames_written.len(),
        summary.dates_total,
        cfg.frames_dir.display()
    );
    if let Some(path) = summary.animation {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_frame(mut cfg: RunConfig, args: FrameArgs) -> anyhow::Result<()> {
    apply_input(&mut cfg, args.input);
    let date = incidence_race::parse_day_first(&args.date)
        .with_context(|| format!("parse --date '{}'", args.date))?;

    incidence_race::render_single_frame(&cfg, date, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_table(mut cfg: RunConfig, args: TableArgs) -> anyhow::Result<()> {
    if let Some(input) = args.input {
        cfg.input = input;
    }
    let (dataset, _) = incidence_race::load_dataset(&cfg)?;
    incidence_race::write_table(&cfg, &dataset, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
