mod display;
mod interactive;

use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use lawrecon_core::{FieldMapper, LegislationTypeProfile, build_rows};
use lawrecon_review::ReviewSession;
use lawrecon_store::{Config, ExportFormat, FileSource, RecordSource, VerdictStore, export_verdicts};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Reconcile legislation records held by two sources, one pair at a time.
#[derive(Parser, Debug)]
#[command(name = "lawrecon", version)]
struct Cli {
    /// TOML config file layered over the built-in defaults
    #[arg(long, global = true, env = "LAWRECON_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the persisted review state
    #[arg(long, global = true, env = "LAWRECON_STATE_DIR", value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Base directory for relative source paths
    #[arg(long, global = true, env = "LAWRECON_DATA_ROOT", value_name = "DIR")]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
struct TypeArg {
    /// Legislation type key or alias (defaults to the configured type)
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    kind: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the known legislation types and their source files
    Types,
    /// Review record pairs interactively
    Review {
        #[command(flatten)]
        ty: TypeArg,
    },
    /// Print the comparison of one pair without recording anything
    Show {
        #[command(flatten)]
        ty: TypeArg,
        /// 1-based pair number (defaults to the current pair)
        #[arg(long)]
        index: Option<NonZeroUsize>,
    },
    /// Show review progress
    Status {
        #[command(flatten)]
        ty: TypeArg,
    },
    /// Inspect, export or clear recorded verdicts
    Verdicts {
        #[command(subcommand)]
        action: VerdictsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum VerdictsCommand {
    /// Print the verdict log
    List {
        #[command(flatten)]
        ty: TypeArg,
    },
    /// Write the verdict log to a CSV or Parquet file
    Export {
        #[command(flatten)]
        ty: TypeArg,
        #[arg(long, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Delete every verdict and reset progress
    Clear {
        #[command(flatten)]
        ty: TypeArg,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    info!("lawrecon v{}", env!("CARGO_PKG_VERSION"));
    let app = App::new(&cli)?;

    match cli.command {
        Command::Types => app.types(),
        Command::Review { ty } => app.review(&ty),
        Command::Show { ty, index } => app.show(&ty, index),
        Command::Status { ty } => app.status(&ty),
        Command::Verdicts { action } => match action {
            VerdictsCommand::List { ty } => app.list_verdicts(&ty),
            VerdictsCommand::Export { ty, format, out } => app.export(&ty, format, out),
            VerdictsCommand::Clear { ty, yes } => app.clear(&ty, yes),
        },
    }
}

struct App {
    config: Config,
    mapper: FieldMapper,
}

impl App {
    fn new(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(dir) = &cli.state_dir {
            config.state_dir = dir.clone();
        }
        if let Some(root) = &cli.data_root {
            config.data_root = root.clone();
        }
        let mapper = config
            .field_mapper()
            .context("building legislation type profiles")?;
        Ok(Self { config, mapper })
    }

    /// Profile for `--type`, or the configured type when omitted. Unknown
    /// types fall back to the default profile.
    fn profile(&self, ty: &TypeArg) -> &LegislationTypeProfile {
        let kind = ty.kind.as_deref().unwrap_or(&self.config.default_type);
        let profile = self.mapper.resolve_or_default(kind);
        if self.mapper.resolve(kind).is_err() {
            eprintln!(
                "unknown legislation type '{kind}', using '{}'",
                profile.key
            );
        }
        profile
    }

    fn store(&self, profile: &LegislationTypeProfile) -> VerdictStore {
        VerdictStore::open(self.config.state_dir_for(&profile.key))
    }

    fn session(&self, ty: &TypeArg) -> anyhow::Result<ReviewSession> {
        let profile = self.profile(ty);
        let pair = FileSource::new(self.config.clone())
            .load(profile)
            .with_context(|| format!("loading '{}' sources", profile.key))?;
        Ok(ReviewSession::new(
            pair.into_queue(),
            profile.clone(),
            self.store(profile),
        ))
    }

    // ── Commands ──

    fn types(&self) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for p in self.mapper.profiles() {
            let marker = if p.key == self.config.default_type { "*" } else { " " };
            writeln!(out, "{marker} {:<12} aliases: {}", p.key, p.aliases.join(", "))?;
            match self.config.source_paths(&p.key) {
                Some(paths) => {
                    writeln!(out, "    A: {}", paths.a.display())?;
                    writeln!(out, "    B: {}", paths.b.display())?;
                }
                None => writeln!(out, "    (no source files configured)")?,
            }
        }
        Ok(())
    }

    fn review(&self, ty: &TypeArg) -> anyhow::Result<()> {
        let mut session = self.session(ty)?;
        let mut input = io::stdin().lock();
        let mut out = io::stdout().lock();
        interactive::run(&mut session, &mut input, &mut out)?;
        info!(
            kind = %session.profile().key,
            verdicts = session.snapshot().verdicts.len(),
            state = %session.state(),
            "review ended"
        );
        Ok(())
    }

    fn show(&self, ty: &TypeArg, index: Option<NonZeroUsize>) -> anyhow::Result<()> {
        let session = self.session(ty)?;
        let queue = session.queue();
        let i = match index {
            Some(n) => n.get() - 1,
            None => queue.cursor(),
        };
        let pair = queue.get(i).context("no such pair")?;
        let rows = build_rows(pair.record_a, pair.record_b, session.profile());

        let mut out = io::stdout().lock();
        writeln!(out, "Record {} of {}", pair.index + 1, queue.paired_count())?;
        display::write_diff(&mut out, &rows)?;
        Ok(())
    }

    fn status(&self, ty: &TypeArg) -> anyhow::Result<()> {
        let session = self.session(ty)?;
        let mut out = io::stdout().lock();
        writeln!(out, "type:   {}", session.profile().key)?;
        writeln!(out, "state:  {}", session.state())?;
        writeln!(out, "stored: {}", session.store().dir().display())?;
        display::write_progress(&mut out, session.queue())?;
        display::write_tally(&mut out, session.snapshot())?;
        Ok(())
    }

    fn list_verdicts(&self, ty: &TypeArg) -> anyhow::Result<()> {
        let store = self.store(self.profile(ty));
        let state = store.snapshot();
        let mut out = io::stdout().lock();
        if state.verdicts.is_empty() {
            writeln!(out, "no verdicts recorded")?;
            return Ok(());
        }
        writeln!(out, "{}", display::format_verdicts(state)?)?;
        display::write_tally(&mut out, state)?;
        Ok(())
    }

    fn export(&self, ty: &TypeArg, format: ExportFormat, out_dir: PathBuf) -> anyhow::Result<()> {
        let store = self.store(self.profile(ty));
        let path = export_verdicts(store.snapshot(), &out_dir, format, chrono::Local::now())
            .context("exporting verdicts")?;
        println!("{}", path.display());
        Ok(())
    }

    fn clear(&self, ty: &TypeArg, yes: bool) -> anyhow::Result<()> {
        let profile = self.profile(ty);
        if !yes {
            bail!("refusing to clear '{}' verdicts without --yes", profile.key);
        }
        let mut store = self.store(profile);
        let count = store.snapshot().verdicts.len();
        store.clear_all().context("clearing verdicts")?;
        println!("cleared {count} verdicts for '{}'", profile.key);
        Ok(())
    }
}
