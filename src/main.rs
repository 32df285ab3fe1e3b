//! Photo frame CLI - a normalized image gallery rotating across display slots.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use console::style;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use pf::cli::{self, Cli, Commands};
use pf::config::{self, FrameConfig, LoadedConfig};
use pf::display::{DirectoryRenderer, LogRenderer, SlotContent, SlotRenderer};
use pf::error::{FrameError, Result};
use pf::gallery::GalleryModel;
use pf::ingest::{ingest_bytes, ingest_file};
use pf::logging::init_logging;
use pf::normalize::{CANVAS_HEIGHT, CANVAS_WIDTH, ImageNormalizer, ResizeStrategy};
use pf::rotation::{RotationScheduler, SlotAssignment};
use pf::store::{SqliteImageStore, default_db_path};
use pf::sync;

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color || !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
    }
    if cli.no_color || !io::stderr().is_terminal() {
        console::set_colors_enabled_stderr(false);
    }

    init_logging(cli.robot, cli.verbose, cli.quiet);

    if let Err(e) = run(&cli).await {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Add(args)) => cmd_add(cli, args).await,
        Some(Commands::Paste(args)) => cmd_paste(cli, args).await,
        Some(Commands::List(args)) => cmd_list(cli, args).await,
        Some(Commands::Remove(args)) => cmd_remove(cli, args).await,
        Some(Commands::Export(args)) => cmd_export(cli, args).await,
        Some(Commands::Import(args)) => cmd_import(cli, args).await,
        Some(Commands::Show(args)) => cmd_show(cli, args).await,
        Some(Commands::Run(args)) => cmd_run(cli, args).await,
        Some(Commands::Init(args)) => cmd_init(cli, args),
        Some(Commands::Config(args)) => cmd_config(cli, args),
        Some(Commands::Version) => cmd_version(cli),
        Some(Commands::Completions(args)) => cmd_completions(cli, args),
    }
}

// === Quick Start (Robot Mode Optimized) ===

/// Prints quick-start help optimized for both humans and AI agents.
#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn print_quick_start(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        print_robot_quick_start(cli);
    } else {
        print_human_quick_start();
    }
    Ok(())
}

fn print_robot_quick_start(cli: &Cli) {
    let help = RobotQuickStart {
        tool: "pf",
        version: build_info::VERSION,
        description: "Photo frame gallery: normalized WebP store with a rotating slot display",
        gallery: RobotGallery {
            add_images: "pf add <IMAGE>...",
            paste_stdin: "pf paste < image.png",
            list: "pf list --robot",
            remove: "pf remove <ID>",
        },
        backup: RobotBackup {
            export: "pf export --output images.json",
            import: "pf import images.json",
        },
        display: RobotDisplay {
            one_frame: "pf show --robot",
            rotate: "pf run --output-dir <DIR>",
        },
        output_modes: OutputModes {
            human: "--format=text (default)",
            robot: "--robot or --format=json",
            compact: "--format=json-compact",
        },
        storage: "Use --db <FILE> or PF_DB to pick the gallery database",
    };

    output_json(cli, &help);
}

fn print_human_quick_start() {
    println!(
        "{} {} - Photo frame\n",
        style("pf").bold().cyan(),
        build_info::VERSION
    );

    println!("{}", style("QUICK START").bold().underlined());
    println!();
    println!("  {}  Add images", style("pf add beach.jpg cat.png").green());
    println!("  {}  Add from stdin", style("pf paste < shot.png").green());
    println!("  {}  List the gallery", style("pf list -l").green());
    println!("  {}  Remove an image", style("pf remove <ID>").green());
    println!("  {}  Back up", style("pf export").green());
    println!("  {}  Restore", style("pf import images.json").green());
    println!("  {}  Rotate slots", style("pf run -o /tmp/frame").green());
    println!();

    println!("{}", style("ROBOT MODE (for AI agents)").bold().underlined());
    println!();
    println!("  {}  JSON output", style("pf --robot <command>").cyan());
    println!("  {}  Quick-start JSON", style("pf --robot").cyan());
    println!();

    println!("Run {} for full help", style("pf --help").yellow());
}

// === Robot Mode JSON Structures ===

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    gallery: RobotGallery,
    backup: RobotBackup,
    display: RobotDisplay,
    output_modes: OutputModes,
    storage: &'static str,
}

#[derive(Serialize)]
struct RobotGallery {
    add_images: &'static str,
    paste_stdin: &'static str,
    list: &'static str,
    remove: &'static str,
}

#[derive(Serialize)]
struct RobotBackup {
    export: &'static str,
    import: &'static str,
}

#[derive(Serialize)]
struct RobotDisplay {
    one_frame: &'static str,
    rotate: &'static str,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

#[derive(Serialize)]
struct ListedImage {
    id: i64,
    created_at: Option<String>,
    bytes: usize,
}

#[derive(Serialize)]
struct AddFailure {
    path: PathBuf,
    error: String,
}

// === Command Implementations ===

async fn cmd_add(cli: &Cli, args: &cli::AddArgs) -> Result<()> {
    let config = load_config(cli)?;
    let normalizer = Arc::new(normalizer_for(&config, args.resize));
    let mut gallery = open_gallery(cli, &config).await?;

    let mut added = Vec::new();
    let mut failed = Vec::new();
    for path in &args.images {
        match ingest_file(&normalizer, &mut gallery, path).await {
            Ok(record) => {
                if !cli.use_json() && !cli.quiet {
                    println!("{} {}", style(record.id).green(), path.display());
                }
                added.push(record.id);
            }
            Err(e) if args.continue_on_error => {
                warn!(path = %path.display(), error = %e, "Skipping image");
                if !cli.use_json() {
                    eprintln!("{}: {}: {e}", style("Skipped").yellow(), path.display());
                }
                failed.push(AddFailure {
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "added": added,
                "failed": failed,
                "total": gallery.len(),
            }),
        );
    } else if !cli.quiet {
        println!("{} image(s) added, {} in gallery", added.len(), gallery.len());
    }
    Ok(())
}

async fn cmd_paste(cli: &Cli, args: &cli::PasteArgs) -> Result<()> {
    let config = load_config(cli)?;
    let normalizer = Arc::new(normalizer_for(&config, args.resize));

    let mut bytes = Vec::new();
    tokio::io::stdin().read_to_end(&mut bytes).await?;
    if bytes.is_empty() {
        return Err(FrameError::Other("No image data on stdin".to_string()));
    }
    debug!(bytes = bytes.len(), "Read image from stdin");

    let mut gallery = open_gallery(cli, &config).await?;
    let record = ingest_bytes(&normalizer, &mut gallery, bytes).await?;

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({ "id": record.id, "total": gallery.len() }),
        );
    } else if !cli.quiet {
        println!("Added {}", style(record.id).green());
    }
    Ok(())
}

async fn cmd_list(cli: &Cli, args: &cli::ListArgs) -> Result<()> {
    let config = load_config(cli)?;
    let gallery = open_gallery(cli, &config).await?;

    let images: Vec<ListedImage> = gallery
        .order()
        .iter()
        .map(|r| ListedImage {
            id: r.id,
            created_at: r.created_at().map(|t| t.to_rfc3339()),
            bytes: r.encoded_image.len(),
        })
        .collect();

    if cli.use_json() {
        output_json(cli, &images);
    } else if images.is_empty() {
        println!("{}", style("Gallery is empty").yellow());
        println!("Add images with: pf add <IMAGE>");
    } else {
        for image in &images {
            if args.long {
                println!(
                    "{}  {}  {} bytes",
                    style(image.id).green(),
                    image.created_at.as_deref().unwrap_or("-"),
                    image.bytes
                );
            } else {
                println!("{}", image.id);
            }
        }
    }
    Ok(())
}

async fn cmd_remove(cli: &Cli, args: &cli::RemoveArgs) -> Result<()> {
    let config = load_config(cli)?;
    let mut gallery = open_gallery(cli, &config).await?;
    let removed = gallery.remove(args.id).await?;

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({ "id": args.id, "removed": removed, "total": gallery.len() }),
        );
    } else if !cli.quiet {
        if removed {
            println!("Removed {}", args.id);
        } else {
            println!("{} {}", style("No image with id").yellow(), args.id);
        }
    }
    Ok(())
}

async fn cmd_export(cli: &Cli, args: &cli::ExportArgs) -> Result<()> {
    let config = load_config(cli)?;
    let gallery = open_gallery(cli, &config).await?;

    if args.output == Path::new("-") {
        println!("{}", sync::export_all(gallery.order())?);
        return Ok(());
    }

    sync::export_to_file(gallery.order(), &args.output).await?;
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({ "path": args.output, "count": gallery.len() }),
        );
    } else if !cli.quiet {
        println!(
            "Exported {} image(s) to {}",
            gallery.len(),
            args.output.display()
        );
    }
    Ok(())
}

async fn cmd_import(cli: &Cli, args: &cli::ImportArgs) -> Result<()> {
    let config = load_config(cli)?;
    let document = sync::read_document(&args.file).await?;
    let mut gallery = open_gallery(cli, &config).await?;
    let count = sync::import_into(&mut gallery, &document).await?;

    if cli.use_json() {
        output_json(cli, &serde_json::json!({ "imported": count }));
    } else if !cli.quiet {
        println!("Imported {count} image(s)");
    }
    Ok(())
}

async fn cmd_show(cli: &Cli, args: &cli::ShowArgs) -> Result<()> {
    let config = load_config(cli)?;
    let gallery = open_gallery(cli, &config).await?;
    let renderer = renderer_for(&config, args.output_dir.as_ref())?;

    let scheduler = RotationScheduler::new(
        config.slots.clone(),
        config.interval(),
        renderer,
        gallery.subscribe(),
    );
    let frame = tokio::task::block_in_place(|| scheduler.reset());

    if cli.use_json() {
        output_json(cli, &frame);
    } else {
        print_frame(&gallery, &frame);
    }
    Ok(())
}

async fn cmd_run(cli: &Cli, args: &cli::RunArgs) -> Result<()> {
    let mut config = load_config(cli)?;
    if let Some(interval_ms) = args.interval_ms {
        config.interval_ms = interval_ms;
    }
    config.validate()?;

    let mut gallery = open_gallery(cli, &config).await?;
    let renderer = renderer_for(&config, args.output_dir.as_ref())?;
    let scheduler = RotationScheduler::new(
        config.slots.clone(),
        config.interval(),
        renderer,
        gallery.subscribe(),
    );

    tokio::task::block_in_place(|| scheduler.start());
    if !cli.quiet && !cli.use_json() {
        println!(
            "Rotating {} image(s) across {} slot(s) every {} ms (Ctrl+C to stop)...",
            gallery.len(),
            config.slots.len(),
            config.interval_ms
        );
    }

    let deadline = (args.duration_secs > 0).then(|| Duration::from_secs(args.duration_secs));
    let stop_after = async {
        match deadline {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(stop_after);

    let mut reload = config.reload_interval().map(|period| {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker
    });

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl+C");
                }
                info!("Interrupted");
                break;
            }
            () = &mut stop_after => {
                info!("Duration elapsed");
                break;
            }
            _ = next_tick(reload.as_mut()) => {
                match gallery.reload().await {
                    Ok(()) => {
                        // The timer stops itself when the gallery empties.
                        if !scheduler.is_running() && !gallery.is_empty() {
                            tokio::task::block_in_place(|| scheduler.start());
                        }
                    }
                    Err(e) => warn!(error = %e, "Gallery reload failed, keeping last snapshot"),
                }
            }
        }
    }

    scheduler.stop();
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "stopped": true,
                "images": gallery.len(),
                "state": scheduler.state(),
            }),
        );
    } else if !cli.quiet {
        println!("Rotation stopped");
    }
    Ok(())
}

fn cmd_init(cli: &Cli, args: &cli::InitArgs) -> Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };

    if path.exists() && !args.force {
        return Err(FrameError::ConfigInvalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    config::save_config(&FrameConfig::default(), &path)?;

    if cli.use_json() {
        output_json(cli, &serde_json::json!({ "path": path, "created": true }));
    } else if !cli.quiet {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_config(cli: &Cli, args: &cli::ConfigArgs) -> Result<()> {
    let loaded = config::load_or_default(cli.config.as_deref())?;
    let database = database_path(cli, &loaded.config)?;

    if args.path {
        let path = match &loaded.source {
            Some(path) => path.clone(),
            None => config::default_config_path()?,
        };
        if cli.use_json() {
            output_json(cli, &serde_json::json!({ "path": path, "exists": loaded.source.is_some() }));
        } else {
            println!("{}", path.display());
        }
        return Ok(());
    }

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({ "config": loaded, "effective_database": database }),
        );
    } else {
        print_config(&loaded, &database);
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "version": build_info::VERSION,
                "git_sha": build_info::git_sha(),
                "git_dirty": build_info::git_dirty() == "true",
                "build_timestamp": build_info::build_timestamp(),
                "rustc_version": build_info::rustc_semver(),
                "target": build_info::target(),
            }),
        );
    } else {
        println!("pf {}", build_info::VERSION);
        println!(
            "git: {}{}",
            build_info::git_sha(),
            if build_info::git_dirty() == "true" {
                " (dirty)"
            } else {
                ""
            }
        );
        println!("built: {}", build_info::build_timestamp());
        println!("rustc: {}", build_info::rustc_semver());
        println!("target: {}", build_info::target());
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(_cli: &Cli, args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "pf", &mut io::stdout());
    Ok(())
}

// === Utility Functions ===

fn load_config(cli: &Cli) -> Result<FrameConfig> {
    Ok(config::load_or_default(cli.config.as_deref())?.config)
}

/// `--db` wins over the config file, which wins over the platform default.
fn database_path(cli: &Cli, config: &FrameConfig) -> Result<PathBuf> {
    match (&cli.db, &config.database) {
        (Some(path), _) | (None, Some(path)) => Ok(path.clone()),
        (None, None) => default_db_path(),
    }
}

async fn open_gallery(cli: &Cli, config: &FrameConfig) -> Result<GalleryModel<SqliteImageStore>> {
    let path = database_path(cli, config)?;
    debug!(path = %path.display(), "Opening gallery");
    GalleryModel::load(SqliteImageStore::open(path)).await
}

fn normalizer_for(config: &FrameConfig, resize: Option<ResizeStrategy>) -> ImageNormalizer {
    let normalizer = config.normalizer();
    match resize {
        Some(strategy) => normalizer.with_strategy(strategy),
        None => normalizer,
    }
}

/// Slot files in a directory when one is configured, log lines otherwise.
fn renderer_for(
    config: &FrameConfig,
    output_dir: Option<&PathBuf>,
) -> Result<Box<dyn SlotRenderer>> {
    match output_dir.or(config.output_dir.as_ref()) {
        Some(dir) => Ok(Box::new(DirectoryRenderer::new(
            dir.clone(),
            config.slots.iter().cloned(),
        )?)),
        None => Ok(Box::new(LogRenderer)),
    }
}

async fn next_tick(ticker: Option<&mut tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn print_frame(gallery: &GalleryModel<SqliteImageStore>, frame: &[SlotAssignment]) {
    for assignment in frame {
        let content = assignment
            .image_id
            .and_then(|id| gallery.get(id))
            .map_or(SlotContent::Empty, SlotContent::Image);
        let caption = content.describe(assignment.primary);
        let label = if assignment.primary {
            style(&assignment.slot).bold().cyan()
        } else {
            style(&assignment.slot).cyan()
        };
        println!("{label:>10}  {caption}");
    }
}

fn print_config(loaded: &LoadedConfig, database: &Path) {
    let config = &loaded.config;
    match &loaded.source {
        Some(path) => println!("{} {}", style("Config:").bold(), path.display()),
        None => println!("{} (built-in defaults)", style("Config:").bold()),
    }
    println!("{} {}", style("Database:").bold(), database.display());
    println!("{} {} ms", style("Interval:").bold(), config.interval_ms);
    if let Some(reload) = config.reload_interval_ms {
        println!("{} {reload} ms", style("Reload:").bold());
    }
    println!("{} {}", style("Slots:").bold(), config.slots.join(", "));
    println!(
        "{} {CANVAS_WIDTH}x{CANVAS_HEIGHT} ({:?})",
        style("Canvas:").bold(),
        config.canvas.strategy
    );
    if let Some(dir) = &config.output_dir {
        println!("{} {}", style("Output:").bold(), dir.display());
    }
}

fn output_json<T: Serialize>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

fn output_error(cli: &Cli, error: &FrameError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "error": true,
            "code": error.code(),
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        eprintln!("{json}");
    } else {
        eprintln!("{}: {}", style("Error").red().bold(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", style("Hint").yellow(), suggestion);
        }
    }
}
