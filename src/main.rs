mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use vl_av::{FfmpegEngine, FfprobeProber, ToolRegistry};
use vl_core::config::Config;
use vl_core::{UserId, VideoId, VideoStatus};
use vl_db::pool::{get_conn, init_pool};
use vl_db::queries::{users, video_variants, videos};
use vl_pipeline::StreamKind;

use videoladder::notifications::{spawn_listener, WebhookNotifier};
use videoladder::{config, ingest, worker, AppContext};

/// How long to wait for pending notifications before exiting.
const NOTIFY_DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "videoladder=trace,vl_pipeline=trace,vl_av=debug,vl_db=debug,vl_core=debug".to_string()
        } else {
            "videoladder=info,vl_pipeline=info,vl_av=info,vl_db=warn".to_string()
        }
    });

    // Logs go to stderr; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::AddUser { name, email } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            add_user(&config, &name, &email)
        }
        Commands::Ingest {
            file,
            user,
            name,
            disk,
            process,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(ingest_video(
                config,
                &file,
                &user,
                name.as_deref(),
                disk.as_deref(),
                process,
            ))
        }
        Commands::Process { id } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let id: VideoId = id.parse().context("Invalid video id")?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(process_video(config, id))
        }
        Commands::Work => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(work(config))
        }
        Commands::Show { id, json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let id: VideoId = id.parse().context("Invalid video id")?;
            show_video(&config, id, json)
        }
        Commands::List { status } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let status = status
                .map(|s| s.parse::<VideoStatus>())
                .transpose()?;
            list_videos(&config, status)
        }
        Commands::Probe { file, json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&config, &file, json))
        }
        Commands::CheckTools => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            check_tools(&config)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("videoladder {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Open the database and build the application context.
fn build_context(config: Config) -> Result<AppContext> {
    let db = init_pool(&config.database.path).with_context(|| {
        format!(
            "Failed to open database at {}",
            config.database.path.display()
        )
    })?;
    let engine = Arc::new(FfmpegEngine::from_config(&config.tools));
    Ok(AppContext::new(db, config, engine))
}

/// Start the webhook listener if one is configured.
fn start_notifier(ctx: &AppContext) -> Option<tokio::task::JoinHandle<()>> {
    let url = ctx.config.notifications.webhook_url.clone()?;
    let notifier = Arc::new(WebhookNotifier::new(url, ctx.db.clone()));
    Some(spawn_listener(&ctx.event_bus, notifier))
}

/// Drop the context so the event bus closes, then let the listener drain.
async fn finish_notifier(ctx: AppContext, handle: Option<tokio::task::JoinHandle<()>>) {
    drop(ctx);
    if let Some(handle) = handle {
        if tokio::time::timeout(NOTIFY_DRAIN_TIMEOUT, handle).await.is_err() {
            tracing::warn!("Timed out waiting for completion notifications");
        }
    }
}

fn add_user(config: &Config, name: &str, email: &str) -> Result<()> {
    let db = init_pool(&config.database.path)?;
    let conn = get_conn(&db)?;
    let user = users::create_user(&conn, name, email)?;
    println!("Created user {} <{}>: {}", user.name, user.email, user.id);
    Ok(())
}

/// Resolve a user given either an email address or an id.
fn find_user(ctx: &AppContext, user: &str) -> Result<UserId> {
    let conn = get_conn(&ctx.db)?;
    let found = if user.contains('@') {
        users::get_user_by_email(&conn, user)?
    } else {
        let id: UserId = user.parse().context("Invalid user id")?;
        users::get_user_by_id(&conn, id)?
    };
    found
        .map(|u| u.id)
        .ok_or_else(|| anyhow::anyhow!("No such user: {user}"))
}

async fn ingest_video(
    config: Config,
    file: &Path,
    user: &str,
    name: Option<&str>,
    disk: Option<&str>,
    process: bool,
) -> Result<()> {
    let ctx = build_context(config)?;
    let user_id = find_user(&ctx, user)?;

    let video = ingest::ingest_file(&ctx, user_id, file, name, disk)?;
    println!("Ingested {} as {}", file.display(), video.id);
    println!("  Disk: {}", video.disk);
    println!("  Path: {}", video.path);

    if process {
        let notifier = start_notifier(&ctx);
        let result = run_one(&ctx, video.id).await;
        finish_notifier(ctx, notifier).await;
        result?;
    }

    Ok(())
}

async fn process_video(config: Config, id: VideoId) -> Result<()> {
    let ctx = build_context(config)?;
    let notifier = start_notifier(&ctx);
    let result = run_one(&ctx, id).await;
    finish_notifier(ctx, notifier).await;
    result
}

async fn run_one(ctx: &AppContext, id: VideoId) -> Result<()> {
    let report = ctx.processor().run_job(id).await?;

    println!("Video {}: {}", report.video_id, report.status);
    if let Some(ref error) = report.error {
        println!("  Error: {}", error);
    }
    println!(
        "  Planned: {}",
        report
            .planned
            .iter()
            .map(|r| r.tag())
            .collect::<Vec<_>>()
            .join(", ")
    );
    for variant in report.recorded() {
        println!("  ✓ {} -> {}", variant.resolution, variant.path);
    }
    for outcome in &report.outcomes {
        if let vl_pipeline::RenditionOutcome::Failed { resolution, error } = outcome {
            println!("  ✗ {}: {}", resolution, error);
        }
    }
    Ok(())
}

async fn work(config: Config) -> Result<()> {
    let ctx = build_context(config)?;
    let notifier = start_notifier(&ctx);
    let result = worker::run_pending(&ctx).await;
    finish_notifier(ctx, notifier).await;

    let summary = result?;
    println!(
        "Processed {} videos: {} complete, {} failed, {} skipped, {} unrecorded, {} errors",
        summary.total(),
        summary.complete,
        summary.failed,
        summary.skipped,
        summary.unrecorded,
        summary.errors
    );
    if summary.unrecorded > 0 {
        anyhow::bail!(
            "{} jobs produced renditions that could not be recorded",
            summary.unrecorded
        );
    }
    if summary.errors > 0 {
        anyhow::bail!("{} jobs ended with an error", summary.errors);
    }
    Ok(())
}

fn show_video(config: &Config, id: VideoId, json: bool) -> Result<()> {
    let db = init_pool(&config.database.path)?;
    let conn = get_conn(&db)?;
    let video = videos::get_video(&conn, id)?
        .ok_or_else(|| anyhow::anyhow!("No such video: {id}"))?;
    let variants = video_variants::list_variants_for_video(&conn, id)?;

    if json {
        let value = serde_json::json!({ "video": video, "variants": variants });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Video: {}", video.id);
    println!("  Name: {}", video.name);
    println!("  Status: {}", video.status);
    if let Some(ref error) = video.error {
        println!("  Error: {}", error);
    }
    println!("  MIME: {}", video.mime_type);
    println!("  Source: {}:{}", video.disk, video.path);
    println!("  Updated: {}", video.updated_at.to_rfc3339());
    println!("\nRenditions: {}", variants.len());
    for variant in &variants {
        println!("  [{}] {}:{}", variant.resolution, variant.disk, variant.path);
    }
    Ok(())
}

fn list_videos(config: &Config, status: Option<VideoStatus>) -> Result<()> {
    let db = init_pool(&config.database.path)?;
    let conn = get_conn(&db)?;
    let list = videos::list_videos(&conn, status)?;

    if list.is_empty() {
        println!("No videos.");
        return Ok(());
    }
    for video in &list {
        println!(
            "{}  {:<10}  {}  ({}:{})",
            video.id,
            video.status.as_str(),
            video.name,
            video.disk,
            video.path
        );
    }
    Ok(())
}

async fn probe_file(config: &Config, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let tools = ToolRegistry::discover(&config.tools);
    let ffprobe = tools.require("ffprobe")?;
    let report = FfprobeProber::new(ffprobe.path.clone(), config.tools.timeout())
        .probe(file)
        .await?;

    if json {
        let streams: Vec<_> = report
            .streams
            .iter()
            .map(|s| {
                serde_json::json!({
                    "kind": format!("{:?}", s.kind).to_lowercase(),
                    "codec": s.codec,
                    "width": s.width,
                    "height": s.height,
                })
            })
            .collect();
        let value = serde_json::json!({
            "format": report.format,
            "duration_secs": report.duration_secs,
            "streams": streams,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    if let Some(ref format) = report.format {
        println!("Container: {}", format);
    }
    if let Some(duration) = report.duration_secs {
        let secs = duration as u64;
        println!(
            "Duration: {:02}:{:02}:{:02}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
    }
    println!("\nStreams: {}", report.streams.len());
    for (i, stream) in report.streams.iter().enumerate() {
        let codec = stream.codec.as_deref().unwrap_or("unknown");
        match (stream.kind, stream.width, stream.height) {
            (StreamKind::Video, Some(w), Some(h)) => println!("  [{}] video {} {}x{}", i, codec, w, h),
            (StreamKind::Video, _, _) => println!("  [{}] video {}", i, codec),
            (StreamKind::Audio, _, _) => println!("  [{}] audio {}", i, codec),
            (StreamKind::Other, _, _) => println!("  [{}] other {}", i, codec),
        }
    }

    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Videos cannot be processed until they are installed.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    println!("  Database: {}", config.database.path.display());
    for (name, root) in &config.storage.disks {
        let marker = if *name == config.storage.default_disk {
            " (default)"
        } else {
            ""
        };
        println!("  Disk {}: {}{}", name, root.display(), marker);
    }
    println!(
        "  Encoder: timeout {}s, {} threads",
        config.tools.timeout_secs, config.tools.threads
    );
    println!(
        "  Renditions in parallel: {}, workers: {}",
        config.processing.max_parallel_renditions, config.processing.worker_concurrency
    );

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  ! {}", warning);
        }
    }

    Ok(())
}
