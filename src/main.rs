use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use maimai_render::api;
use maimai_render::error::ConfigError;
use maimai_render::models::{AppConfig, ExportRequest};
use maimai_render::server;
use maimai_render::services::{ChromeCapturer, SnapshotCapturer};

#[derive(Parser)]
#[command(name = "maimai-render")]
#[command(about = "MaiMai Render Server - captures snapshot canvases with headless Chromium")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Capture a render page directly to a PNG file
    Capture {
        /// URL of the render page
        #[arg(short, long)]
        url: String,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show the effective configuration
    Status,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MaiMai Render Server API",
        description = "Captures snapshot canvases with headless Chromium",
        license(name = "MIT")
    ),
    paths(api::handle_export_image, api::handle_health, api::handle_root),
    components(schemas(
        ExportRequest,
        api::HealthResponse,
        api::ServiceInfo,
        api::EndpointList,
    )),
    tags(
        (name = "Export", description = "Snapshot image export"),
        (name = "Service", description = "Liveness and metadata")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Capture { url, output }) => run_capture_command(&url, &output).await,
        Some(Commands::Status) => {
            run_status_command();
            Ok(())
        }
        Some(Commands::Serve) | None => run_server().await,
    }
}

fn init_tracing(default_filter: &str, with_time: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if with_time {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();
    }
}

/// Report configuration problems once a subscriber is installed
fn log_config_problems(problems: &[ConfigError]) {
    for problem in problems {
        tracing::warn!(%problem, "Configuration problem, using default");
    }
}

/// Whether `DEBUG` asks for verbose logging. Read ahead of the full config
/// so the subscriber exists before config problems are reported.
fn debug_requested() -> bool {
    std::env::var("DEBUG").is_ok_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Capture a page straight to disk (no server needed)
async fn run_capture_command(url: &str, output: &PathBuf) -> anyhow::Result<()> {
    // Minimal logging for CLI
    init_tracing("maimai_render=warn", false);

    let (config, problems) = AppConfig::load();
    log_config_problems(&problems);
    let capturer = ChromeCapturer::new(config.capture);

    let image = capturer
        .capture(url)
        .await
        .map_err(|e| anyhow::anyhow!("Capture error: {e}"))?;

    let (width, height) = image.dimensions();
    std::fs::write(output, image.as_bytes())?;
    println!(
        "Captured {} ({width}x{height}, {} bytes)",
        output.display(),
        image.len()
    );

    Ok(())
}

/// Display effective configuration
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    init_tracing("maimai_render=warn", false);

    let (config, problems) = AppConfig::load();
    log_config_problems(&problems);
    let capture = &config.capture;

    println!("MaiMai Render Server v{VERSION}\n");

    println!("Server:");
    println!("  Bind address   = {}", config.server.bind_address());
    println!("  Debug          = {}", config.server.debug);
    println!(
        "  Config file    = {}",
        std::env::var("CONFIG_FILE").unwrap_or_else(|_| "(not set)".to_string())
    );

    println!("\nCapture:");
    println!(
        "  Viewport       = {}x{} @{}x",
        capture.viewport_width, capture.viewport_height, capture.device_scale_factor
    );
    println!("  Navigation     = {} ms", capture.navigation_timeout_ms);
    println!("  Render         = {} ms", capture.render_timeout_ms);
    println!("  Poll interval  = {} ms", capture.poll_interval_ms);
    println!("  Settle         = {} ms", capture.settle_ms);
    println!("  Screenshot     = {} ms", capture.screenshot_timeout_ms);
    println!("  Selector       = {}", capture.canvas_selector);
    println!("  Completion     = window.{}", capture.completion_flag);
    println!(
        "  Chromium       = {}",
        capture
            .chrome_executable
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "auto-detect".to_string())
    );
    println!(
        "  Profile root   = {}",
        capture
            .profile_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .display()
    );

    println!("\nCommands:");
    println!("  maimai-render serve     Start the HTTP server");
    println!("  maimai-render capture   Capture a render page to a PNG file");
    println!("  maimai-render status    Show this information");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    let default_filter = if debug_requested() {
        "maimai_render=debug,tower_http=debug"
    } else {
        "maimai_render=info,tower_http=info"
    };
    init_tracing(default_filter, true);

    let (config, problems) = AppConfig::load();
    log_config_problems(&problems);

    let bind_addr = config.server.bind_address();
    tracing::info!(
        addr = %bind_addr,
        debug = config.server.debug,
        navigation_timeout_ms = config.capture.navigation_timeout_ms,
        render_timeout_ms = config.capture.render_timeout_ms,
        "Starting MaiMai Render Server"
    );

    let state = server::create_app_state(&config);

    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MaiMai Render Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
