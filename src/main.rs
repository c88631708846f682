use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ingredient_scanner::{
    ApiKey, CameraBackend, EventFilter, FacingMode, IncomingFile, IntakeOutcome, KeyStore, KeyVerifier, Mode,
    Scanner, ScannerConfig, StaticCredentials,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ingredient-scanner")]
#[command(about = "Check product ingredients from text, an image, or the camera")]
#[command(version)]
#[command(long_about = "Collects an ingredient list as typed text, an uploaded label photo, \
or a still from a live camera, and sends it to a remote analysis service for a safety summary.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ingredient-scanner.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Use this API key instead of the saved one
    #[arg(long, value_name = "KEY", global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a typed ingredient list
    Text {
        /// Ingredients, e.g. "sugar, salt, water"
        ingredients: String,
    },
    /// Analyze a photo of an ingredient label
    Image {
        /// Image file to upload
        path: String,
    },
    /// Capture a still from the camera and analyze it
    Camera {
        /// Camera to open: user (front) or environment (rear)
        #[arg(long)]
        facing: Option<FacingMode>,

        /// Camera implementation: mock or gstreamer
        #[arg(long, default_value = "mock")]
        backend: CameraBackend,
    },
    /// Manage the saved API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand, Debug)]
enum KeyAction {
    /// Verify a key and save it
    Set { key: String },
    /// Remove the saved key
    Delete,
    /// Report whether a key is saved
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting ingredient scanner v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match ScannerConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let Some(command) = args.command else {
        bail!("no command given, see --help");
    };

    match command {
        Command::Key { action } => run_key_command(&config, action).await,
        Command::Text { ingredients } => {
            let mut scanner = build_scanner(config, args.api_key, CameraBackend::Mock, args.debug).await?;
            scanner.set_text(ingredients);
            analyze_and_print(&mut scanner).await
        }
        Command::Image { path } => {
            let mut scanner = build_scanner(config, args.api_key, CameraBackend::Mock, args.debug).await?;
            scanner.set_mode(Mode::Image).await;

            match scanner.pick_file(IncomingFile::from_path(&path)).await {
                IntakeOutcome::Accepted(uri) => info!("Loaded {} as {}", path, uri.mime_type()),
                IntakeOutcome::Rejected(reason) => bail!("{}: {}", path, reason),
            }

            analyze_and_print(&mut scanner).await
        }
        Command::Camera { facing, backend } => {
            let warmup = Duration::from_millis(config.camera.warmup_ms);
            let default_facing = config.camera.default_facing;
            let mut scanner = build_scanner(config, args.api_key, backend, args.debug).await?;

            if facing.unwrap_or(default_facing) != default_facing {
                scanner.flip_facing().await;
            }
            scanner.set_mode(Mode::Camera).await;

            if let Some(e) = scanner.controller().device_error() {
                bail!("camera unavailable: {}", e);
            }

            tokio::time::sleep(warmup).await;
            scanner.capture().await.context("failed to capture a still")?;

            let result = analyze_and_print(&mut scanner).await;
            scanner.shutdown();
            result
        }
    }
}

async fn build_scanner(
    config: ScannerConfig,
    api_key: Option<String>,
    backend: CameraBackend,
    debug: bool,
) -> Result<Scanner> {
    let builder = Scanner::builder(config)
        .camera_backend(backend)
        .debug_events(debug);

    let builder = match api_key {
        Some(raw) => builder.credentials(Arc::new(StaticCredentials::new(ApiKey::new(&raw)?))),
        None => builder.with_key_store().await?,
    };

    let scanner = builder.build().map_err(|e| {
        error!("Failed to set up scanner: {}", e);
        anyhow::Error::from(e)
    })?;

    let filter = if debug {
        EventFilter::All
    } else {
        EventFilter::EventTypes(vec!["device_failed", "analysis_failed", "intake_rejected"])
    };
    tokio::spawn(scanner.event_receiver(filter, "cli").log_until_closed());

    Ok(scanner)
}

async fn analyze_and_print(scanner: &mut Scanner) -> Result<()> {
    scanner.analyze().await.context("analysis failed")?;

    if let Some(rendered) = scanner.render_result() {
        println!("{}", rendered);
    }
    Ok(())
}

async fn run_key_command(config: &ScannerConfig, action: KeyAction) -> Result<()> {
    let store = KeyStore::open(&config.credentials.key_file).await?;

    match action {
        KeyAction::Set { key } => {
            let verifier = KeyVerifier::new(config.credentials.verify_endpoint.clone())?;
            store.verify_and_save(&key, &verifier).await?;
            println!("✓ API key saved");
        }
        KeyAction::Delete => {
            store.delete().await?;
            println!("✓ API key removed");
        }
        KeyAction::Status => {
            if store.has_key() {
                println!("API key saved at {}", store.path().display());
            } else {
                println!("No API key saved");
            }
        }
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ingredient_scanner={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .with_writer(std::io::stderr)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Ingredient scanner configuration");
    println!("# Every option with its default value");
    println!("# Environment overrides use SCANNER_<SECTION>__<KEY>, e.g. SCANNER_ANALYSIS__ENDPOINT");
    println!();
    println!("{}", toml::to_string_pretty(&ScannerConfig::default())?);
    Ok(())
}
