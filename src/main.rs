//! picture-mailer - store uploaded pictures and email them to visitors.
//!
//! This binary starts the HTTP server, runs the upload test client, or checks
//! storage connectivity.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use picture_mailer::{
    config::{CheckConfig, Cli, Command, ServeConfig, UploadConfig},
    create_router, create_s3_client, AppState, PictureClient, PictureStore, RouterConfig,
    S3PictureStore, SendGridClient,
};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Upload(config) => run_upload(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let storage = &config.storage;

    info!("picture-mailer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Project: {}", storage.project_id);
    info!("  Bucket: {}", storage.bucket_name);
    if let Some(ref endpoint) = storage.storage_endpoint {
        info!("  Storage endpoint: {}", endpoint);
    }
    info!("  Storage region: {}", storage.storage_region);
    info!("  Sender: {}", config.sender_email);
    info!("  Mail API: {}", config.sendgrid_base_url);

    if config.auth_enabled {
        info!("  Auth: enabled (X-API-KEY)");
    } else {
        warn!("  Auth: DISABLED - /upload and /email are publicly accessible");
        warn!("        Enable for production: --auth-enabled=true --api-key=<secret>");
    }

    match config.cors_origin {
        Some(ref origin) => info!("  CORS origin: {}", origin),
        None => info!("  CORS origin: any"),
    }
    info!("  Max upload body: {} bytes", config.max_upload_bytes);

    let s3_client = create_s3_client(
        storage.storage_endpoint.as_deref(),
        &storage.storage_region,
    )
    .await;
    let store = S3PictureStore::new(s3_client, storage.bucket_name.clone());

    info!("");
    info!("Connecting to storage...");
    match store.list().await {
        Ok(keys) => {
            info!("  Connected successfully");
            info!("  Found {} picture(s) in bucket", keys.len());
        }
        Err(e) => {
            error!("  Failed to connect to storage: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - Your storage credentials are configured correctly");
            error!(
                "    - The bucket '{}' exists and is accessible",
                storage.bucket_name
            );
            error!("    - The storage endpoint is correct (GCS interoperability, MinIO)");
            return ExitCode::FAILURE;
        }
    }

    let mailer = SendGridClient::with_base_url(&config.sendgrid_api_key, &config.sendgrid_base_url);
    let state = AppState::new(store, mailer, config.sender_email.clone());
    let router = create_router(state, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/", addr);
    info!("    curl http://{}/status", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "picture_mailer=debug,tower_http=debug"
    } else {
        "picture_mailer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = if config.auth_enabled {
        RouterConfig::new(config.api_key_or_empty())
    } else {
        RouterConfig::without_auth()
    };

    if let Some(ref origin) = config.cors_origin {
        router_config = router_config.with_cors_origin(origin.clone());
    }

    router_config
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_tracing(!config.no_tracing)
}

// =============================================================================
// Upload Command
// =============================================================================

async fn run_upload(config: UploadConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let client = PictureClient::new(&config.server_url, &config.api_key);

    let name = match client.upload_file(&config.file).await {
        Ok((name, message)) => {
            println!("{}", message);
            name
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref recipient) = config.email {
        match client.email(recipient, &name).await {
            Ok(message) => println!("{}", message),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("picture-mailer Configuration Check");
    println!("══════════════════════════════════");
    println!();

    let storage = &config.storage;
    if let Err(e) = storage.validate() {
        println!("✗ {}", e);
        return ExitCode::FAILURE;
    }

    println!("✓ Project: {}", storage.project_id);
    println!("✓ Bucket: {}", storage.bucket_name);
    if let Some(ref endpoint) = storage.storage_endpoint {
        println!("✓ Endpoint: {}", endpoint);
    }
    println!("✓ Region: {}", storage.storage_region);
    println!();

    print!("Testing storage connection... ");

    let s3_client = create_s3_client(
        storage.storage_endpoint.as_deref(),
        &storage.storage_region,
    )
    .await;
    let store = S3PictureStore::new(s3_client, storage.bucket_name.clone());

    let pictures = match store.list().await {
        Ok(keys) => {
            println!("✓ success");
            keys
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - Your storage credentials are configured correctly");
            println!(
                "  - The bucket '{}' exists and is accessible",
                storage.bucket_name
            );
            if storage.storage_endpoint.is_some() {
                println!("  - The storage endpoint is correct and reachable");
            }
            return ExitCode::FAILURE;
        }
    };

    println!("  Pictures: {}", pictures.len());
    println!("  Console: {}", store.console_url());

    if config.list_pictures {
        println!();
        println!("Pictures in bucket:");
        println!("───────────────────");
        if pictures.is_empty() {
            println!("  (no pictures found)");
        } else {
            for name in &pictures {
                println!("  {}", name);
            }
        }
    }

    println!();
    println!("══════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
