mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use mc_core::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults by verbosity.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediaconv=debug,mc_server=debug,mc_av=debug,mc_core=debug,tower_http=debug".to_string()
        } else {
            "mediaconv=info,mc_server=info,mc_av=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediaconv {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Resolve configuration: file (or defaults), then environment, then CLI flags.
fn resolve_config(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Config {
    let mut config = Config::load_or_default(config_path);
    config.apply_env_overrides();

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = resolve_config(config_path, host, port);

    tracing::info!(
        "Starting mediaconv on {}:{}",
        config.server.host,
        config.server.port
    );

    mc_server::start(config)
        .await
        .context("server terminated with an error")?;
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    println!("Checking external tools...\n");

    let tools = mc_av::ToolRegistry::discover(&config.tools).check_all();
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
            print!(" ({version})");
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
        println!("The conversion engine is missing. Install ffmpeg or set tools.ffmpeg_path.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Uploads: {}", config.storage.upload_dir.display());
    println!("  Converted: {}", config.storage.output_dir.display());
    println!("  Max upload: {} bytes", config.storage.max_upload_bytes);
    println!(
        "  Audio: {} @ {}",
        config.conversion.audio_codec, config.conversion.audio_bitrate
    );
    println!(
        "  Video: {} + {} ({})",
        config.conversion.video_codec,
        config.conversion.video_audio_codec,
        config.conversion.video_preset
    );

    for warning in config.validate() {
        println!("  ⚠ {warning}");
    }

    Ok(())
}
