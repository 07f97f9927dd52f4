// # cloudosd - cloudos startup daemon
//
// Thin integration layer: all configuration logic lives in cloudos-core.
//
// The daemon is responsible for:
// 1. Reading settings (JSON file + environment overrides)
// 2. Initializing logging and the runtime
// 3. Building the configuration root and resolving the services that can
//    fail fatally, so that a bad DNS mode or an unknown host address stops
//    startup instead of surfacing on the first request
// 4. Waiting for shutdown
//
// ## Configuration
//
// - `CLOUDOS_CONFIG`: Path to the JSON settings file (required)
// - `CLOUDOS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `CLOUDOS_DNS_MODE`: Overrides `dnsMode`
// - `CLOUDOS_APP_REPOSITORY`: Overrides `appRepository`
// - `CLOUDOS_PUBLIC_URI_BASE`: Overrides `publicUriBase`
//
// ## Example
//
// ```bash
// export CLOUDOS_CONFIG=/etc/cloudos/cloudos.json
// export CLOUDOS_DNS_MODE=cdns
//
// cloudosd
// ```

use anyhow::{Context, Result};
use cloudos_core::{CloudOsConfiguration, CloudOsSettings};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error (including fatal resolution errors)
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum CloudOsExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CloudOsExitCode> for ExitCode {
    fn from(code: CloudOsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon environment
struct Env {
    config_path: String,
    log_level: String,
    dns_mode: Option<String>,
    app_repository: Option<String>,
    public_uri_base: Option<String>,
}

impl Env {
    fn from_env() -> Result<Self> {
        Ok(Self {
            config_path: env::var("CLOUDOS_CONFIG").context(
                "CLOUDOS_CONFIG is required. \
                Set it via: export CLOUDOS_CONFIG=/etc/cloudos/cloudos.json",
            )?,
            log_level: env::var("CLOUDOS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dns_mode: env::var("CLOUDOS_DNS_MODE").ok(),
            app_repository: env::var("CLOUDOS_APP_REPOSITORY").ok(),
            public_uri_base: env::var("CLOUDOS_PUBLIC_URI_BASE").ok(),
        })
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "CLOUDOS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Load the settings file and apply environment overrides
    fn load_settings(&self) -> Result<CloudOsSettings> {
        let mut settings = CloudOsSettings::from_json_file(&self.config_path)?;

        if let Some(mode) = &self.dns_mode {
            settings.dns_mode = Some(mode.clone());
        }
        if let Some(repo) = &self.app_repository {
            settings.app_repository = repo.into();
        }
        if let Some(base) = &self.public_uri_base {
            settings.public_uri_base = base.clone();
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> ExitCode {
    let env = match Env::from_env() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return CloudOsExitCode::ConfigError.into();
        }
    };

    let log_level = match env.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return CloudOsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CloudOsExitCode::ConfigError.into();
    }

    info!("Starting cloudosd");

    let settings = match env.load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration validation error: {:#}", e);
            return CloudOsExitCode::ConfigError.into();
        }
    };

    let configuration = match resolve_startup(CloudOsConfiguration::new(settings)) {
        Ok(configuration) => Arc::new(configuration),
        Err(e) => {
            if e.is_fatal() {
                error!("Fatal startup error: {}", e);
            } else {
                error!("Startup error: {}", e);
            }
            return CloudOsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CloudOsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(configuration).await {
            error!("Daemon error: {:#}", e);
            CloudOsExitCode::RuntimeError
        } else {
            CloudOsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Resolve every lazy service that can fail fatally
fn resolve_startup(configuration: CloudOsConfiguration) -> cloudos_core::Result<CloudOsConfiguration> {
    let dns = configuration.dns_manager()?;
    let hostname = configuration.hostname()?;
    let short_hostname = configuration.short_hostname()?;
    let public_ip = configuration.public_ip()?;

    info!("DNS manager: {}", dns.name());
    info!("Host identity: {} ({}) at {}", hostname, short_hostname, public_ip);
    info!("App repository: {}", configuration.app_repository().display());
    if !configuration.public_uri_base().is_empty() {
        info!("Asset URL base: {}", configuration.asset_url_base());
    }
    info!("System locale: {}", configuration.system_locale());

    Ok(configuration)
}

async fn run_daemon(configuration: Arc<CloudOsConfiguration>) -> Result<()> {
    info!(
        "cloudosd ready (admin: {}, automation group: {})",
        configuration.default_admin(),
        configuration.rooty_group()
    );

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);
    info!("Shutting down cloudosd");

    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for CTRL-C")?;
    Ok("SIGINT")
}
