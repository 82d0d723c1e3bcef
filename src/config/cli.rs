use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, builder::BoolishValueParser};

use crate::domain::types::ResourceKind;

/// Command-line arguments for the folio binary.
#[derive(Debug, Parser)]
#[command(
    name = "folio",
    version,
    about = "Article and review services behind a path-prefix gateway"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// The selected command; no subcommand runs the gateway.
    pub fn command_or_default(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Gateway(GatewayArgs::default()))
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the article resource service.
    Articles(ServiceArgs),
    /// Run the review resource service.
    Reviews(ServiceArgs),
    /// Run the gateway router.
    Gateway(GatewayArgs),
    /// Apply the embedded migrations for one service and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceName {
    Articles,
    Reviews,
}

impl ServiceName {
    pub fn kind(self) -> ResourceKind {
        match self {
            ServiceName::Articles => ResourceKind::Article,
            ServiceName::Reviews => ResourceKind::Review,
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListenerOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port of the selected process.
    #[arg(long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL of the selected service.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServiceArgs {
    #[command(flatten)]
    pub listener: ListenerOverrides,

    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Toggle applying migrations at startup.
    #[arg(
        long = "run-migrations",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub run_migrations: Option<bool>,

    /// Override the cache URL (`redis://...` or `memory://`).
    #[arg(long = "cache-url", value_name = "URL")]
    pub cache_url: Option<String>,

    /// Override the default cache entry lifetime.
    #[arg(long = "cache-default-ttl-seconds", value_name = "SECONDS")]
    pub cache_default_ttl_seconds: Option<u64>,

    /// Override the article collection URL used for existence checks.
    #[arg(long = "validator-article-service-url", value_name = "URL")]
    pub validator_article_service_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GatewayArgs {
    #[command(flatten)]
    pub listener: ListenerOverrides,

    /// Override the upstream request timeout.
    #[arg(long = "gateway-timeout-ms", value_name = "MILLIS")]
    pub gateway_timeout_ms: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct MigrateArgs {
    /// Service whose migrations are applied.
    #[arg(long = "service", value_enum)]
    pub service: ServiceName,

    #[command(flatten)]
    pub database: DatabaseOverride,
}
