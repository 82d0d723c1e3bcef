//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, DatabaseOverride, GatewayArgs, ListenerOverrides, MigrateArgs, ServiceArgs,
    ServiceName,
};

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageLimits};
use crate::cache::CacheConfig;
use crate::domain::types::ResourceKind;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "folio";
const ENV_PREFIX: &str = "FOLIO";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ARTICLES_PORT: u16 = 5001;
const DEFAULT_REVIEWS_PORT: u16 = 5002;
const DEFAULT_GATEWAY_PORT: u16 = 5000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_DB_ACQUIRE_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_DB_STATEMENT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CACHE_TTL_SECS: u64 = 600;
const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;
const DEFAULT_CACHE_OPERATION_TIMEOUT_MS: u64 = 250;
const DEFAULT_CACHE_MEMORY_CAPACITY: usize = 1024;
const DEFAULT_VALIDATOR_ARTICLE_URL: &str = "http://127.0.0.1:5001/articles";
const DEFAULT_VALIDATOR_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_GATEWAY_MAX_BODY_BYTES: u64 = 2 * 1024 * 1024;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheConfig,
    pub validator: ValidatorSettings,
    pub gateway: GatewaySettings,
    pub pagination: PageLimits,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub articles_addr: SocketAddr,
    pub reviews_addr: SocketAddr,
    pub gateway_addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

impl ServerSettings {
    pub fn addr_for(&self, kind: ResourceKind) -> SocketAddr {
        match kind {
            ResourceKind::Article => self.articles_addr,
            ResourceKind::Review => self.reviews_addr,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub articles_url: Option<String>,
    pub reviews_url: Option<String>,
    pub max_connections: NonZeroU32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Duration,
    pub run_migrations: bool,
}

impl DatabaseSettings {
    pub fn url_for(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Article => self.articles_url.as_deref(),
            ResourceKind::Review => self.reviews_url.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatorSettings {
    pub article_service_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSettings {
    pub prefix: String,
    pub upstream: Url,
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub routes: Vec<RouteSettings>,
    pub timeout: Duration,
    pub max_body_bytes: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_command_overrides(&cli.command_or_default());

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    validator: RawValidatorSettings,
    gateway: RawGatewaySettings,
    pagination: RawPaginationSettings,
}

impl RawSettings {
    fn apply_command_overrides(&mut self, command: &Command) {
        match command {
            Command::Articles(args) => self.apply_service_overrides(ResourceKind::Article, args),
            Command::Reviews(args) => self.apply_service_overrides(ResourceKind::Review, args),
            Command::Gateway(args) => self.apply_gateway_overrides(args),
            Command::Migrate(args) => {
                self.apply_database_override(args.service.kind(), &args.database)
            }
        }
    }

    fn apply_service_overrides(&mut self, kind: ResourceKind, args: &ServiceArgs) {
        self.apply_listener_overrides(&args.listener);
        if let Some(port) = args.listener.port {
            match kind {
                ResourceKind::Article => self.server.articles_port = Some(port),
                ResourceKind::Review => self.server.reviews_port = Some(port),
            }
        }

        self.apply_database_override(kind, &args.database);
        if let Some(max) = args.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(run) = args.run_migrations {
            self.database.run_migrations = Some(run);
        }
        if let Some(url) = args.cache_url.as_ref() {
            self.cache.url = Some(url.clone());
        }
        if let Some(ttl) = args.cache_default_ttl_seconds {
            self.cache.default_ttl_seconds = Some(ttl);
        }
        if let Some(url) = args.validator_article_service_url.as_ref() {
            self.validator.article_service_url = Some(url.clone());
        }
    }

    fn apply_gateway_overrides(&mut self, args: &GatewayArgs) {
        self.apply_listener_overrides(&args.listener);
        if let Some(port) = args.listener.port {
            self.server.gateway_port = Some(port);
        }
        if let Some(timeout) = args.gateway_timeout_ms {
            self.gateway.timeout_ms = Some(timeout);
        }
    }

    fn apply_listener_overrides(&mut self, overrides: &ListenerOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_database_override(&mut self, kind: ResourceKind, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            match kind {
                ResourceKind::Article => self.database.articles_url = Some(url.clone()),
                ResourceKind::Review => self.database.reviews_url = Some(url.clone()),
            }
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            validator,
            gateway,
            pagination,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            validator: build_validator_settings(validator)?,
            gateway: build_gateway_settings(gateway)?,
            pagination: build_pagination_settings(pagination)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let articles_addr = listener_addr(
        &host,
        server.articles_port.unwrap_or(DEFAULT_ARTICLES_PORT),
        "server.articles_port",
    )?;
    let reviews_addr = listener_addr(
        &host,
        server.reviews_port.unwrap_or(DEFAULT_REVIEWS_PORT),
        "server.reviews_port",
    )?;
    let gateway_addr = listener_addr(
        &host,
        server.gateway_port.unwrap_or(DEFAULT_GATEWAY_PORT),
        "server.gateway_port",
    )?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        articles_addr,
        reviews_addr,
        gateway_addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;
    let acquire_timeout = non_zero_millis(
        database
            .acquire_timeout_ms
            .unwrap_or(DEFAULT_DB_ACQUIRE_TIMEOUT_MS),
        "database.acquire_timeout_ms",
    )?;
    let statement_timeout = non_zero_millis(
        database
            .statement_timeout_ms
            .unwrap_or(DEFAULT_DB_STATEMENT_TIMEOUT_MS),
        "database.statement_timeout_ms",
    )?;

    Ok(DatabaseSettings {
        articles_url: non_blank(database.articles_url),
        reviews_url: non_blank(database.reviews_url),
        max_connections,
        acquire_timeout,
        statement_timeout,
        run_migrations: database.run_migrations.unwrap_or(true),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheConfig, LoadError> {
    let default_ttl_seconds = cache.default_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if default_ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.default_ttl_seconds",
            "must be greater than zero",
        ));
    }
    if default_ttl_seconds > MAX_CACHE_TTL_SECS {
        return Err(LoadError::invalid(
            "cache.default_ttl_seconds",
            format!("must not exceed {MAX_CACHE_TTL_SECS} (30 days)"),
        ));
    }

    let operation_timeout_ms = cache
        .operation_timeout_ms
        .unwrap_or(DEFAULT_CACHE_OPERATION_TIMEOUT_MS);
    if operation_timeout_ms == 0 {
        return Err(LoadError::invalid(
            "cache.operation_timeout_ms",
            "must be greater than zero",
        ));
    }

    let memory_capacity = cache
        .memory_capacity
        .unwrap_or(DEFAULT_CACHE_MEMORY_CAPACITY);
    if memory_capacity == 0 {
        return Err(LoadError::invalid(
            "cache.memory_capacity",
            "must be greater than zero",
        ));
    }

    let config = CacheConfig {
        url: non_blank(cache.url),
        default_ttl_seconds,
        operation_timeout_ms,
        memory_capacity,
    };
    config
        .backend()
        .map_err(|err| LoadError::invalid("cache.url", err.to_string()))?;

    Ok(config)
}

fn build_validator_settings(
    validator: RawValidatorSettings,
) -> Result<ValidatorSettings, LoadError> {
    let raw_url = non_blank(validator.article_service_url)
        .unwrap_or_else(|| DEFAULT_VALIDATOR_ARTICLE_URL.to_string());
    let article_service_url = parse_http_url(&raw_url, "validator.article_service_url")?;
    let timeout = non_zero_millis(
        validator.timeout_ms.unwrap_or(DEFAULT_VALIDATOR_TIMEOUT_MS),
        "validator.timeout_ms",
    )?;

    Ok(ValidatorSettings {
        article_service_url,
        timeout,
    })
}

fn build_gateway_settings(gateway: RawGatewaySettings) -> Result<GatewaySettings, LoadError> {
    let raw_routes = gateway.routes.unwrap_or_else(default_routes);
    if raw_routes.is_empty() {
        return Err(LoadError::invalid(
            "gateway.routes",
            "at least one route is required",
        ));
    }

    let mut routes = Vec::with_capacity(raw_routes.len());
    for route in raw_routes {
        let prefix = route.prefix.trim().to_string();
        if !prefix.starts_with('/') {
            return Err(LoadError::invalid(
                "gateway.routes.prefix",
                format!("`{prefix}` must start with `/`"),
            ));
        }
        if routes.iter().any(|existing: &RouteSettings| existing.prefix == prefix) {
            return Err(LoadError::invalid(
                "gateway.routes.prefix",
                format!("`{prefix}` is configured more than once"),
            ));
        }
        let upstream = parse_http_url(&route.upstream, "gateway.routes.upstream")?;
        routes.push(RouteSettings { prefix, upstream });
    }

    let timeout = non_zero_millis(
        gateway.timeout_ms.unwrap_or(DEFAULT_GATEWAY_TIMEOUT_MS),
        "gateway.timeout_ms",
    )?;

    let max_body_bytes = gateway
        .max_body_bytes
        .unwrap_or(DEFAULT_GATEWAY_MAX_BODY_BYTES);
    if max_body_bytes == 0 {
        return Err(LoadError::invalid(
            "gateway.max_body_bytes",
            "must be greater than zero",
        ));
    }
    let max_body_bytes = usize::try_from(max_body_bytes).map_err(|_| {
        LoadError::invalid(
            "gateway.max_body_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(GatewaySettings {
        routes,
        timeout,
        max_body_bytes,
    })
}

fn build_pagination_settings(pagination: RawPaginationSettings) -> Result<PageLimits, LoadError> {
    let max_page_size = non_zero_u32(
        pagination.max_page_size.unwrap_or(MAX_PAGE_SIZE).into(),
        "pagination.max_page_size",
    )?
    .get();
    let default_page_size = non_zero_u32(
        pagination
            .default_page_size
            .unwrap_or(DEFAULT_PAGE_SIZE.min(max_page_size))
            .into(),
        "pagination.default_page_size",
    )?
    .get();

    if default_page_size > max_page_size {
        return Err(LoadError::invalid(
            "pagination.default_page_size",
            format!("must not exceed pagination.max_page_size ({max_page_size})"),
        ));
    }

    Ok(PageLimits {
        default_page_size,
        max_page_size,
    })
}

fn default_routes() -> Vec<RawRouteSettings> {
    vec![
        RawRouteSettings {
            prefix: "/articles".to_string(),
            upstream: format!("http://{DEFAULT_HOST}:{DEFAULT_ARTICLES_PORT}"),
        },
        RawRouteSettings {
            prefix: "/reviews".to_string(),
            upstream: format!("http://{DEFAULT_HOST}:{DEFAULT_REVIEWS_PORT}"),
        },
    ]
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    articles_port: Option<u16>,
    reviews_port: Option<u16>,
    gateway_port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    articles_url: Option<String>,
    reviews_url: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_ms: Option<u64>,
    statement_timeout_ms: Option<u64>,
    run_migrations: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    url: Option<String>,
    default_ttl_seconds: Option<u64>,
    operation_timeout_ms: Option<u64>,
    memory_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawValidatorSettings {
    article_service_url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGatewaySettings {
    routes: Option<Vec<RawRouteSettings>>,
    timeout_ms: Option<u64>,
    max_body_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRouteSettings {
    prefix: String,
    upstream: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPaginationSettings {
    default_page_size: Option<u32>,
    max_page_size: Option<u32>,
}

fn listener_addr(host: &str, port: u16, key: &'static str) -> Result<SocketAddr, LoadError> {
    if port == 0 {
        return Err(LoadError::invalid(key, "port must be greater than zero"));
    }
    parse_socket_addr(host, port).map_err(|reason| LoadError::invalid(key, reason))
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_http_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("invalid url `{value}`: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            key,
            format!("`{value}` must use http or https"),
        ));
    }
    Ok(url)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_millis(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_millis(value))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
