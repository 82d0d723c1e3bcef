use super::*;

fn service_args(args: &[&str]) -> Command {
    CliArgs::parse_from(args)
        .command
        .expect("subcommand parsed")
}

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.articles_addr.port(), DEFAULT_ARTICLES_PORT);
    assert_eq!(settings.server.reviews_addr.port(), DEFAULT_REVIEWS_PORT);
    assert_eq!(settings.server.gateway_addr.port(), DEFAULT_GATEWAY_PORT);
    assert_eq!(settings.cache.default_ttl(), Duration::from_secs(600));
    assert!(settings.cache.url.is_none());
    assert!(settings.database.run_migrations);
    assert_eq!(settings.pagination, PageLimits::default());
    assert_eq!(
        settings.validator.article_service_url.as_str(),
        DEFAULT_VALIDATOR_ARTICLE_URL
    );

    let prefixes: Vec<&str> = settings
        .gateway
        .routes
        .iter()
        .map(|route| route.prefix.as_str())
        .collect();
    assert_eq!(prefixes, vec!["/articles", "/reviews"]);
    assert_eq!(
        settings.gateway.max_body_bytes as u64,
        DEFAULT_GATEWAY_MAX_BODY_BYTES
    );
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.articles_port = Some(7000);
    raw.logging.level = Some("info".to_string());

    raw.apply_command_overrides(&service_args(&[
        "folio",
        "articles",
        "--port",
        "7001",
        "--log-level",
        "debug",
    ]));
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.articles_addr.port(), 7001);
    assert_eq!(settings.server.reviews_addr.port(), DEFAULT_REVIEWS_PORT);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn port_override_targets_the_selected_process() {
    let mut raw = RawSettings::default();
    raw.apply_command_overrides(&service_args(&["folio", "reviews", "--port", "9002"]));
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.reviews_addr.port(), 9002);
    assert_eq!(settings.server.articles_addr.port(), DEFAULT_ARTICLES_PORT);
}

#[test]
fn database_override_targets_the_selected_service() {
    let mut raw = RawSettings::default();
    raw.apply_command_overrides(&service_args(&[
        "folio",
        "migrate",
        "--service",
        "reviews",
        "--database-url",
        "postgres://reviews",
    ]));
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.database.url_for(ResourceKind::Review),
        Some("postgres://reviews")
    );
    assert_eq!(settings.database.url_for(ResourceKind::Article), None);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_command_overrides(&service_args(&["folio", "gateway", "--log-json", "true"]));
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_gateway_command() {
    let args = CliArgs::parse_from(["folio"]);
    assert!(matches!(args.command_or_default(), Command::Gateway(_)));
}

#[test]
fn parse_service_overrides() {
    match service_args(&[
        "folio",
        "reviews",
        "--server-host",
        "0.0.0.0",
        "--cache-url",
        "redis://cache:6379",
        "--validator-article-service-url",
        "http://articles:5001/articles",
        "--run-migrations",
        "false",
    ]) {
        Command::Reviews(args) => {
            assert_eq!(args.listener.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(args.cache_url.as_deref(), Some("redis://cache:6379"));
            assert_eq!(
                args.validator_article_service_url.as_deref(),
                Some("http://articles:5001/articles")
            );
            assert_eq!(args.run_migrations, Some(false));
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn rejects_unknown_cache_scheme() {
    let mut raw = RawSettings::default();
    raw.cache.url = Some("memcached://cache".to_string());

    let err = Settings::from_raw(raw).expect_err("invalid cache url");
    assert!(matches!(err, LoadError::Invalid { key: "cache.url", .. }));
}

#[test]
fn rejects_zero_deadlines() {
    let mut raw = RawSettings::default();
    raw.cache.operation_timeout_ms = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.validator.timeout_ms = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.database.statement_timeout_ms = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn cache_ttl_is_bounded_above() {
    let mut raw = RawSettings::default();
    raw.cache.default_ttl_seconds = Some(u64::MAX);
    let err = Settings::from_raw(raw).expect_err("ttl too large");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.default_ttl_seconds",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.cache.default_ttl_seconds = Some(MAX_CACHE_TTL_SECS);
    let settings = Settings::from_raw(raw).expect("ttl at the bound");
    assert_eq!(
        settings.cache.default_ttl(),
        Duration::from_secs(MAX_CACHE_TTL_SECS)
    );
}

#[test]
fn rejects_default_page_size_above_maximum() {
    let mut raw = RawSettings::default();
    raw.pagination.default_page_size = Some(50);
    raw.pagination.max_page_size = Some(10);

    let err = Settings::from_raw(raw).expect_err("inconsistent page sizes");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "pagination.default_page_size",
            ..
        }
    ));
}

#[test]
fn rejects_gateway_prefix_without_leading_slash() {
    let mut raw = RawSettings::default();
    raw.gateway.routes = Some(vec![RawRouteSettings {
        prefix: "articles".to_string(),
        upstream: "http://127.0.0.1:5001".to_string(),
    }]);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn rejects_non_http_upstream() {
    let mut raw = RawSettings::default();
    raw.gateway.routes = Some(vec![RawRouteSettings {
        prefix: "/articles".to_string(),
        upstream: "ftp://127.0.0.1".to_string(),
    }]);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn rejects_duplicate_gateway_prefixes() {
    let mut raw = RawSettings::default();
    raw.gateway.routes = Some(vec![
        RawRouteSettings {
            prefix: "/articles".to_string(),
            upstream: "http://127.0.0.1:5001".to_string(),
        },
        RawRouteSettings {
            prefix: "/articles".to_string(),
            upstream: "http://127.0.0.1:6001".to_string(),
        },
    ]);

    assert!(Settings::from_raw(raw).is_err());
}
