use std::future::IntoFuture;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use folio::{
    application::{
        repos::ResourceRepo,
        resources::{Resource, ResourceService},
        validation::ExistenceValidator,
    },
    cache::{self, CacheAside},
    config::{self, Command, Settings},
    domain::{
        entities::{ArticleRecord, ReviewRecord},
        types::ResourceKind,
    },
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, GatewayState, RouteTable},
        telemetry,
        validator::HttpExistenceValidator,
    },
};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &InfraError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), InfraError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| InfraError::configuration(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    match cli_args.command_or_default() {
        Command::Articles(_) => run_service::<ArticleRecord>(&settings, None).await,
        Command::Reviews(_) => {
            let validator = build_validator(&settings)?;
            run_service::<ReviewRecord>(&settings, Some(validator)).await
        }
        Command::Gateway(_) => run_gateway(&settings).await,
        Command::Migrate(args) => run_migrate(&settings, args.service.kind()).await,
    }
}

async fn run_service<E>(
    settings: &Settings,
    validator: Option<Arc<dyn ExistenceValidator>>,
) -> Result<(), InfraError>
where
    E: Resource,
    PostgresRepositories: ResourceRepo<E>,
{
    let repositories = Arc::new(init_repositories(settings, E::KIND).await?);

    let backend = cache::build_backend(&settings.cache)?;
    let cache = CacheAside::<E>::new(
        backend,
        E::KIND.as_str(),
        settings.cache.default_ttl(),
        settings.cache.operation_timeout(),
    );

    let repo: Arc<dyn ResourceRepo<E>> = repositories.clone();
    let service = ResourceService::new(repo, cache, validator, settings.pagination);
    let state = ApiState::new(service).with_database(repositories);

    serve(
        E::KIND.collection(),
        settings.server.addr_for(E::KIND),
        http::build_service_router(state),
        settings.server.graceful_shutdown,
    )
    .await
}

async fn run_gateway(settings: &Settings) -> Result<(), InfraError> {
    let routes = RouteTable::from_settings(&settings.gateway.routes);
    for route in routes.routes() {
        info!(
            target = "folio::gateway",
            prefix = route.prefix(),
            upstream = %route.upstream(),
            "Registered route"
        );
    }

    let state = GatewayState::new(
        routes,
        settings.gateway.timeout,
        settings.gateway.max_body_bytes,
    )
    .map_err(|err| InfraError::configuration(format!("failed to build gateway client: {err}")))?;

    serve(
        "gateway",
        settings.server.gateway_addr,
        http::build_gateway_router(state),
        settings.server.graceful_shutdown,
    )
    .await
}

async fn run_migrate(settings: &Settings, kind: ResourceKind) -> Result<(), InfraError> {
    let pool = connect_pool(settings, kind).await?;
    PostgresRepositories::run_migrations(&pool, kind)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    info!(kind = %kind, "Applied migrations");
    Ok(())
}

fn build_validator(settings: &Settings) -> Result<Arc<dyn ExistenceValidator>, InfraError> {
    let validator = HttpExistenceValidator::new(settings.validator.timeout)
        .and_then(|validator| {
            validator.with_endpoint(
                ResourceKind::Article,
                settings.validator.article_service_url.as_str(),
            )
        })
        .map_err(|err| InfraError::configuration(err.to_string()))?;
    Ok(Arc::new(validator))
}

async fn connect_pool(settings: &Settings, kind: ResourceKind) -> Result<sqlx::PgPool, InfraError> {
    let url = settings.database.url_for(kind).ok_or_else(|| {
        InfraError::configuration(format!("no database url configured for {kind}"))
    })?;

    PostgresRepositories::connect(
        url,
        settings.database.max_connections.get(),
        settings.database.acquire_timeout,
    )
    .await
    .map_err(|err| InfraError::database(err.to_string()))
}

async fn init_repositories(
    settings: &Settings,
    kind: ResourceKind,
) -> Result<PostgresRepositories, InfraError> {
    let pool = connect_pool(settings, kind).await?;

    if settings.database.run_migrations {
        PostgresRepositories::run_migrations(&pool, kind)
            .await
            .map_err(|err| InfraError::database(err.to_string()))?;
    }

    Ok(PostgresRepositories::new(pool).with_statement_timeout(settings.database.statement_timeout))
}

/// Serve `router` until a shutdown signal arrives, then give in-flight
/// requests at most `grace` to finish.
async fn serve(
    process_name: &'static str,
    addr: SocketAddr,
    router: Router,
    grace: Duration,
) -> Result<(), InfraError> {
    let listener = TcpListener::bind(addr).await?;
    info!(process = process_name, %addr, "listening");

    let stopping = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown({
        let stopping = stopping.clone();
        async move {
            shutdown_signal().await;
            stopping.notify_one();
        }
    });

    let deadline = async {
        stopping.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server.into_future() => result?,
        () = deadline => {
            warn!(
                process = process_name,
                grace_ms = grace.as_millis(),
                "graceful shutdown timed out, dropping open connections"
            );
        }
    }

    info!(process = process_name, "stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown requested");
}
