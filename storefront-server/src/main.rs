//! storefront-server

use anyhow::{anyhow, Result};
use axum::Router;
use axum_server::Handle;
use clap::Parser;
use http::{header, HeaderName};
use std::{
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    process::exit,
    time::Duration,
};
use storefront_server::{
    app_state::{AppState, AppStateBuilder},
    db,
    docs::ApiDoc,
    middleware::{request_ulid::MakeRequestUlid, runtime},
    router,
    settings::{AppEnvironment, Settings},
    setups::{
        local::{LocalSetup, LogNotifier, MemoryAccountStore},
        prod::{MailgunNotifier, PgAccountStore, ProdSetup},
        ServerSetup,
    },
};
use tokio::signal::{
    self,
    unix::{signal, SignalKind},
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, sensitive_headers::SetSensitiveHeadersLayer,
    timeout::TimeoutLayer, trace::TraceLayer, ServiceBuilderExt,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Request identifier field.
const REQUEST_ID: &str = "x-request-id";

/// How long in-flight requests get to finish on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Account registration, email verification and password reset service
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the settings file. Defaults to the bundled `config/settings.toml`.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (stdout_writer, _stdout_guard) = tracing_appender::non_blocking(io::stdout());

    let settings = Settings::load(cli.config)?;

    setup_tracing(stdout_writer, settings.server.environment);

    info!(
        subject = "app_settings",
        category = "init",
        "starting with settings: {:?}",
        settings,
    );

    let cancellation_token = CancellationToken::new();

    tokio::spawn({
        let cancellation_token = cancellation_token.clone();
        async move {
            capture_sigterm().await;

            cancellation_token.cancel();
            println!("\nCtrl+C received, shutting down. Press Ctrl+C again to force shutdown.");

            capture_sigterm().await;

            exit(130)
        }
    });

    match settings.server.environment {
        AppEnvironment::Local => {
            let app_state = AppStateBuilder::<LocalSetup>::default()
                .with_accounts(MemoryAccountStore::default())
                .with_notifier(LogNotifier)
                .with_token_settings(settings.tokens.clone())
                .finalize()?;

            serve_app(app_state, &settings, cancellation_token).await
        }
        _ => {
            db::migrations::run(&settings.database.url).await?;

            let db_pool =
                db::pool(&settings.database.url, settings.database.connect_timeout).await?;

            let app_state = AppStateBuilder::<ProdSetup>::default()
                .with_accounts(PgAccountStore::new(db_pool))
                .with_notifier(MailgunNotifier::new(settings.mailgun.clone()))
                .with_token_settings(settings.tokens.clone())
                .finalize()?;

            serve_app(app_state, &settings, cancellation_token).await
        }
    }
}

async fn serve_app<S: ServerSetup>(
    app_state: AppState<S>,
    settings: &Settings,
    token: CancellationToken,
) -> Result<()> {
    let req_id = HeaderName::from_static(REQUEST_ID);

    let router = router::setup_app_router(app_state)
        // Trace every request & response.
        .layer(TraceLayer::new_for_http())
        // Set and propagate "x-request-id" (as a ulid) per request.
        .layer(
            ServiceBuilder::new()
                .set_request_id(req_id.clone(), MakeRequestUlid)
                .propagate_request_id(req_id),
        )
        // Applies the `tower_http::timeout::Timeout` middleware which
        // applies a timeout to requests.
        .layer(TimeoutLayer::new(Duration::from_millis(
            settings.server.timeout_ms,
        )))
        // Catches runtime panics and converts them into
        // `500 Internal Server` responses.
        .layer(CatchPanicLayer::custom(runtime::catch_panic))
        // Mark headers as sensitive on both requests and responses.
        .layer(SetSensitiveHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
        ]))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let (handle, server) = serve("Application", router, settings.server.port).await?;

    token.cancelled().await;
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));

    server.await??;

    Ok(())
}

async fn serve(
    name: &str,
    app: Router,
    port: u16,
) -> Result<(Handle, tokio::task::JoinHandle<io::Result<()>>)> {
    let bind_addr: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    info!(
        subject = "app_start",
        category = "init",
        "{} server listening on {}",
        name,
        bind_addr
    );

    let handle = Handle::new();

    let server = tokio::spawn({
        let handle = handle.clone();
        async move {
            axum_server::bind(bind_addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    });

    handle
        .listening()
        .await
        .ok_or_else(|| anyhow!("{name} server failed to bind to {bind_addr}"))?;

    Ok((handle, server))
}

/// Captures and waits for system signals.
async fn capture_sigterm() {
    let term = async {
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await
            }
        }
    };

    tokio::select! {
        _ = signal::ctrl_c() => {},
        _ = term => {}
    };
}

/// Setup [tracing][tracing]: an env-filtered formatting layer,
/// human readable locally and JSON everywhere else.
fn setup_tracing(writer: tracing_appender::non_blocking::NonBlocking, environment: AppEnvironment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("storefront_server=info,tower_http=info"));

    let (pretty, json) = match environment {
        AppEnvironment::Local => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_target(true),
            ),
            None,
        ),
        _ => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(writer),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}
