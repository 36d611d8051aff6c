use adapter::{
    database::{connect_database_with, listener::spawn_booking_listener},
    redis::RedisClient,
};
use anyhow::{Context, Result};
use api::route::v1;
use axum::{
    http::{header, Method},
    Router,
};
use registry::AppRegistry;
use shared::config::AppConfig;
use shared::env::{which, Environment};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    bootstrap().await
}

fn init_logger() -> Result<()> {
    let log_level = match which() {
        Environment::Development => "debug",
        Environment::Production => "info",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into());

    let subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false);

    // 本番環境では JSON 形式で出力する
    match which() {
        Environment::Development => tracing_subscriber::registry()
            .with(subscriber)
            .with(env_filter)
            .try_init()?,
        Environment::Production => tracing_subscriber::registry()
            .with(subscriber.json())
            .with(env_filter)
            .try_init()?,
    }

    Ok(())
}

async fn bootstrap() -> Result<()> {
    let app_config = AppConfig::new()?;
    let port = app_config.server.port;
    let pool = connect_database_with(&app_config.database);
    let kv = Arc::new(RedisClient::new(&app_config.redis)?);

    let registry = AppRegistry::new(pool.clone(), kv, app_config);

    // テーブルの変更通知を購読し、予約の変更フィードへ流す
    let listener_task =
        spawn_booking_listener(&pool, registry.booking_notifier().feed().clone()).await?;

    let board = registry.booking_board();
    board
        .init()
        .await
        .context("Failed to load the booking board")?;

    let _auth_log = registry
        .session_service()
        .on_auth_state_change(|profile| match profile {
            Some(profile) => tracing::info!(user.id = %profile.user_id, "signed in"),
            None => tracing::info!("signed out"),
        });

    let app = Router::new()
        .merge(v1::routes())
        .layer(cors_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(registry);

    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Unexpected error happened in server")
        .inspect_err(|e| {
            tracing::error!(
                error.cause_chain = ?e,error.message = %e, "Unexpected error"
            )
        });

    board.teardown();
    listener_task.abort();
    served
}

// ブラウザのクライアントがクッキー付きで呼び出せるようにする
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error.message = %e, "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
