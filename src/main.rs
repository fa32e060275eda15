use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use billing_bridge::adapters::auth::{JwtConfig, JwtSessionValidator};
use billing_bridge::adapters::http::{billing_router, BillingAppState};
use billing_bridge::adapters::postgres::PostgresRecordStore;
use billing_bridge::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use billing_bridge::application::handlers::billing::SessionUrls;
use billing_bridge::config::{AppConfig, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!().run(&pool).await?;
        info!("Migrations applied");
    }

    let payment = &config.payment;
    let stripe = StripeConfig::new(
        payment.stripe_api_key.clone(),
        payment.stripe_webhook_secret.clone(),
    )
    .with_base_url(payment.api_base_url.clone())
    .with_webhook_tolerance(payment.webhook_tolerance_secs);

    let mut jwt = JwtConfig::new(config.auth.jwt_secret.clone());
    if let Some(issuer) = &config.auth.issuer {
        jwt = jwt.with_issuer(issuer.clone());
    }

    let state = BillingAppState {
        record_store: Arc::new(PostgresRecordStore::new(pool)),
        payment_provider: Arc::new(StripePaymentAdapter::new(stripe)),
        session_validator: Arc::new(JwtSessionValidator::new(jwt)),
        urls: SessionUrls {
            success_url: payment.success_url.clone(),
            cancel_url: payment.cancel_url.clone(),
            billing_return_url: payment.billing_return_url.clone(),
        },
    };

    let app = billing_router(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.server.socket_addr()?).await?;
    info!(
        addr = %listener.local_addr()?,
        test_mode = payment.is_test_mode(),
        "Billing bridge listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(fmt::layer().json()).try_init().ok();
    } else {
        registry.with(fmt::layer()).try_init().ok();
    }
}
