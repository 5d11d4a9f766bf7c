use afepanou_payments::config::AppConfig;
use afepanou_payments::moncash::client::MoncashClient;
use afepanou_payments::repo::notifications_repo::NotificationsRepo;
use afepanou_payments::repo::orders_repo::OrdersRepo;
use afepanou_payments::repo::status_history_repo::StatusHistoryRepo;
use afepanou_payments::repo::transactions_repo::TransactionsRepo;
use afepanou_payments::service::expiry_sweep::ExpirySweep;
use afepanou_payments::service::payment_service::PaymentService;
use afepanou_payments::service::reconciliation::Reconciler;
use afepanou_payments::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;
    let moncash: Arc<dyn afepanou_payments::moncash::MoncashApi> =
        Arc::new(MoncashClient::new(&cfg.moncash));

    let transactions_repo = TransactionsRepo { pool: pool.clone() };
    let orders_repo = OrdersRepo { pool: pool.clone() };
    let history_repo = StatusHistoryRepo { pool: pool.clone() };
    let notifications_repo = NotificationsRepo { pool: pool.clone() };

    let reconciler = Reconciler {
        transactions_repo: transactions_repo.clone(),
        history_repo: history_repo.clone(),
        notifications_repo: notifications_repo.clone(),
        orders_repo: orders_repo.clone(),
        moncash: moncash.clone(),
    };

    let payment_service = PaymentService {
        pool: pool.clone(),
        transactions_repo: transactions_repo.clone(),
        orders_repo,
        history_repo: history_repo.clone(),
        reconciler: reconciler.clone(),
        moncash: moncash.clone(),
    };

    let sweep = ExpirySweep {
        transactions_repo,
        history_repo,
        interval: std::time::Duration::from_secs(cfg.expiry_sweep_interval_secs),
    };
    tokio::spawn(sweep.run());

    let state = AppState {
        payment_service,
        reconciler,
        notifications_repo,
        moncash,
        redis_client: redis::Client::open(cfg.redis_url.clone())?,
    };

    let admin_key = cfg.internal_api_key.clone();
    let admin_routes = Router::new()
        .route(
            "/admin/payouts",
            post(afepanou_payments::http::handlers::payouts::create_payout),
        )
        .route(
            "/admin/payouts/:id",
            get(afepanou_payments::http::handlers::payouts::payout_status),
        )
        .route(
            "/admin/refunds",
            post(afepanou_payments::http::handlers::refunds::create_refund),
        )
        .route(
            "/admin/balance",
            get(afepanou_payments::http::handlers::admin::balance),
        )
        .route(
            "/admin/customers/:account/status",
            get(afepanou_payments::http::handlers::admin::customer_status),
        )
        .route(
            "/admin/analytics",
            get(afepanou_payments::http::handlers::admin::analytics),
        )
        .route(
            "/admin/notifications/unprocessed",
            get(afepanou_payments::http::handlers::admin::unprocessed_notifications),
        )
        .layer(from_fn_with_state(
            admin_key,
            afepanou_payments::http::middleware::admin_auth::require_internal_api_key,
        ));

    let app = Router::new()
        .route("/health", get(afepanou_payments::http::handlers::payments::health))
        .route(
            "/payments/moncash",
            post(afepanou_payments::http::handlers::payments::create_payment),
        )
        .route(
            "/payments/moncash/status",
            post(afepanou_payments::http::handlers::payments::check_status),
        )
        .route(
            "/payments/moncash/callback",
            post(afepanou_payments::http::handlers::webhooks::moncash_callback),
        )
        .route(
            "/payments/transactions",
            get(afepanou_payments::http::handlers::payments::list_transactions),
        )
        .route(
            "/payments/transactions/:id",
            get(afepanou_payments::http::handlers::payments::get_transaction),
        )
        .route(
            "/payments/transactions/:id/history",
            get(afepanou_payments::http::handlers::payments::get_transaction_history),
        )
        .route(
            "/payments/transactions/:id/retry",
            post(afepanou_payments::http::handlers::payments::retry_transaction),
        )
        .route("/ops/readiness", get(afepanou_payments::http::handlers::ops::readiness))
        .route("/ops/liveness", get(afepanou_payments::http::handlers::ops::liveness))
        .merge(admin_routes)
        .layer(from_fn_with_state(
            afepanou_payments::http::middleware::rate_limit::RateLimitState {
                redis_client: redis::Client::open(cfg.redis_url.clone())?,
                max_per_minute: 120,
                webhook_max_per_minute: 600,
            },
            afepanou_payments::http::middleware::rate_limit::enforce,
        ))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
