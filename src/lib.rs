pub mod config;
pub mod domain {
    pub mod lifecycle;
    pub mod transaction;
}
pub mod http {
    pub mod handlers {
        pub mod admin;
        pub mod ops;
        pub mod payments;
        pub mod payouts;
        pub mod refunds;
        pub mod webhooks;
    }
    pub mod middleware {
        pub mod admin_auth;
        pub mod rate_limit;
    }
}
pub mod moncash;
pub mod repo {
    pub mod notifications_repo;
    pub mod orders_repo;
    pub mod status_history_repo;
    pub mod transactions_repo;
}
pub mod service {
    pub mod expiry_sweep;
    pub mod payment_service;
    pub mod reconciliation;
}

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
    pub reconciler: service::reconciliation::Reconciler,
    pub notifications_repo: repo::notifications_repo::NotificationsRepo,
    pub moncash: Arc<dyn moncash::MoncashApi>,
    pub redis_client: redis::Client,
}
