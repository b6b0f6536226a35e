use chrono::Duration;
use skybook_booking::{BookingEngine, CancellationEngine, FlightLifecycleManager, SeatMapResolver, TicketLookup};
use skybook_core::events::EventSink;
use skybook_core::identity::CredentialVerifier;
use skybook_store::app_config::BookingRules;
use skybook_store::{DbClient, RedisClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    /// `None` disables rate limiting.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
    pub rate_limit_per_minute: i64,
    pub booking: BookingEngine,
    pub cancellation: CancellationEngine,
    pub lifecycle: FlightLifecycleManager,
    pub seats: SeatMapResolver,
    pub lookup: TicketLookup,
}

impl AppState {
    pub fn new(
        db: DbClient,
        events: Arc<dyn EventSink>,
        verifier: Arc<dyn CredentialVerifier>,
        redis: Option<Arc<RedisClient>>,
        auth: AuthConfig,
        rules: &BookingRules,
    ) -> Self {
        Self {
            redis,
            auth,
            rate_limit_per_minute: rules.rate_limit_per_minute,
            booking: BookingEngine::new(db.clone(), events.clone(), rules.max_group_size),
            cancellation: CancellationEngine::new(db.clone(), events.clone(), verifier),
            lifecycle: FlightLifecycleManager::new(
                db.clone(),
                events,
                Duration::minutes(rules.deadline_extension_minutes),
            ),
            seats: SeatMapResolver::new(db.clone()),
            lookup: TicketLookup::new(db),
        }
    }
}
