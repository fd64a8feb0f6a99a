//! Application state
//!
//! One repository per aggregate plus the extraction client, shared behind
//! an `Arc` and handed to handlers via axum state.

use hakobu_core::Config;
use hakobu_db::{
    AssignmentRepository, DeliveryRequestRepository, DriverProfileRepository, FileUploadRepository,
    UserRepository,
};
use hakobu_extraction::DocumentUnderstanding;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::jwt::JwtKeys;

pub struct AppState {
    pub config: Config,
    pub users: UserRepository,
    pub driver_profiles: DriverProfileRepository,
    pub deliveries: DeliveryRequestRepository,
    pub assignments: AssignmentRepository,
    pub uploads: FileUploadRepository,
    pub jwt: Arc<JwtKeys>,
    /// None when no API key is configured; extraction endpoints then refuse
    /// with a configuration error instead of the server failing to start.
    pub extraction_client: Option<Arc<dyn DocumentUnderstanding>>,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: PgPool,
        extraction_client: Option<Arc<dyn DocumentUnderstanding>>,
    ) -> Self {
        let jwt = Arc::new(JwtKeys::new(
            config.jwt_secret(),
            config.access_token_expiry_hours(),
            config.refresh_token_expiry_days(),
        ));
        AppState {
            users: UserRepository::new(pool.clone()),
            driver_profiles: DriverProfileRepository::new(pool.clone()),
            deliveries: DeliveryRequestRepository::new(pool.clone()),
            assignments: AssignmentRepository::new(pool.clone()),
            uploads: FileUploadRepository::new(pool),
            jwt,
            extraction_client,
            config,
        }
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
