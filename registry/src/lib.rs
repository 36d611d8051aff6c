use std::sync::Arc;

use adapter::database::ConnectionPool;
use adapter::redis::RedisClient;
use adapter::repository::{
    auth::AuthRepositoryImpl, booking::BookingRepositoryImpl, health::HealthCheckRepositoryImpl,
    user::UserRepositoryImpl,
};
use chrono::{FixedOffset, Offset, Utc};
use kernel::board::BookingBoard;
use kernel::notifier::{BookingFeed, BookingNotifier};
use kernel::repository::{
    auth::AuthRepository, booking::BookingRepository, health::HealthCheckRepository,
    user::UserRepository,
};
use kernel::service::{booking::BookingService, profile::ProfileResolver, session::SessionService};
use shared::config::{AppConfig, StudioConfig};

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    booking_service: BookingService,
    session_service: SessionService,
    booking_notifier: BookingNotifier,
    booking_board: Arc<BookingBoard>,
    studio: StudioConfig,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool, redis_client: Arc<RedisClient>, app_config: AppConfig) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        let booking_repository: Arc<dyn BookingRepository> =
            Arc::new(BookingRepositoryImpl::new(pool.clone()));
        let user_repository: Arc<dyn UserRepository> =
            Arc::new(UserRepositoryImpl::new(pool.clone()));
        let auth_repository: Arc<dyn AuthRepository> = Arc::new(AuthRepositoryImpl::new(
            pool.clone(),
            redis_client.clone(),
            app_config.auth.ttl,
        ));

        let profile_resolver = ProfileResolver::new(user_repository.clone());
        let session_service =
            SessionService::new(auth_repository, user_repository, profile_resolver);
        let booking_notifier = BookingNotifier::new(BookingFeed::new(), booking_repository.clone());
        let booking_board = Arc::new(BookingBoard::new(booking_notifier.clone()));

        Self {
            health_check_repository,
            booking_service: BookingService::new(booking_repository),
            session_service,
            booking_notifier,
            booking_board,
            studio: app_config.studio,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn booking_service(&self) -> &BookingService {
        &self.booking_service
    }

    pub fn session_service(&self) -> &SessionService {
        &self.session_service
    }

    pub fn booking_notifier(&self) -> &BookingNotifier {
        &self.booking_notifier
    }

    pub fn booking_board(&self) -> Arc<BookingBoard> {
        self.booking_board.clone()
    }

    pub fn studio_config(&self) -> StudioConfig {
        self.studio
    }

    pub fn studio_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.studio.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}
