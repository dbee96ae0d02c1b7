use std::sync::Arc;

use crate::application::ports::lifecycle_alerts::LifecycleAlerts;
use crate::application::ports::role_repository::RoleRepository;
use crate::application::ports::score_gateway::ScoreGateway;
use crate::application::ports::score_sync_queue::ScoreSyncQueue;
use crate::application::ports::title_repository::TitleRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::application::services::score_sync::ScoreRetryPolicy;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    user_repo: Arc<dyn UserRepository>,
    role_repo: Arc<dyn RoleRepository>,
    title_repo: Arc<dyn TitleRepository>,
    score_gateway: Arc<dyn ScoreGateway>,
    score_queue: Arc<dyn ScoreSyncQueue>,
    lifecycle_alerts: Arc<dyn LifecycleAlerts>,
}

impl AppServices {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        role_repo: Arc<dyn RoleRepository>,
        title_repo: Arc<dyn TitleRepository>,
        score_gateway: Arc<dyn ScoreGateway>,
        score_queue: Arc<dyn ScoreSyncQueue>,
        lifecycle_alerts: Arc<dyn LifecycleAlerts>,
    ) -> Self {
        Self {
            user_repo,
            role_repo,
            title_repo,
            score_gateway,
            score_queue,
            lifecycle_alerts,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn user_repo(&self) -> Arc<dyn UserRepository> {
        self.services.user_repo.clone()
    }

    pub fn role_repo(&self) -> Arc<dyn RoleRepository> {
        self.services.role_repo.clone()
    }

    pub fn title_repo(&self) -> Arc<dyn TitleRepository> {
        self.services.title_repo.clone()
    }

    pub fn score_gateway(&self) -> Arc<dyn ScoreGateway> {
        self.services.score_gateway.clone()
    }

    pub fn score_queue(&self) -> Arc<dyn ScoreSyncQueue> {
        self.services.score_queue.clone()
    }

    pub fn lifecycle_alerts(&self) -> Arc<dyn LifecycleAlerts> {
        self.services.lifecycle_alerts.clone()
    }

    pub fn score_retry_policy(&self) -> ScoreRetryPolicy {
        self.cfg.score_retry_policy()
    }
}
