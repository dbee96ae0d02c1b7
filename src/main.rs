use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::MatchedPath;
use dotenvy::dotenv;
use http::HeaderValue;
use tokio::sync::watch;
use tokio::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use usermgmt::bootstrap::app_context::{AppContext, AppServices};
use usermgmt::bootstrap::config::Config;
use usermgmt::infrastructure::db::repositories::lifecycle_alerts_sqlx::SqlxLifecycleAlerts;
use usermgmt::infrastructure::db::repositories::role_repository_sqlx::SqlxRoleRepository;
use usermgmt::infrastructure::db::repositories::score_sync_queue_sqlx::SqlxScoreSyncQueue;
use usermgmt::infrastructure::db::repositories::title_repository_sqlx::SqlxTitleRepository;
use usermgmt::infrastructure::db::repositories::user_repository_sqlx::SqlxUserRepository;
use usermgmt::infrastructure::scoring::score_gateway_reqwest::ReqwestScoreGateway;
use usermgmt::infrastructure::scoring::sync_worker::{ScoreSyncWorker, ScoreSyncWorkerConfig};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            usermgmt::presentation::http::auth::login,
            usermgmt::presentation::http::auth::logout,
            usermgmt::presentation::http::auth::me,
            usermgmt::presentation::http::users::signup,
            usermgmt::presentation::http::users::create_user,
            usermgmt::presentation::http::users::list_users,
            usermgmt::presentation::http::users::get_user,
            usermgmt::presentation::http::users::get_user_by_email,
            usermgmt::presentation::http::users::update_user,
            usermgmt::presentation::http::users::delete_user,
            usermgmt::presentation::http::users::delete_user_by_email,
            usermgmt::presentation::http::users::freeze_user,
            usermgmt::presentation::http::users::unfreeze_user,
            usermgmt::presentation::http::users::reset_password,
            usermgmt::presentation::http::users::assign_manager,
            usermgmt::presentation::http::users::assign_title,
            usermgmt::presentation::http::users::assign_role,
            usermgmt::presentation::http::users::get_manager,
            usermgmt::presentation::http::users::list_managed_users,
            usermgmt::presentation::http::health::health,
        ),
        components(schemas(
            usermgmt::presentation::http::auth::LoginRequest,
            usermgmt::presentation::http::auth::LoginResponse,
            usermgmt::presentation::http::users::UserResponse,
            usermgmt::presentation::http::users::UserPageResponse,
            usermgmt::presentation::http::users::SignupRequest,
            usermgmt::presentation::http::users::CreateUserRequest,
            usermgmt::presentation::http::users::UpdateUserRequest,
            usermgmt::presentation::http::users::ResetPasswordRequest,
            usermgmt::presentation::http::users::AssignManagerRequest,
            usermgmt::presentation::http::users::AssignTitleRequest,
            usermgmt::presentation::http::users::AssignRoleRequest,
            usermgmt::presentation::http::users::ManagerResponse,
            usermgmt::presentation::http::health::HealthResp,
        )),
        tags(
            (name = "Auth", description = "Authentication"),
            (name = "Users", description = "User directory and lifecycle"),
            (name = "Health", description = "System health checks")
        )
    )]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "usermgmt=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(
        api_port = cfg.api_port,
        score_service_url = %cfg.score_service_url,
        deprovision_policy = ?cfg.deprovision_policy,
        score_retry_enabled = cfg.score_retry_enabled,
        "Starting user management service"
    );

    // Database
    let pool =
        usermgmt::infrastructure::db::connect_pool(&cfg.database_url, cfg.database_max_connections)
            .await?;
    usermgmt::infrastructure::db::migrate(&pool).await?;

    let user_repo = Arc::new(SqlxUserRepository::new(pool.clone()));
    let role_repo = Arc::new(SqlxRoleRepository::new(pool.clone()));
    let title_repo = Arc::new(SqlxTitleRepository::new(pool.clone()));
    let score_queue = Arc::new(SqlxScoreSyncQueue::new(pool.clone()));
    let lifecycle_alerts = Arc::new(SqlxLifecycleAlerts::new(pool.clone()));
    let score_gateway = Arc::new(ReqwestScoreGateway::new(
        &cfg.score_service_url,
        cfg.score_service_timeout(),
    )?);

    let services = AppServices::new(
        user_repo.clone(),
        role_repo,
        title_repo,
        score_gateway.clone(),
        score_queue.clone(),
        lifecycle_alerts.clone(),
    );
    let ctx = AppContext::new(cfg.clone(), services);

    // Build CORS
    let methods = [
        http::Method::GET,
        http::Method::POST,
        http::Method::PUT,
        http::Method::DELETE,
        http::Method::OPTIONS,
    ];
    let headers = [http::header::CONTENT_TYPE, http::header::AUTHORIZATION];
    let cors = match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(v)) => CorsLayer::new()
            .allow_origin(v)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true),
        // In production, FRONTEND_URL is mandatory (enforced by Config), deny all otherwise
        _ if cfg.is_production => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(HeaderValue::from_static(
                "http://invalid",
            )))
            .allow_methods(methods)
            .allow_headers(headers),
        // Development convenience
        _ => CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true),
    };

    // Build API router
    let app = Router::new()
        .nest(
            "/api",
            usermgmt::presentation::http::health::routes(pool.clone()),
        )
        .nest(
            "/api",
            usermgmt::presentation::http::users::routes(ctx.clone()),
        )
        .nest(
            "/api/auth",
            usermgmt::presentation::http::auth::routes(ctx.clone()),
        )
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    // Background score sync retries
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = if cfg.score_retry_enabled {
        let worker = ScoreSyncWorker {
            users: user_repo,
            gateway: score_gateway,
            queue: score_queue,
            alerts: lifecycle_alerts,
            retry: cfg.score_retry_policy(),
            config: ScoreSyncWorkerConfig {
                poll_interval: Duration::from_secs(cfg.score_retry_poll_secs.max(1)),
                batch_size: cfg.score_retry_batch_size.max(1),
                lease: Duration::from_secs(cfg.score_retry_lease_secs.max(1)),
            },
        };
        Some(worker.spawn(shutdown_rx))
    } else {
        tracing::info!("score_sync_retry_disabled");
        None
    };

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = &served {
        error!(?e, "API server failed");
    }

    let _ = shutdown_tx.send(true);
    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            error!(?e, "Score sync worker panicked");
        }
    }
    served?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(?e, "Failed to listen for shutdown signal"),
    }
}
