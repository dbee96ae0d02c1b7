use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::ports::lifecycle_alerts::LifecycleAlerts;
use crate::application::ports::score_gateway::ScoreGateway;
use crate::application::ports::score_sync_queue::ScoreSyncQueue;
use crate::application::services::score_sync::{ScoreRetryPolicy, ScoreSync};
use crate::application::use_cases::users::assign::{AssignManager, AssignRole, AssignTitle};
use crate::application::use_cases::users::deprovision::DeprovisionUser;
use crate::application::use_cases::users::freeze::SetFrozen;
use crate::application::use_cases::users::get_user::GetUser;
use crate::application::use_cases::users::list_users::{ListManagedUsers, ListUsers};
use crate::application::use_cases::users::provision::{ProvisionRequest, ProvisionUser};
use crate::application::use_cases::users::reset_password::ResetPassword;
use crate::application::use_cases::users::update_user::{ProfileUpdate, UpdateUser};
use crate::bootstrap::app_context::AppContext;
use crate::domain::users::user::{Page, User};
use crate::presentation::http::error::into_status;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub frozen: bool,
    pub manager_id: Option<Uuid>,
    pub title_id: Option<Uuid>,
    pub roles: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone: u.phone,
            frozen: u.frozen,
            manager_id: u.manager_id,
            title_id: u.title_id,
            roles: u.roles.into_iter().map(|r| r.name).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserPageResponse {
    pub items: Vec<UserResponse>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl From<Page<User>> for UserPageResponse {
    fn from(p: Page<User>) -> Self {
        let total_pages = p.total_pages();
        UserPageResponse {
            items: p.items.into_iter().map(Into::into).collect(),
            page: p.page,
            size: p.size,
            total: p.total,
            total_pages,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub phone: Option<String>,
    pub manager_id: Option<Uuid>,
    pub title_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub manager_id: Option<Uuid>,
    pub title_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignManagerRequest {
    pub user_email: String,
    pub manager_email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTitleRequest {
    pub title_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    pub role_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ManagerResponse {
    pub manager_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// Owned score sync collaborators for one request.
struct ScoreHandles {
    gateway: Arc<dyn ScoreGateway>,
    queue: Arc<dyn ScoreSyncQueue>,
    alerts: Arc<dyn LifecycleAlerts>,
    retry: ScoreRetryPolicy,
}

impl ScoreHandles {
    fn from_ctx(ctx: &AppContext) -> Self {
        ScoreHandles {
            gateway: ctx.score_gateway(),
            queue: ctx.score_queue(),
            alerts: ctx.lifecycle_alerts(),
            retry: ctx.score_retry_policy(),
        }
    }

    fn score_sync(&self) -> ScoreSync<'_> {
        ScoreSync {
            gateway: self.gateway.as_ref(),
            queue: self.queue.as_ref(),
            alerts: self.alerts.as_ref(),
            retry: &self.retry,
        }
    }
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/signup", post(signup))
        .route("/users/assign-manager", post(assign_manager))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/manager", get(get_manager))
        .route("/users/:id/managed", get(list_managed_users))
        .route(
            "/users/by-email/:email",
            get(get_user_by_email).delete(delete_user_by_email),
        )
        .route("/users/by-email/:email/freeze", post(freeze_user))
        .route("/users/by-email/:email/unfreeze", post(unfreeze_user))
        .route("/users/by-email/:email/reset-password", post(reset_password))
        .route("/users/by-email/:email/title", post(assign_title))
        .route("/users/by-email/:email/roles", post(assign_role))
        .with_state(ctx)
}

async fn provision(ctx: &AppContext, req: ProvisionRequest) -> Result<UserResponse, StatusCode> {
    let users = ctx.user_repo();
    let roles = ctx.role_repo();
    let titles = ctx.title_repo();
    let score = ScoreHandles::from_ctx(ctx);
    let uc = ProvisionUser {
        users: users.as_ref(),
        roles: roles.as_ref(),
        titles: titles.as_ref(),
        score_sync: score.score_sync(),
        default_role: &ctx.cfg.default_role,
    };
    let user = uc.execute(&req).await.map_err(into_status)?;
    Ok(user.into())
}

#[utoipa::path(post, path = "/api/users/signup", tag = "Users", request_body = SignupRequest, responses(
    (status = 201, body = UserResponse),
    (status = 409, description = "Email already registered")
))]
pub async fn signup(
    State(ctx): State<AppContext>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), StatusCode> {
    let dto = ProvisionRequest {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        password: req.password,
        phone: req.phone,
        manager_id: None,
        title_id: None,
    };
    let user = provision(&ctx, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(post, path = "/api/users", tag = "Users", request_body = CreateUserRequest, responses(
    (status = 201, body = UserResponse),
    (status = 404, description = "Manager or title not found"),
    (status = 409, description = "Email already registered")
))]
pub async fn create_user(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), StatusCode> {
    let dto = ProvisionRequest {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        password: req.password,
        phone: req.phone,
        manager_id: req.manager_id,
        title_id: req.title_id,
    };
    let user = provision(&ctx, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(get, path = "/api/users", tag = "Users",
    params(
        ("page" = Option<u32>, Query, description = "Zero-based page index"),
        ("size" = Option<u32>, Query, description = "Page size")
    ),
    responses((status = 200, body = UserPageResponse), (status = 404, description = "Page is empty")))]
pub async fn list_users(
    State(ctx): State<AppContext>,
    q: Option<Query<ListUsersQuery>>,
) -> Result<Json<UserPageResponse>, StatusCode> {
    let (page, size) = q.map(|Query(v)| (v.page, v.size)).unwrap_or((None, None));
    let page = page.unwrap_or(0);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let repo = ctx.user_repo();
    let uc = ListUsers {
        repo: repo.as_ref(),
    };
    let result = uc.execute(page, size).await.map_err(into_status)?;
    Ok(Json(result.into()))
}

#[utoipa::path(get, path = "/api/users/{id}", tag = "Users",
    params(("id" = Uuid, Path, description = "User ID"),),
    responses((status = 200, body = UserResponse), (status = 404)))]
pub async fn get_user(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, StatusCode> {
    let repo = ctx.user_repo();
    let uc = GetUser {
        repo: repo.as_ref(),
    };
    let user = uc.by_id(id).await.map_err(into_status)?;
    Ok(Json(user.into()))
}

#[utoipa::path(get, path = "/api/users/by-email/{email}", tag = "Users",
    params(("email" = String, Path, description = "User email"),),
    responses((status = 200, body = UserResponse), (status = 404)))]
pub async fn get_user_by_email(
    State(ctx): State<AppContext>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, StatusCode> {
    let repo = ctx.user_repo();
    let uc = GetUser {
        repo: repo.as_ref(),
    };
    let user = uc.by_email(&email).await.map_err(into_status)?;
    Ok(Json(user.into()))
}

#[utoipa::path(put, path = "/api/users/{id}", tag = "Users", request_body = UpdateUserRequest,
    params(("id" = Uuid, Path, description = "User ID"),),
    responses((status = 200, body = UserResponse), (status = 404), (status = 409)))]
pub async fn update_user(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, StatusCode> {
    let users = ctx.user_repo();
    let titles = ctx.title_repo();
    let uc = UpdateUser {
        users: users.as_ref(),
        titles: titles.as_ref(),
    };
    let update = ProfileUpdate {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        manager_id: req.manager_id,
        title_id: req.title_id,
    };
    let user = uc.execute(id, &update).await.map_err(into_status)?;
    Ok(Json(user.into()))
}

#[utoipa::path(delete, path = "/api/users/{id}", tag = "Users",
    params(("id" = Uuid, Path, description = "User ID"),),
    responses(
        (status = 204),
        (status = 404),
        (status = 502, description = "Scoring service refused the removal"),
        (status = 503, description = "Scoring service unreachable")
    ))]
pub async fn delete_user(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let users = ctx.user_repo();
    let score = ScoreHandles::from_ctx(&ctx);
    let uc = DeprovisionUser {
        users: users.as_ref(),
        score_sync: score.score_sync(),
        policy: ctx.cfg.deprovision_policy,
    };
    uc.execute(id).await.map_err(into_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(delete, path = "/api/users/by-email/{email}", tag = "Users",
    params(("email" = String, Path, description = "User email"),),
    responses((status = 204), (status = 404), (status = 502), (status = 503)))]
pub async fn delete_user_by_email(
    State(ctx): State<AppContext>,
    Path(email): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let users = ctx.user_repo();
    let score = ScoreHandles::from_ctx(&ctx);
    let uc = DeprovisionUser {
        users: users.as_ref(),
        score_sync: score.score_sync(),
        policy: ctx.cfg.deprovision_policy,
    };
    uc.execute_by_email(&email).await.map_err(into_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/users/by-email/{email}/freeze", tag = "Users",
    params(("email" = String, Path, description = "User email"),),
    responses((status = 200, body = UserResponse), (status = 404)))]
pub async fn freeze_user(
    State(ctx): State<AppContext>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, StatusCode> {
    let users = ctx.user_repo();
    let uc = SetFrozen {
        users: users.as_ref(),
    };
    let user = uc.freeze(&email).await.map_err(into_status)?;
    Ok(Json(user.into()))
}

#[utoipa::path(post, path = "/api/users/by-email/{email}/unfreeze", tag = "Users",
    params(("email" = String, Path, description = "User email"),),
    responses((status = 200, body = UserResponse), (status = 404)))]
pub async fn unfreeze_user(
    State(ctx): State<AppContext>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, StatusCode> {
    let users = ctx.user_repo();
    let uc = SetFrozen {
        users: users.as_ref(),
    };
    let user = uc.unfreeze(&email).await.map_err(into_status)?;
    Ok(Json(user.into()))
}

#[utoipa::path(post, path = "/api/users/by-email/{email}/reset-password", tag = "Users",
    request_body = ResetPasswordRequest,
    params(("email" = String, Path, description = "User email"),),
    responses((status = 204), (status = 404)))]
pub async fn reset_password(
    State(ctx): State<AppContext>,
    Path(email): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<StatusCode, StatusCode> {
    let users = ctx.user_repo();
    let uc = ResetPassword {
        users: users.as_ref(),
    };
    uc.execute(&email, &req.password)
        .await
        .map_err(into_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/users/assign-manager", tag = "Users", request_body = AssignManagerRequest,
    responses((status = 204), (status = 404, description = "User or manager not found")))]
pub async fn assign_manager(
    State(ctx): State<AppContext>,
    Json(req): Json<AssignManagerRequest>,
) -> Result<StatusCode, StatusCode> {
    let users = ctx.user_repo();
    let uc = AssignManager {
        users: users.as_ref(),
    };
    uc.execute(&req.user_email, &req.manager_email)
        .await
        .map_err(into_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/users/by-email/{email}/title", tag = "Users", request_body = AssignTitleRequest,
    params(("email" = String, Path, description = "User email"),),
    responses((status = 204), (status = 404, description = "User or title not found")))]
pub async fn assign_title(
    State(ctx): State<AppContext>,
    Path(email): Path<String>,
    Json(req): Json<AssignTitleRequest>,
) -> Result<StatusCode, StatusCode> {
    let users = ctx.user_repo();
    let titles = ctx.title_repo();
    let uc = AssignTitle {
        users: users.as_ref(),
        titles: titles.as_ref(),
    };
    uc.execute(&email, req.title_id)
        .await
        .map_err(into_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/users/by-email/{email}/roles", tag = "Users", request_body = AssignRoleRequest,
    params(("email" = String, Path, description = "User email"),),
    responses((status = 200, body = UserResponse), (status = 404, description = "User or role not found")))]
pub async fn assign_role(
    State(ctx): State<AppContext>,
    Path(email): Path<String>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<UserResponse>, StatusCode> {
    let users = ctx.user_repo();
    let roles = ctx.role_repo();
    let uc = AssignRole {
        users: users.as_ref(),
        roles: roles.as_ref(),
    };
    let user = uc
        .execute(&email, req.role_id)
        .await
        .map_err(into_status)?;
    Ok(Json(user.into()))
}

#[utoipa::path(get, path = "/api/users/{id}/manager", tag = "Users",
    params(("id" = Uuid, Path, description = "User ID"),),
    responses((status = 200, body = ManagerResponse), (status = 404, description = "User missing or has no manager")))]
pub async fn get_manager(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ManagerResponse>, StatusCode> {
    let repo = ctx.user_repo();
    let uc = GetUser {
        repo: repo.as_ref(),
    };
    let manager_id = uc.manager_of(id).await.map_err(into_status)?;
    Ok(Json(ManagerResponse { manager_id }))
}

#[utoipa::path(get, path = "/api/users/{id}/managed", tag = "Users",
    params(("id" = Uuid, Path, description = "Manager user ID"),),
    responses((status = 200, body = [UserResponse])))]
pub async fn list_managed_users(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<UserResponse>>, StatusCode> {
    let repo = ctx.user_repo();
    let uc = ListManagedUsers {
        repo: repo.as_ref(),
    };
    let users = uc.execute(id).await.map_err(into_status)?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}
