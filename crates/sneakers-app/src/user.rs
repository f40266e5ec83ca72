use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use sneakers_dal::user::{CreateUser, User, UserRepository};
use sneakers_types::claim::ApiClaim;
use tracing::{debug, error};

use crate::{
    auth::acting_user,
    error::{ApiError, ApiResult},
    repository_from_request,
    rest_api::Message,
    state::AppState,
    validate::Valid,
};

repository_from_request!(UserRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(register, login, logout, current_user))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/register", tag = "Users", operation_id = "registerUser",
    responses((status = StatusCode::CREATED, description = "Registered new user", body = User),
        (status = StatusCode::BAD_REQUEST, description = "Invalid data or e-mail taken", body = Message))))]
pub async fn register(
    repository: UserRepository,
    Valid(Json(payload)): Valid<Json<CreateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = repository.create(payload).await?;
    debug!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/login", tag = "Users", operation_id = "login",
    responses((status = StatusCode::OK, description = "Bearer token for API", body = LoginResponse),
        (status = StatusCode::BAD_REQUEST, description = "Malformed request body", body = Message),
        (status = StatusCode::UNAUTHORIZED, description = "Invalid credentials", body = Message))))]
pub async fn login(
    State(state): State<AppState>,
    repository: UserRepository,
    credentials: Result<Json<LoginCredentials>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(credentials) = credentials?;
    let user = repository
        .check_password(&credentials.email, &credentials.password)
        .await?;
    let claim = ApiClaim::new_expired(user.id, user.name.clone());
    let access_token = state.tokens().issue(claim).map_err(|e| {
        error!("Failed to issue token: {e}");
        ApiError::Internal("Cannot issue token".to_string())
    })?;
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            user,
        }),
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/logout", tag = "Users", operation_id = "logout",
    security(("bearer" = [])),
    responses((status = StatusCode::OK, description = "Logged out", body = Message))))]
pub async fn logout(claim: ApiClaim) -> ApiResult<impl IntoResponse> {
    // token is stateless, client just forgets it
    debug!("User {} logged out", claim.sub);
    Ok((StatusCode::OK, Json(Message::new("Successfully logged out"))))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/users", tag = "Users", operation_id = "currentUser",
    security(("bearer" = [])),
    responses((status = StatusCode::OK, description = "Authenticated user", body = User),
        (status = StatusCode::UNAUTHORIZED, description = "Missing or invalid token", body = Message))))]
pub async fn current_user(
    claim: ApiClaim,
    repository: UserRepository,
) -> ApiResult<impl IntoResponse> {
    let user_id = acting_user(&claim)?;
    let user = repository.get(user_id).await.map_err(|e| match e {
        // user removed after token was issued
        sneakers_dal::Error::RecordNotFound(_) => ApiError::Unauthenticated,
        other => other.into(),
    })?;
    Ok((StatusCode::OK, Json(user)))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/users", get(current_user))
}
