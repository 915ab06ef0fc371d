use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::session::{removal_cookie, session_cookie, session_id, CurrentUser};
use crate::domain::account::{NewAccount, Role, User};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            address: user.address,
            created_at: user.created_at,
        }
    }
}

/// POST /api/register
///
/// Creates a customer account and logs it in.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, session cookie set", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let account = NewAccount {
        name: body.name,
        email: body.email,
        password: body.password,
        phone: body.phone,
        address: body.address,
    };

    let svc = state.clone();
    let (user, session) = web::block(move || svc.accounts.register(account))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let cookie = session_cookie(&session, state.accounts.session_ttl(), state.cookie_secure);
    Ok(HttpResponse::Created()
        .cookie(cookie)
        .json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = UserResponse),
        (status = 401, description = "Invalid email or password"),
    ),
    tag = "auth"
)]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = body.into_inner();

    let svc = state.clone();
    let (user, session) = web::block(move || svc.accounts.login(&email, &password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let cookie = session_cookie(&session, state.accounts.session_ttl(), state.cookie_secure);
    Ok(HttpResponse::Ok().cookie(cookie).json(UserResponse::from(user)))
}

/// Succeeds whether or not a session was present.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 200, description = "Session ended")),
    tag = "auth"
)]
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    if let Some(id) = session_id(&req) {
        let svc = state.clone();
        web::block(move || svc.accounts.logout(id))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;
    }
    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(state.cookie_secure))
        .finish())
}

#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "The logged-in user", body = UserResponse),
        (status = 401, description = "Not logged in"),
    ),
    tag = "auth"
)]
pub async fn current_user(user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(user.0))
}
