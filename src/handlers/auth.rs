use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use mongodb::bson::doc;
use serde::Serialize;
use validator::Validate;

use super::{created, ok};
use crate::{
    auth::password::{hash_password, verify_password},
    db::FindSpec,
    errors::ApiError,
    middleware::{
        gate::{authorize, verify_user},
        Credentials,
    },
    models::user::{LoginDto, PublicUser, RegisterDto, User, UserRole, SUPER_ADMIN_ROLES},
    state::AppState,
};

#[derive(Serialize)]
struct AuthResponse {
    token: String,
    user: PublicUser,
}

#[derive(Serialize)]
struct UserResponse {
    user: PublicUser,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[post("/auth/register")]
pub async fn register(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    // The first account bootstraps the back-office; afterwards only super admins add users
    let has_users = !state
        .users
        .find(doc! {}, FindSpec { limit: Some(1), ..FindSpec::default() })
        .await?
        .is_empty();
    if has_users {
        authorize(&Credentials::of(&req), state.users.as_ref(), SUPER_ADMIN_ROLES).await?;
    }

    // The body is only read once the caller is known to be allowed
    let user_data: RegisterDto =
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;
    user_data.validate()?;

    let role = if has_users {
        user_data.role.unwrap_or(UserRole::Admin)
    } else {
        log::warn!("No users exist yet; registering {} as super admin", user_data.email);
        UserRole::SuperAdmin
    };
    let RegisterDto {
        email,
        password,
        name,
        ..
    } = user_data;
    let email = email.trim().to_lowercase();

    // Check if email already exists
    if state.users.find_one(doc! { "email": email.as_str() }).await?.is_some() {
        return Err(ApiError::conflict("Email already exists"));
    }

    // Hash password
    let password_hash = hash_password(password, state.bcrypt_cost).await?;

    let now = Utc::now();
    let mut new_user = User {
        id: None,
        email,
        password_hash,
        name: name.trim().to_string(),
        role,
        created_at: now,
        updated_at: now,
    };

    // Insert user
    new_user.id = Some(state.users.insert(&new_user).await?);
    log::info!("Registered {} as {:?}", new_user.email, new_user.role);

    Ok(created(UserResponse {
        user: PublicUser::from(&new_user),
    }))
}

#[post("/auth/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginDto>,
) -> Result<HttpResponse, ApiError> {
    // Validate input
    login_data.validate()?;
    let LoginDto { email, password } = login_data.into_inner();

    // Find user
    let user = state
        .users
        .find_one(doc! { "email": email.trim().to_lowercase() })
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    // Verify password
    if !verify_password(password, user.password_hash.clone()).await {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    // Generate JWT
    let token = state.tokens.issue(&user)?;
    log::info!("{} logged in", user.email);

    Ok(ok(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[get("/auth/verify")]
pub async fn verify(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let user = verify_user(&Credentials::of(&req), state.users.as_ref()).await?;
    Ok(ok(UserResponse {
        user: PublicUser::from(&user),
    }))
}

/// Tokens are stateless, so logging out only means the client drops its copy.
#[post("/auth/logout")]
pub async fn logout(req: HttpRequest) -> HttpResponse {
    if let Credentials::Valid(claims) = Credentials::of(&req) {
        log::info!("{} logged out", claims.email);
    }
    ok(MessageResponse {
        message: "Logged out successfully",
    })
}
