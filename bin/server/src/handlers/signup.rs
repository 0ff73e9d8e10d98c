use crate::handlers::error::{bad_request, handle_server_error, not_found};
use crate::mailer::Message;
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse, Result as ActixResult};
use common::{MessageResponse, SignupRequest};
use crypto::hash_password;
use storage::{NewUser, StorageError};
use tracing::{info, warn};

const INVALID_VERIFICATION_LINK: &str = "The verification link is invalid or expired.";

/// Lowercased, trimmed email used for lookups and uniqueness
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn validate_signup(req: &SignupRequest) -> Result<(), &'static str> {
    if req.username.trim().is_empty() {
        return Err("Username is required!");
    }
    let email = req.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err("A valid email is required!"),
    }
    if req.password.is_empty() {
        return Err("Password is required!");
    }
    Ok(())
}

/// Register a user and mail them a verification link
#[post("/signup")]
pub async fn signup(
    body: web::Json<SignupRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let req = body.into_inner();
    validate_signup(&req).map_err(bad_request)?;

    let email = normalize_email(&req.email);
    info!(email = ?email, "POST /signup - Request received");

    if state
        .storage
        .find_user_by_email(&email)
        .await
        .map_err(|e| handle_server_error("Failed to look up user", e))?
        .is_some()
    {
        return Err(bad_request("Email already registered!"));
    }

    // bcrypt is deliberately slow; keep it off the async workers
    let password = req.password;
    let password_hash = web::block(move || hash_password(&password))
        .await
        .map_err(|e| handle_server_error("Password hashing task failed", e))?
        .map_err(|e| handle_server_error("Failed to hash password", e))?;

    let new_user = NewUser {
        username: req.username.trim().to_string(),
        is_ops: state.ops_emails.contains(&email),
        email,
        password_hash,
    };
    let user = match state.storage.create_user(new_user).await {
        Ok(user) => user,
        // Lost a race with a concurrent signup for the same email
        Err(e) if matches!(e.downcast_ref::<StorageError>(), Some(StorageError::EmailTaken(_))) => {
            return Err(bad_request("Email already registered!"));
        }
        Err(e) => return Err(handle_server_error("Failed to create user", e)),
    };

    let token = state.verification_tokens.issue(user.id);
    let link = state.verification_link(&token);
    state
        .mailer
        .send(&Message::verification(&state.mail_sender, &user.email, &link))
        .map_err(|e| handle_server_error("Failed to send verification email", e))?;

    info!(
        user_id = user.id,
        is_ops = user.is_ops,
        "POST /signup - User created, verification email sent"
    );

    Ok(HttpResponse::Created().json(MessageResponse::new(
        "Signup successful! Please verify your email.",
    )))
}

/// Redeem an email verification link
#[get("/verify-email/{token}")]
pub async fn verify_email(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let token = path.into_inner();

    let user_id = state.verification_tokens.verify(&token).map_err(|e| {
        warn!("GET /verify-email - {}", e);
        bad_request(INVALID_VERIFICATION_LINK)
    })?;

    let user = state
        .storage
        .get_user(user_id)
        .await
        .map_err(|e| handle_server_error("Failed to load user", e))?
        .ok_or_else(|| not_found("User not found!"))?;

    if !state
        .storage
        .mark_user_verified(user.id)
        .await
        .map_err(|e| handle_server_error("Failed to mark user verified", e))?
    {
        return Err(not_found("User not found!"));
    }

    // Marking is idempotent, so the link is spent only after it succeeds
    let first_use = state
        .redeem_link(&state.verification_tokens, &token)
        .await
        .map_err(|e| handle_server_error("Failed to record used link", e))?;
    if !first_use {
        return Err(bad_request(INVALID_VERIFICATION_LINK));
    }

    info!(user_id = user.id, "GET /verify-email - Email verified");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Email verified successfully!")))
}
