//! Authentication extractors and session hooks.
//!
//! Account identity is established by the authentication collaborator and
//! kept in the session under [`session_keys::CURRENT_ACCOUNT`]. Handlers read
//! it through [`RequireAuth`] or [`OptionalAuth`].

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::db::Database;
use crate::models::{CurrentAccount, session_keys};
use crate::services::{CartService, CommerceError, GuestCart};

/// Extractor that requires a signed-in account.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(account): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, account {}!", account.id)
/// }
/// ```
pub struct RequireAuth(pub CurrentAccount);

/// Error returned when authentication is required but nobody is signed in.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized", "message": "Sign in required" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection)?;

        let account: CurrentAccount = session
            .get(session_keys::CURRENT_ACCOUNT)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        Ok(Self(account))
    }
}

/// Extractor that optionally gets the current account.
///
/// Unlike `RequireAuth`, this does not reject the request for guests.
pub struct OptionalAuth(pub Option<CurrentAccount>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(account))
    }
}

/// Sign an account into the session.
///
/// Folds the visitor's guest cart into the account cart first, then
/// rotates the session ID and stores the account.
///
/// # Errors
///
/// Returns an error if the carts cannot be merged or the session cannot be
/// modified.
pub async fn set_current_account<D: Database>(
    db: &D,
    session: &Session,
    account: CurrentAccount,
) -> Result<(), CommerceError> {
    CartService::new(db)
        .merge_on_login(&GuestCart::new(session.clone()), account.id)
        .await?;

    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_ACCOUNT, account)
        .await?;
    Ok(())
}

/// Sign the current account out of the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_account(session: &Session) -> Result<(), CommerceError> {
    session
        .remove::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
        .await?;
    Ok(())
}
