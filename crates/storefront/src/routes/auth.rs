//! Session sign-out.
//!
//! Signing in belongs to the authentication collaborator, which calls
//! [`set_current_account`](crate::middleware::set_current_account).

use axum::http::StatusCode;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{OptionalAuth, clear_current_account};
use crate::services::CommerceError;

/// Sign out and drop the session.
#[instrument(skip(auth, session), fields(account_id = ?auth.0.as_ref().map(|a| a.id)))]
pub async fn logout(auth: OptionalAuth, session: Session) -> Result<StatusCode> {
    clear_current_account(&session).await?;
    session.flush().await.map_err(CommerceError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
