//! Handlers for the `/accounts` resource: profile documents.
//!
//! Sign-in itself happens against the account collaborator; these
//! endpoints only sync and edit the profile document it keys.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kana_core::account::{validate_account_id, validate_sign_up, AccountIdentity, ProfileUpdate};
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::upload::UploadForm;
use crate::response::DataResponse;
use crate::state::AppState;

/// Identity reported at sign-in, plus optional sign-up overrides.
#[derive(Debug, Deserialize)]
pub struct SyncAccount {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub overrides: ProfileUpdate,
}

#[derive(Debug, Deserialize)]
pub struct SignUpCheck {
    pub password: String,
    pub confirm_password: String,
}

/// PUT /api/v1/accounts/{id}
///
/// Create the profile document on first sign-in (201); an existing one is
/// returned untouched (200).
pub async fn sync_account(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Json(input): Json<SyncAccount>,
) -> AppResult<impl IntoResponse> {
    validate_account_id(&account)?;
    let identity = AccountIdentity {
        id: account,
        email: input.email,
        display_name: input.display_name,
        photo_url: input.photo_url,
    };

    let (doc, created) = state
        .accounts
        .create_or_sync(identity, input.overrides)
        .await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: doc })))
}

/// GET /api/v1/accounts/{id}
pub async fn get_account(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_account_id(&account)?;
    let doc = state.accounts.get(&account).await?;
    Ok(Json(DataResponse { data: doc }))
}

/// PATCH /api/v1/accounts/{id}/profile
///
/// Multipart: optional `display_name` text and optional `photo` file.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(account): Path<String>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    validate_account_id(&account)?;
    let form = UploadForm::read(multipart).await?;
    let update = ProfileUpdate {
        display_name: form
            .text("display_name")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    };
    let photo = form.file("photo");

    let doc = state
        .accounts
        .update_profile(&account, update, photo.as_deref())
        .await?;
    Ok(Json(DataResponse { data: doc }))
}

/// DELETE /api/v1/accounts/{id}
pub async fn delete_account(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> AppResult<StatusCode> {
    validate_account_id(&account)?;
    state.accounts.delete_account(&account).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/accounts/sign-up/validate
///
/// Client-side form check shared with the sign-up screen.
pub async fn validate_sign_up_form(Json(input): Json<SignUpCheck>) -> AppResult<StatusCode> {
    validate_sign_up(&input.password, &input.confirm_password)?;
    Ok(StatusCode::NO_CONTENT)
}
