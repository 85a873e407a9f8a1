//! Handlers for share agreements and share requests.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use gradeshare_core::error::CoreError;
use gradeshare_core::types::DbId;
use gradeshare_events::ShareRequested;
use gradeshare_pipeline::ServiceError;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `PUT /users/{uid}/share-agreement`.
#[derive(Debug, Deserialize)]
pub struct SignRequest {
    /// `true` to sign, `false` to cancel.
    pub wants_to_sign: bool,
}

#[derive(Debug, Serialize)]
pub struct SignStatus {
    pub uid: DbId,
    pub is_signed: bool,
}

/// Body of `POST /users/{uid}/grade-shares`: the campus login the crawl
/// service uses.
#[derive(Deserialize, Validate)]
pub struct ShareGradesRequest {
    #[validate(length(min = 1, max = 64))]
    pub credential_id: String,
    #[validate(length(min = 1, max = 256))]
    pub credential_secret: String,
}

#[derive(Debug, Serialize)]
pub struct ShareAccepted {
    pub message_id: DbId,
}

/// GET /api/v1/users/{uid}/share-agreement
pub async fn get_status(
    State(state): State<AppState>,
    Path(uid): Path<DbId>,
) -> AppResult<Json<DataResponse<SignStatus>>> {
    let is_signed = state.service.is_signed(uid).await?;
    Ok(Json(DataResponse {
        data: SignStatus { uid, is_signed },
    }))
}

/// PUT /api/v1/users/{uid}/share-agreement
///
/// 409 when the agreement is already in the requested state.
pub async fn sign(
    State(state): State<AppState>,
    Path(uid): Path<DbId>,
    Json(body): Json<SignRequest>,
) -> AppResult<StatusCode> {
    state.service.sign_for_sharing(uid, body.wants_to_sign).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/users/{uid}/grade-shares
///
/// Accepts a share request for the worker. Fails with 412 and publishes
/// nothing when the user has not signed.
pub async fn request_share(
    State(state): State<AppState>,
    Path(uid): Path<DbId>,
    Json(body): Json<ShareGradesRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ShareAccepted>>)> {
    body.validate().map_err(CoreError::from)?;

    if !state.service.is_signed(uid).await? {
        return Err(ServiceError::NotSigned.into());
    }

    let event = ShareRequested {
        uid,
        credential_id: body.credential_id,
        credential_secret: body.credential_secret,
    };
    let message_id = state.publisher.publish(&event).await?;
    tracing::info!(uid, message_id, "Share request accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: ShareAccepted { message_id },
        }),
    ))
}
