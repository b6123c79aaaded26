use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::error::{ApiError, ApiResult, AppJson};
use crate::state::AppState;

use super::dto::{CreatePonyRequest, PonySummary, UpdatePonyRequest, UploadResponse};
use super::repo::{self, Pony};
use super::services;

// Headroom over the 2 MB object limit for multipart framing; the real
// ceiling is enforced in services::process_upload.
const UPLOAD_BODY_LIMIT: usize = 3 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ponies", get(list).post(create))
        .route(
            "/ponies/upload",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/ponies/:id", get(get_by_id).put(update).delete(remove))
}

/// Unknown and malformed ids both read as "no such record".
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("Pony #{raw} not found")))
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
) -> ApiResult<Json<Vec<PonySummary>>> {
    let ponies = repo::list(&state.db).await?;
    let items = ponies.into_iter().map(PonySummary::from).collect();
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    AppJson(payload): AppJson<CreatePonyRequest>,
) -> ApiResult<(StatusCode, Json<Pony>)> {
    let fields = payload.into_new_pony()?;
    let pony = repo::create(&state.db, fields).await?;

    info!(pony_id = %pony.id, name = %pony.name, "pony created");
    Ok((StatusCode::CREATED, Json(pony)))
}

#[instrument(skip(state))]
pub async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Pony>> {
    let id = parse_id(&id)?;
    let pony = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Pony #{id} not found")))?;
    Ok(Json(pony))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdatePonyRequest>,
) -> ApiResult<Json<Pony>> {
    let id = parse_id(&id)?;
    let mut pony = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Pony #{id} not found")))?;

    payload.apply_to(&mut pony);
    repo::save(&state.db, &pony).await?;

    info!(pony_id = %pony.id, "pony updated");
    Ok(Json(pony))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let deleted = repo::delete(&state.db, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(format!("Pony #{id} not found")));
    }

    info!(pony_id = %id, "pony removed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read file: {e}")))?;
            file = Some((content_type, data));
            break;
        }
    }

    let (content_type, data) =
        file.ok_or_else(|| ApiError::Validation("No file was uploaded".into()))?;

    let image_url = services::process_upload(
        state.storage.as_ref(),
        state.config.upload.max_bytes,
        &content_type,
        data,
    )
    .await?;

    Ok(Json(UploadResponse { image_url }))
}
