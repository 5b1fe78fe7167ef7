use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use parley_core::{
    types::UploadResponse,
    validation::{ValidationError, MAX_UPLOAD_BYTES},
};
use tracing::{error, info};

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
    upload::{IncomingFile, MediaStore, UploadError},
};

const FILE_FIELD: &str = "file";
/// Room for multipart framing on top of the file itself.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state)
}

async fn upload(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|rejection| {
        AppError::BadRequest(rejection.body_text()).with_request_id(&request_id.0)
    })?;

    let file = read_file_part(&mut multipart)
        .await
        .map_err(|err| err.with_request_id(&request_id.0))?
        .ok_or_else(|| AppError::from(ValidationError::MissingFile).with_request_id(&request_id.0))?;

    let store = MediaStore::from_settings(&state.settings);
    let url = store.save(&file).await.map_err(|err| match err {
        UploadError::Invalid(reason) => AppError::from(reason).with_request_id(&request_id.0),
        UploadError::Io { .. } => {
            error!(request_id = %request_id.0, error = %err, "Failed to upload file");
            AppError::Internal("Failed to upload file".to_string()).with_request_id(&request_id.0)
        }
    })?;

    info!(request_id = %request_id.0, %url, size = file.bytes.len(), "stored upload");

    Ok(Json(UploadResponse { success: true, url }))
}

/// Reads the `file` part, giving up as soon as it grows past the size cap.
/// An empty part without a file name is what browsers send for "no file".
async fn read_file_part(multipart: &mut Multipart) -> Result<Option<IncomingFile>, AppError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(ValidationError::FileTooLarge.into());
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() && file_name.is_empty() {
            return Ok(None);
        }

        return Ok(Some(IncomingFile {
            bytes,
            content_type,
            file_name,
        }));
    }
    Ok(None)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::FileTooLarge.into()
    } else {
        AppError::BadRequest(err.body_text())
    }
}
