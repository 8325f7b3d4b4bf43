//! Catalog endpoints.
//!
//! | Method | Path                  | Store / codec operation        |
//! |--------|-----------------------|--------------------------------|
//! | POST   | `/obras`              | append                         |
//! | POST   | `/upload-obras`       | CSV import + batch append      |
//! | GET    | `/obras`              | list_all                       |
//! | GET    | `/file-obras`         | list_filtered + CSV export     |
//! | PUT    | `/obras/{id}`         | update                         |
//! | DELETE | `/obras/{id}`         | delete                         |

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use obras_core::codec;
use obras_core::{CreateObra, Obra};
use tracing::{debug, info, warn};
use utoipa::OpenApi;

use crate::error::{
    CSV_MALFORMED_MESSAGE, NOTHING_TO_EXPORT_MESSAGE, OBRA_NOT_FOUND_MESSAGE, ServerError,
};
use crate::extract::{ObraIdPath, ValidatedJson};
use crate::schemas::obras::{ExportQuery, UploadObras};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(create_obra, upload_obras, list_obras, export_obras, update_obra, delete_obra),
    components(schemas(CreateObra, Obra, UploadObras))
)]
pub struct ObrasApi;

/// Register catalog routes.
pub fn router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/obras", post(create_obra).get(list_obras))
        .route(
            "/upload-obras",
            post(upload_obras).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/file-obras", get(export_obras))
        .route("/obras/{id}", put(update_obra).delete(delete_obra))
}

/// Add a work to the catalog.
///
/// Answers with the submitted fields; `id` and timestamps are assigned by the
/// server and visible through `GET /obras`.
#[utoipa::path(
    post,
    path = "/obras",
    tag = "obras",
    request_body = CreateObra,
    responses(
        (status = 200, description = "Obra created", body = CreateObra),
        (status = 422, description = "Invalid body"),
    )
)]
pub async fn create_obra(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateObra>,
) -> Json<CreateObra> {
    let obra = state.store.append(req);
    info!(id = obra.id, "obra created");
    Json(obra.to_request())
}

/// Import works from an uploaded CSV file.
///
/// Reads the `titulo`, `editora`, `foto` and `autores` columns; other columns
/// are ignored. The upload is all-or-nothing: if any row is unusable nothing
/// is stored.
#[utoipa::path(
    post,
    path = "/upload-obras",
    tag = "obras",
    request_body(content = UploadObras, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Obras created", body = [Obra]),
        (status = 400, description = "CSV mal formatado!"),
        (status = 422, description = "Missing `file` field"),
    )
)]
pub async fn upload_obras(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<Obra>>, ServerError> {
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            debug!(file_name = ?field.file_name(), "receiving csv upload");
            upload = Some(field.bytes().await?);
            break;
        }
    }
    let bytes =
        upload.ok_or_else(|| ServerError::Validation("file: field required".to_owned()))?;

    let text = std::str::from_utf8(&bytes).map_err(|e| {
        warn!(error = %e, "csv upload is not UTF-8");
        ServerError::BadRequest(CSV_MALFORMED_MESSAGE.to_owned())
    })?;

    let requests = codec::read_obras(text)?;
    let created = state.store.append_all(requests);
    info!(count = created.len(), "csv import stored");
    Ok(Json(created))
}

/// List every work, in insertion order.
#[utoipa::path(
    get,
    path = "/obras",
    tag = "obras",
    responses(
        (status = 200, description = "All obras", body = [Obra]),
    )
)]
pub async fn list_obras(State(state): State<Arc<AppState>>) -> Json<Vec<Obra>> {
    Json(state.store.list_all())
}

/// Download the catalog as `obras.csv`.
///
/// With `data_inicial`, only works created at or after that instant are
/// included.
#[utoipa::path(
    get,
    path = "/file-obras",
    tag = "obras",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 404, description = "Nenhuma obra para exportar!"),
        (status = 422, description = "Invalid `data_inicial`"),
    )
)]
pub async fn export_obras(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ServerError> {
    let since = query.since()?;
    let obras = state.store.list_filtered(since);
    if obras.is_empty() {
        return Err(ServerError::NotFound(NOTHING_TO_EXPORT_MESSAGE.to_owned()));
    }
    info!(count = obras.len(), since = ?since, "exporting obras");
    Ok(state.exporter.export(obras).await?)
}

/// Replace the fields of a work, keeping its id and `created_at`.
#[utoipa::path(
    put,
    path = "/obras/{id}",
    tag = "obras",
    params(
        ("id" = u64, Path, description = "ID of the obra to update")
    ),
    request_body = CreateObra,
    responses(
        (status = 200, description = "Obra updated", body = Obra),
        (status = 404, description = "Obra não encontrada!"),
        (status = 422, description = "Invalid body or id"),
    )
)]
pub async fn update_obra(
    State(state): State<Arc<AppState>>,
    ObraIdPath(id): ObraIdPath,
    ValidatedJson(req): ValidatedJson<CreateObra>,
) -> Result<Json<Obra>, ServerError> {
    let obra = state
        .store
        .update(id, req)
        .ok_or_else(|| ServerError::NotFound(OBRA_NOT_FOUND_MESSAGE.to_owned()))?;
    info!(id, "obra updated");
    Ok(Json(obra))
}

/// Remove a work and return it.
#[utoipa::path(
    delete,
    path = "/obras/{id}",
    tag = "obras",
    params(
        ("id" = u64, Path, description = "ID of the obra to delete")
    ),
    responses(
        (status = 200, description = "Obra deleted", body = Obra),
        (status = 404, description = "Obra não encontrada!"),
        (status = 422, description = "Invalid id"),
    )
)]
pub async fn delete_obra(
    State(state): State<Arc<AppState>>,
    ObraIdPath(id): ObraIdPath,
) -> Result<Json<Obra>, ServerError> {
    let obra = state
        .store
        .delete(id)
        .ok_or_else(|| ServerError::NotFound(OBRA_NOT_FOUND_MESSAGE.to_owned()))?;
    info!(id, "obra deleted");
    Ok(Json(obra))
}
