use axum::{
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::fs;

use crate::{
    access,
    api::models::MessageResponse,
    auth::CurrentIdentity,
    errors::Error,
    export::{archive, rdf, triplestore::TriplestoreClient},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub extension: String,
}

#[derive(Debug, Deserialize)]
pub struct RdfParams {
    pub extension: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveParams {
    pub include_conf: Option<String>,
}

impl ArchiveParams {
    /// Interpret the flag leniently: absent, empty, `0` and `false` mean
    /// off, anything else means on.
    fn include_conf(&self) -> bool {
        !matches!(self.include_conf.as_deref(), None | Some("" | "0" | "false"))
    }
}

/// Split a collection path parameter into sanitized segments.
fn collection_segments(collection: &str) -> Vec<&str> {
    collection.split('/').filter(|s| !s.is_empty()).collect()
}

fn text_attachment(file_name: &str, data: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, format!("inline; filename={file_name}")),
        ],
        data,
    )
        .into_response()
}

/// Download a raw document file from a collection
#[utoipa::path(
    get,
    path = "/collections/{collection}/documents/{document}/download",
    tag = "downloads",
    params(
        ("collection" = String, Path, description = "Collection directory"),
        ("document" = String, Path, description = "Document name without extension"),
        ("extension" = String, Query, description = "File extension to serve"),
    ),
    responses(
        (status = 200, description = "Raw document bytes"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "No such document"),
    )
)]
#[tracing::instrument(skip_all, fields(collection = %collection, document = %document))]
pub async fn download_document(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path((collection, document)): Path<(String, String)>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, Error> {
    let file_name = format!("{document}.{}", params.extension);
    let mut segments = collection_segments(&collection);
    segments.push(&file_name);
    let fpath = access::resolve(&state.config.data_dir, &segments)?;

    if !access::can_read(&state.store, &state.config, &identity, &fpath).await? {
        return Err(Error::AccessDenied);
    }

    let data = fs::read(&fpath).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                resource: "document".to_string(),
                id: file_name.clone(),
            }
        } else {
            Error::Internal {
                operation: format!("read document {}: {e}", fpath.display()),
            }
        }
    })?;

    Ok(text_attachment(&file_name, data))
}

/// Download the RDF rendering of a document's annotations
#[utoipa::path(
    get,
    path = "/collections/{collection}/documents/{document}/rdf",
    tag = "downloads",
    params(
        ("collection" = String, Path, description = "Collection directory"),
        ("document" = String, Path, description = "Document name without extension"),
        ("extension" = Option<String>, Query, description = "Annotation file extension, `ann` by default"),
    ),
    responses(
        (status = 200, description = "RDF rendering of the annotation file"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "No such document"),
    )
)]
#[tracing::instrument(skip_all, fields(collection = %collection, document = %document))]
pub async fn download_rdf(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path((collection, document)): Path<(String, String)>,
    Query(params): Query<RdfParams>,
) -> Result<Response, Error> {
    let extension = params.extension.as_deref().unwrap_or("ann");
    let file_name = format!("{document}.{extension}");
    let mut segments = collection_segments(&collection);
    segments.push(&file_name);
    let fpath = access::resolve(&state.config.data_dir, &segments)?;

    if !access::can_read(&state.store, &state.config, &identity, &fpath).await? {
        return Err(Error::AccessDenied);
    }

    let data = rdf::convert_to_rdf(&fpath).await?;
    Ok(text_attachment(&file_name, data.into_bytes()))
}

/// Download a whole collection as a gzipped tar archive
#[utoipa::path(
    get,
    path = "/collections/{collection}/archive",
    tag = "downloads",
    params(
        ("collection" = String, Path, description = "Collection directory"),
        ("include_conf" = Option<String>, Query, description = "Include project configuration files"),
    ),
    responses(
        (status = 200, description = "Gzipped tar archive of the collection"),
        (status = 403, description = "Access denied"),
        (status = 502, description = "Archive packaging failed"),
    )
)]
#[tracing::instrument(skip_all, fields(collection = %collection))]
pub async fn download_collection(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(collection): Path<String>,
    Query(params): Query<ArchiveParams>,
) -> Result<Response, Error> {
    let real_dir = access::resolve(&state.config.data_dir, &collection_segments(&collection))?;

    if !access::can_read(&state.store, &state.config, &identity, &real_dir).await? {
        return Err(Error::AccessDenied);
    }
    if !fs::metadata(&real_dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Err(Error::NotFound {
            resource: "collection".to_string(),
            id: collection,
        });
    }

    let archive = archive::create_archive(&state.config, &real_dir, params.include_conf()).await?;

    Ok((
        [
            (CONTENT_TYPE, "application/octet-stream".to_string()),
            (CONTENT_DISPOSITION, format!("inline; filename={}", archive.file_name)),
        ],
        archive.data,
    )
        .into_response())
}

/// Upload a document's annotations to the configured triplestore
#[utoipa::path(
    post,
    path = "/collections/{collection}/documents/{document}/triplestore",
    tag = "downloads",
    params(
        ("collection" = String, Path, description = "Collection directory"),
        ("document" = String, Path, description = "Document name without extension"),
    ),
    responses(
        (status = 200, description = "Annotations uploaded", body = MessageResponse),
        (status = 401, description = "Login required"),
        (status = 403, description = "Access denied"),
        (status = 502, description = "Triplestore rejected the upload"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(collection = %collection, document = %document))]
pub async fn upload_to_triplestore(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path((collection, document)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, Error> {
    let user = identity.require_user("upload annotations to the triplestore")?;

    let Some(triplestore_config) = state.config.triplestore.clone() else {
        return Err(Error::BadRequest {
            message: "Triplestore sync is not configured".to_string(),
        });
    };

    let file_name = format!("{document}.ann");
    let mut segments = collection_segments(&collection);
    segments.push(&file_name);
    let fpath = access::resolve(&state.config.data_dir, &segments)?;

    // The upload reads the annotation file, so the read check applies the
    // same as on the download paths.
    if !access::can_read(&state.store, &state.config, &identity, &fpath).await? {
        return Err(Error::AccessDenied);
    }

    let client = TriplestoreClient::new(triplestore_config);
    client.upload(&user.user_name, &document, &fpath).await?;

    Ok(Json(MessageResponse {
        message: "Uploaded data to triplestore".to_string(),
    }))
}
