use std::io::ErrorKind;
use std::path::Path as FsPath;

use axum::{
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::error::FileHostError;
use crate::listing::{list_matching, render_listing};
use crate::resolve::{ensure_contained, get_relative_path, resolve};

/// Name of the multipart field carrying upload content.
pub const UPLOAD_FIELD: &str = "file";

// ============================================================================
// Route entry points
// ============================================================================

/// GET / - List every file under the root
pub async fn get_root(State(state): State<AppState>) -> Result<Response, FileHostError> {
    serve_or_list(&state, "").await
}

/// GET /{*path} - Download a file, or list matching files
pub async fn get_entry(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, FileHostError> {
    serve_or_list(&state, &path).await
}

/// POST / - Always rejected, the root is not a file
pub async fn upload_root(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, String), FileHostError> {
    store_upload(&state, "", multipart).await
}

/// POST /{*path} - Upload the multipart `file` field to `path`
pub async fn upload_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, String), FileHostError> {
    store_upload(&state, &path, multipart).await
}

/// DELETE / - Always rejected, the root cannot be deleted
pub async fn delete_root(
    State(state): State<AppState>,
) -> Result<(StatusCode, String), FileHostError> {
    delete_path(&state, "").await
}

/// DELETE /{*path} - Delete a file or a whole directory
pub async fn delete_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<(StatusCode, String), FileHostError> {
    delete_path(&state, &path).await
}

// ============================================================================
// Actions
// ============================================================================

async fn serve_or_list(state: &AppState, request_path: &str) -> Result<Response, FileHostError> {
    let path = resolve(&state.root_dir, request_path)?;
    ensure_contained(&state.root_dir, &path)?;

    if let Ok(metadata) = fs::metadata(&path).await {
        if metadata.is_file() {
            return serve_file(&path, metadata.len()).await;
        }
    }

    // A trailing slash narrows the query to entries below that directory
    let mut query = get_relative_path(&state.root_dir, &path);
    if request_path.ends_with('/') && !query.is_empty() {
        query.push('/');
    }
    debug!("Listing files matching {:?}", query);

    let root = state.root_dir.clone();
    let config = state.config.clone();
    let files = tokio::task::spawn_blocking(move || list_matching(&root, &query, &config))
        .await
        .map_err(|err| {
            error!("Listing task failed: {}", err);
            FileHostError::Io(std::io::Error::other(err.to_string()))
        })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_listing(&files),
    )
        .into_response())
}

/// Stream a regular file back to the client.
async fn serve_file(path: &FsPath, file_size: u64) -> Result<Response, FileHostError> {
    debug!("Streaming file: {}", path.display());

    let file = fs::File::open(path).await.map_err(|e| {
        error!("Failed to open {}: {}", path.display(), e);
        FileHostError::Io(e)
    })?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, HeaderValue::from(file_size)),
            (header::CONTENT_DISPOSITION, content_disposition(path)),
        ],
        body,
    )
        .into_response())
}

/// `inline` disposition carrying the file name when it can be sent as a
/// header value, plain `inline` otherwise.
fn content_disposition(path: &FsPath) -> HeaderValue {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let safe_filename = file_name.replace('"', "'");

    HeaderValue::from_str(&format!("inline; filename=\"{}\"", safe_filename)).unwrap_or_else(
        |_| {
            debug!("File name not representable in a header: {:?}", file_name);
            HeaderValue::from_static("inline")
        },
    )
}

async fn store_upload(
    state: &AppState,
    request_path: &str,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, String), FileHostError> {
    let dest_path = resolve(&state.root_dir, request_path)?;
    if dest_path == state.root_dir {
        warn!("Upload without a destination file name");
        return Err(FileHostError::InvalidPath);
    }
    ensure_contained(&state.root_dir, &dest_path)?;

    let relative_path = get_relative_path(&state.root_dir, &dest_path);

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            error!("Failed to create directory {}: {}", parent.display(), e);
            FileHostError::CreateDirFailed(get_relative_path(&state.root_dir, parent))
        })?;
    }

    let mut multipart = multipart.map_err(|e| {
        warn!("Upload body is not multipart/form-data: {}", e);
        FileHostError::MissingUploadField
    })?;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        warn!("Multipart error parsing field: {}", e);
        FileHostError::MissingUploadField
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let mut file = fs::File::create(&dest_path).await.map_err(|e| {
            error!("Failed to create file {}: {}", dest_path.display(), e);
            FileHostError::Io(e)
        })?;

        let mut total_size = 0u64;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read upload data: {}", e);
                    drop(file);
                    let _ = fs::remove_file(&dest_path).await;
                    return Err(FileHostError::MissingUploadField);
                }
            };

            total_size = total_size.saturating_add(chunk.len() as u64);
            if let Some(limit) = state.config.max_upload_size {
                if total_size > limit {
                    drop(file);
                    let _ = fs::remove_file(&dest_path).await;
                    return Err(FileHostError::FileTooLarge {
                        size: total_size,
                        limit,
                    });
                }
            }

            file.write_all(&chunk).await.map_err(|e| {
                error!("Failed to write {}: {}", dest_path.display(), e);
                FileHostError::Io(e)
            })?;
        }
        file.flush().await.map_err(FileHostError::Io)?;

        info!("Uploaded file: {} ({} bytes)", relative_path, total_size);

        return Ok((StatusCode::CREATED, relative_path));
    }

    warn!("Upload to {:?} has no `{}` field", relative_path, UPLOAD_FIELD);
    Err(FileHostError::MissingUploadField)
}

async fn delete_path(
    state: &AppState,
    request_path: &str,
) -> Result<(StatusCode, String), FileHostError> {
    let path = resolve(&state.root_dir, request_path)?;
    if path == state.root_dir {
        warn!("Attempted to delete root directory");
        return Err(FileHostError::InvalidPath);
    }

    // The entry itself may be a symlink; only its parent has to stay inside the root.
    let parent = path.parent().ok_or(FileHostError::InvalidPath)?;
    ensure_contained(&state.root_dir, parent)?;

    let relative_path = get_relative_path(&state.root_dir, &path);

    let metadata = match fs::symlink_metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FileHostError::NotFound(relative_path));
        }
        Err(e) => {
            error!("Failed to stat {}: {}", path.display(), e);
            return Err(FileHostError::Io(e));
        }
    };

    info!("Deleting: {}", relative_path);

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(&path).await
    } else {
        fs::remove_file(&path).await
    };
    removed.map_err(|e| {
        error!("Failed to delete {}: {}", path.display(), e);
        FileHostError::Io(e)
    })?;

    Ok((StatusCode::OK, relative_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn state_for(root: &FsPath) -> AppState {
        AppState::with_config(root.to_path_buf(), Config::default())
    }

    #[tokio::test]
    async fn test_delete_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        let state = state_for(temp_dir.path());

        let (status, body) = delete_path(&state, "a.txt").await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "a.txt");
        assert!(!temp_dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        let state = state_for(temp_dir.path());

        assert!(delete_path(&state, "a.txt").await.is_ok());
        match delete_path(&state, "a.txt").await {
            Err(err @ FileHostError::NotFound(_)) => {
                assert_eq!(err.to_string(), "Not found: a.txt");
                assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_directory_recursively() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("docs/nested")).unwrap();
        std::fs::write(temp_dir.path().join("docs/nested/b.txt"), "b").unwrap();
        let state = state_for(temp_dir.path());

        let (_, body) = delete_path(&state, "docs").await.unwrap();
        assert_eq!(body, "docs");
        assert!(!temp_dir.path().join("docs").exists());
    }

    #[tokio::test]
    async fn test_delete_root_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let state = state_for(temp_dir.path());

        for path in ["", "/", ".", "docs/.."] {
            assert!(matches!(
                delete_path(&state, path).await,
                Err(FileHostError::InvalidPath)
            ));
        }
        assert!(temp_dir.path().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delete_symlink_removes_link_only() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("keep.txt"), "keep").unwrap();
        symlink(outside.path(), temp_dir.path().join("link")).unwrap();
        let state = state_for(temp_dir.path());

        assert!(delete_path(&state, "link").await.is_ok());
        assert!(outside.path().join("keep.txt").exists());
        assert!(std::fs::symlink_metadata(temp_dir.path().join("link")).is_err());
    }

    #[test]
    fn test_content_disposition_falls_back_for_unrepresentable_names() {
        assert_eq!(
            content_disposition(FsPath::new("/srv/a.txt")),
            "inline; filename=\"a.txt\""
        );
        assert_eq!(content_disposition(FsPath::new("/srv/a\nb.txt")), "inline");
        assert_eq!(content_disposition(FsPath::new("/srv/a\rb.txt")), "inline");
    }

    #[tokio::test]
    async fn test_serve_or_list_rejects_traversal() {
        let state = state_for(&PathBuf::from("/nonexistent/root"));
        assert!(matches!(
            serve_or_list(&state, "../etc/passwd").await,
            Err(FileHostError::InvalidPath)
        ));
    }
}
