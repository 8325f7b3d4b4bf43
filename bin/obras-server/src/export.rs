//! CSV export through a temporary file.
//!
//! [`CsvExporter::export`] writes the CSV document to a freshly created,
//! uniquely named file in the export directory and answers with a response
//! whose body streams that file. The body owns the file's [`TempPath`], so
//! the file is removed when hyper drops the body: after the last byte is
//! sent, on a write error, or when the client disconnects mid-transfer.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use obras_core::Obra;
use obras_core::codec::{CsvExportError, write_obras};
use tempfile::TempPath;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::debug;

pub const EXPORT_FILE_NAME: &str = "obras.csv";
pub const EXPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Errors that can occur while staging an export file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] CsvExportError),

    #[error("export writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Stages CSV exports in `dir` and serves them as `obras.csv` attachments.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `obras` to a temp file and build the download response.
    pub async fn export(&self, obras: Vec<Obra>) -> Result<Response, ExportError> {
        let dir = self.dir.clone();
        let path = tokio::task::spawn_blocking(move || -> Result<TempPath, ExportError> {
            // Dropping `file` on an error path removes it.
            let mut file = tempfile::Builder::new()
                .prefix("obras-")
                .suffix(".csv")
                .tempfile_in(&dir)?;
            write_obras(file.as_file_mut(), &obras)?;
            Ok(file.into_temp_path())
        })
        .await??;
        debug!(path = %path.display(), "export file staged");

        let file = tokio::fs::File::open(&path).await?;
        let body = Body::from_stream(TempFileStream {
            reader: ReaderStream::new(file),
            _path: path,
        });

        Ok((
            [
                (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
                ),
            ],
            body,
        )
            .into_response())
    }
}

/// Streams a staged export and deletes it on drop.
///
/// Fields drop in declaration order: the file handle closes before the
/// path is removed.
struct TempFileStream {
    reader: ReaderStream<tokio::fs::File>,
    _path: TempPath,
}

impl Stream for TempFileStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().reader.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;

    fn obras(count: u64) -> Vec<Obra> {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        (1..=count)
            .map(|id| Obra {
                title: format!("Obra {id}"),
                publisher: "Editora".to_owned(),
                photo: "http://example.com/capa.png".to_owned(),
                authors: vec!["Ana".to_owned(), "Bruno".to_owned()],
                id,
                created_at: at,
                updated_at: at,
            })
            .collect()
    }

    fn staged_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn response_is_a_csv_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path());

        let response = exporter.export(obras(2)).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], EXPORT_CONTENT_TYPE);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"obras.csv\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("titulo,editora,foto,autores,id,created_at,updated_at")
        );
        assert_eq!(lines.count(), 2);
    }

    #[tokio::test]
    async fn file_is_staged_until_body_is_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path());

        let response = exporter.export(obras(1)).await.unwrap();
        assert_eq!(staged_files(dir.path()), 1);

        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn file_is_removed_when_client_goes_away() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path());

        // Large enough to need several chunks.
        let response = exporter.export(obras(2_000)).await.unwrap();
        let mut body = response.into_body();
        let first = body.frame().await.unwrap().unwrap();
        assert!(first.is_data());
        assert_eq!(staged_files(dir.path()), 1);

        drop(body);
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn response_dropped_unsent_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path());

        let response = exporter.export(obras(1)).await.unwrap();
        drop(response);
        assert_eq!(staged_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path().join("does-not-exist"));

        let err = exporter.export(obras(1)).await.unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[tokio::test]
    async fn concurrent_exports_use_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path());

        let a = exporter.export(obras(1)).await.unwrap();
        let b = exporter.export(obras(1)).await.unwrap();
        assert_eq!(staged_files(dir.path()), 2);

        drop(a);
        drop(b);
        assert_eq!(staged_files(dir.path()), 0);
    }
}
