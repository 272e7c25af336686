use crate::errors::UploadError;
use crate::AppData;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, SubsecRound, Utc};
use dupecheck_core::hashing::{self, DigestAlgorithm};
use futures_util::TryStreamExt as _;
use providers::{RemoteMetadata, UPLOAD_FIELD};
use std::io::Write;
use std::time::SystemTime;
use tempfile::NamedTempFile;

/// An uploaded part spooled to disk. The temp file is removed on drop.
struct SavedUpload {
    name: Option<String>,
    content_type: String,
    file: NamedTempFile,
}

pub async fn create(
    data: web::Data<AppData>,
    payload: Multipart,
) -> Result<HttpResponse, UploadError> {
    let uploads = save_parts(&data, payload).await?;
    if uploads.is_empty() {
        return Err(UploadError::NoFiles(UPLOAD_FIELD));
    }

    let mut records = Vec::with_capacity(uploads.len());
    for upload in uploads {
        records.push(describe(upload, data.digest).await?);
    }
    tracing::info!("described {} uploaded files", records.len());
    Ok(HttpResponse::Ok().json(records))
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

async fn save_parts(data: &AppData, mut payload: Multipart) -> Result<Vec<SavedUpload>, UploadError> {
    let mut saved: Vec<SavedUpload> = vec![];

    while let Some(mut field) = payload.try_next().await? {
        let Some(content_disposition) = field.content_disposition() else {
            continue;
        };
        if content_disposition.get_name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if saved.len() >= data.max_files {
            return Err(UploadError::TooManyFiles(data.max_files));
        }
        let name = content_disposition.get_filename().map(str::to_string);
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_default();

        tracing::debug!("save_parts receiving {:?} ({})", name, content_type);

        let dir = data.upload_dir.clone();
        let mut file = web::block(move || {
            tempfile::Builder::new()
                .prefix("upload-")
                .tempfile_in(dir)
        })
        .await??;

        while let Some(chunk) = field.try_next().await? {
            file = web::block(move || file.write_all(&chunk).map(|_| file)).await??;
        }

        saved.push(SavedUpload {
            name,
            content_type,
            file,
        });
    }

    Ok(saved)
}

fn to_utc(t: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(t).trunc_subsecs(3)
}

/// Reads stats and hash from the spooled file, then deletes it.
async fn describe(upload: SavedUpload, digest: DigestAlgorithm) -> Result<RemoteMetadata, UploadError> {
    let record = web::block(move || -> std::io::Result<RemoteMetadata> {
        let path = upload.file.path().to_path_buf();
        let stats = std::fs::metadata(&path)?;
        let hash = hashing::digest_file(&path, digest)?;
        let record = RemoteMetadata {
            name: upload.name,
            size: stats.len(),
            content_type: upload.content_type,
            created: stats.created().ok().map(to_utc),
            modified: stats.modified().ok().map(to_utc),
            hash,
        };
        upload.file.close()?;
        Ok(record)
    })
    .await??;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use crate::{cors_headers, routes, AppData};
    use actix_web::http::header::CONTENT_TYPE;
    use actix_web::http::{Method, StatusCode};
    use actix_web::{test, web, App};
    use dupecheck_core::hashing::{self, DigestAlgorithm};
    use providers::RemoteMetadata;
    use std::path::Path;

    const BOUNDARY: &str = "----dupecheck-test-boundary";

    fn multipart_body(parts: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, filename, content_type, bytes) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(parts: &[(&str, &str, &str, &[u8])]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/upload")
            .insert_header((
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(parts))
    }

    fn app_data(dir: &Path) -> web::Data<AppData> {
        web::Data::new(AppData {
            upload_dir: dir.to_path_buf(),
            digest: DigestAlgorithm::Sha256,
            max_files: 2,
        })
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[actix_web::test]
    async fn two_files_are_described_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(app_data(dir.path()))
                .wrap(cors_headers())
                .configure(routes),
        )
        .await;

        let req = upload_request(&[
            ("files", "first.txt", "text/plain", b"hello"),
            ("files", "second.jpg", "image/jpeg", b"\xFF\xD8\xFF\xD9"),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );

        let records: Vec<RemoteMetadata> = test::read_body_json(resp).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("first.txt"));
        assert_eq!(records[0].size, 5);
        assert_eq!(records[0].content_type, "text/plain");
        assert_eq!(
            records[0].hash,
            hashing::digest(b"hello", DigestAlgorithm::Sha256)
        );
        assert_eq!(records[1].name.as_deref(), Some("second.jpg"));
        assert_eq!(records[1].content_type, "image/jpeg");
        assert!(records[1].modified.is_some());

        assert!(dir_is_empty(dir.path()), "uploads must not be retained");
    }

    #[actix_web::test]
    async fn more_than_two_files_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(app_data(dir.path()))
                .wrap(cors_headers())
                .configure(routes),
        )
        .await;

        let req = upload_request(&[
            ("files", "a.txt", "text/plain", b"a"),
            ("files", "b.txt", "text/plain", b"b"),
            ("files", "c.txt", "text/plain", b"c"),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("at most 2"));
        assert!(dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn unrelated_fields_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(app_data(dir.path()))
                .configure(routes),
        )
        .await;

        let req = upload_request(&[
            ("note", "note.txt", "text/plain", b"ignored"),
            ("files", "a.txt", "text/plain", b"a"),
            ("files", "b.txt", "text/plain", b"b"),
        ])
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let records: Vec<RemoteMetadata> = test::read_body_json(resp).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("a.txt"));
    }

    #[actix_web::test]
    async fn empty_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(app_data(dir.path()))
                .configure(routes),
        )
        .await;

        let req = upload_request(&[("note", "note.txt", "text/plain", b"nothing")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn preflight_carries_cors_headers() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(app_data(dir.path()))
                .wrap(cors_headers())
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/upload")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
        assert!(resp
            .headers()
            .get("Access-Control-Allow-Methods")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("POST"));
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(app_data(dir.path()))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
