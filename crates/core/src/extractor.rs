use crate::error::ExtractError;
use crate::exif_data;
use crate::hashing::{self, DigestAlgorithm};
use crate::models::FileMetadata;
use chrono::{DateTime, SubsecRound, Utc};
use providers::noop::NoopProvider;
use providers::{MetadataProvider, ProviderError, RemoteMetadata, UploadFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Bytes handed to content sniffing when the extension is not recognized.
const SNIFF_LEN: u64 = 8192;

/// Both records of a comparison plus the fallback notice, if remote
/// delegation was requested and failed.
#[derive(Debug, Clone)]
pub struct ExtractedPair {
    pub a: FileMetadata,
    pub b: FileMetadata,
    pub notice: Option<String>,
    /// Content hashes were computed by the remote service, not locally.
    pub hashes_from_remote: bool,
}

/// What the filesystem says about a file. Content is read on demand.
#[derive(Debug, Clone)]
struct FileStat {
    path: PathBuf,
    name: String,
    size: u64,
    content_type: Option<String>,
    created_at: Option<DateTime<Utc>>,
    modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct Extractor {
    digest: DigestAlgorithm,
    use_remote: bool,
    provider: Arc<dyn MetadataProvider>,
}

impl Extractor {
    pub fn local(digest: DigestAlgorithm) -> Self {
        Self {
            digest,
            use_remote: false,
            provider: Arc::new(NoopProvider),
        }
    }

    pub fn remote(digest: DigestAlgorithm, provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            digest,
            use_remote: true,
            provider,
        }
    }

    pub fn uses_remote(&self) -> bool {
        self.use_remote
    }

    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    /// Extracts one file fully locally.
    pub async fn extract(&self, path: &Path) -> Result<FileMetadata, ExtractError> {
        let stat = stat(path).await?;
        self.describe_locally(stat).await
    }

    /// Extracts both files concurrently. In remote mode both are described in
    /// one round trip; any provider failure falls back to local extraction
    /// for both and sets `notice`.
    pub async fn extract_pair(&self, a: &Path, b: &Path) -> Result<ExtractedPair, ExtractError> {
        if !self.use_remote {
            let (a, b) = tokio::try_join!(self.extract(a), self.extract(b))?;
            return Ok(ExtractedPair {
                a,
                b,
                notice: None,
                hashes_from_remote: false,
            });
        }

        let (stat_a, stat_b) = tokio::try_join!(stat(a), stat(b))?;
        let (upload_a, upload_b) = tokio::try_join!(upload_for(&stat_a), upload_for(&stat_b))?;
        let outcome = self
            .provider
            .describe(vec![upload_a, upload_b])
            .await
            .and_then(into_pair);

        match outcome {
            Ok((remote_a, remote_b)) => {
                debug!("remote metadata received for both files");
                if self.digest != DigestAlgorithm::default() {
                    warn!(
                        "content hashes come from the remote service; the local {} digest was not applied",
                        self.digest
                    );
                }
                let (a, b) = tokio::try_join!(
                    merge_remote(stat_a, remote_a),
                    merge_remote(stat_b, remote_b)
                )?;
                Ok(ExtractedPair {
                    a,
                    b,
                    notice: None,
                    hashes_from_remote: true,
                })
            }
            Err(e) => {
                warn!("remote metadata failed, falling back to local extraction: {}", e);
                let (a, b) = tokio::try_join!(
                    self.describe_locally(stat_a),
                    self.describe_locally(stat_b)
                )?;
                Ok(ExtractedPair {
                    a,
                    b,
                    notice: Some(format!(
                        "Remote metadata service unavailable ({}); metadata was computed locally.",
                        e
                    )),
                    hashes_from_remote: false,
                })
            }
        }
    }

    /// Hashes the file by streaming it from disk; EXIF is read only for images.
    async fn describe_locally(&self, stat: FileStat) -> Result<FileMetadata, ExtractError> {
        let digest = self.digest;
        tokio::task::spawn_blocking(move || -> Result<FileMetadata, ExtractError> {
            let content_hash =
                hashing::digest_file(&stat.path, digest).map_err(|source| ExtractError::Read {
                    path: stat.path.clone(),
                    source,
                })?;
            let exif = decode_exif(stat.content_type.as_deref(), &stat.path);
            Ok(FileMetadata {
                name: stat.name,
                size: stat.size,
                content_type: stat.content_type,
                created_at: stat.created_at,
                modified_at: stat.modified_at,
                content_hash,
                exif,
            })
        })
        .await
        .map_err(|e| ExtractError::Join(e.to_string()))?
    }
}

fn into_pair(records: Vec<RemoteMetadata>) -> Result<(RemoteMetadata, RemoteMetadata), ProviderError> {
    let count = records.len();
    let mut it = records.into_iter();
    match (it.next(), it.next(), it.next()) {
        (Some(a), Some(b), None) => Ok((a, b)),
        _ => Err(ProviderError::InvalidResponse(format!(
            "expected 2 records, got {}",
            count
        ))),
    }
}

/// Reads the file once; the buffer moves into the request body.
async fn upload_for(stat: &FileStat) -> Result<UploadFile, ExtractError> {
    let bytes = tokio::fs::read(&stat.path)
        .await
        .map_err(|source| ExtractError::Read {
            path: stat.path.clone(),
            source,
        })?;
    Ok(UploadFile {
        name: stat.name.clone(),
        content_type: stat.content_type.clone(),
        bytes,
    })
}

/// Name and EXIF stay local; everything filesystem-level comes from the remote.
async fn merge_remote(stat: FileStat, remote: RemoteMetadata) -> Result<FileMetadata, ExtractError> {
    tokio::task::spawn_blocking(move || {
        let content_type = Some(remote.content_type).filter(|t| !t.is_empty());
        let exif = decode_exif(content_type.as_deref(), &stat.path);
        FileMetadata {
            name: stat.name,
            size: remote.size,
            content_type,
            created_at: remote.created.map(|t| t.trunc_subsecs(3)),
            modified_at: remote.modified.map(|t| t.trunc_subsecs(3)),
            content_hash: remote.hash.to_lowercase(),
            exif,
        }
    })
    .await
    .map_err(|e| ExtractError::Join(e.to_string()))
}

fn decode_exif(content_type: Option<&str>, path: &Path) -> Option<crate::models::ExifTags> {
    match content_type {
        Some(t) if t.starts_with("image/") => exif_data::read_file_tags(path),
        _ => None,
    }
}

async fn stat(path: &Path) -> Result<FileStat, ExtractError> {
    let read_err = |source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    };
    let meta = tokio::fs::metadata(path).await.map_err(read_err)?;
    let content_type = match guess_mime(path) {
        Some(mime) => Some(mime),
        None => sniff_mime(path).await.map_err(read_err)?,
    };
    Ok(FileStat {
        path: path.to_path_buf(),
        name: file_name(path),
        size: meta.len(),
        content_type,
        created_at: meta.created().ok().map(to_utc),
        modified_at: meta.modified().ok().map(to_utc),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Millisecond precision, matching the ISO-8601 wire format.
fn to_utc(t: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(t).trunc_subsecs(3)
}

pub fn guess_mime(path: &Path) -> Option<String> {
    let ext = path.extension().and_then(|ext| ext.to_str())?.to_lowercase();
    let mime = match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime.to_string())
}

async fn sniff_mime(path: &Path) -> std::io::Result<Option<String>> {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    let mut limited = tokio::fs::File::open(path).await?.take(SNIFF_LEN);
    limited.read_to_end(&mut head).await?;
    Ok(infer::get(&head).map(|kind| kind.mime_type().to_string()))
}
