//! Remote metadata collaborator: computes filesystem metadata and content
//! hashes for uploaded files and forgets the bytes afterwards.

use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::web;
use dupecheck_core::hashing::DigestAlgorithm;
use std::path::PathBuf;

pub mod controllers;
pub mod errors;

#[derive(Debug, Clone)]
pub struct AppData {
    pub upload_dir: PathBuf,
    pub digest: DigestAlgorithm,
    pub max_files: usize,
}

/// Permissive CORS: the caller may be served from a different origin.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add((
            "Access-Control-Allow-Headers",
            "Origin, X-Requested-With, Content-Type, Accept",
        ))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/upload")
            .route(web::post().to(controllers::upload::create))
            .route(web::method(Method::OPTIONS).to(controllers::upload::preflight)),
    )
    .route("/health", web::get().to(controllers::health::index));
}
