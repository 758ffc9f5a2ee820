//! Embedded browser view
//!
//! Falls back to the `ui/` directory on disk so the page can be edited
//! without rebuilding.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;
use std::path::{Component, Path as FsPath, PathBuf};

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

/// Only plain relative names; a root or `..` would escape `ui/` on join
fn is_contained(path: &str) -> bool {
    !path.is_empty()
        && FsPath::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn asset(path: &str) -> Option<Vec<u8>> {
    if !is_contained(path) {
        return None;
    }

    if let Some(content) = Assets::get(path) {
        return Some(content.data.into_owned());
    }

    let fs_path = PathBuf::from("ui").join(path);
    std::fs::read(fs_path).ok()
}

/// Serve a file from `ui/`
pub async fn serve_static(Path(path): Path<String>) -> Response {
    if !is_contained(&path) {
        tracing::debug!(path = %path, "Rejected asset path");
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    match asset(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref().to_string())], content).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// The page shell
pub fn get_index_html() -> Option<String> {
    asset("index.html").and_then(|bytes| String::from_utf8(bytes).ok())
}
