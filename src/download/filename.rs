//! Destination filename derivation for downloads.
//!
//! The local filename is the percent-decoded last path segment of the URL,
//! sanitized for filesystem safety. URLs with no final segment (e.g.
//! `https://example.com/`) get a deterministic hash-based fallback name
//! instead of an error.

use std::path::{Component, Path};

use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

/// Derives the destination filename for a URL.
///
/// Returns the sanitized, percent-decoded final path segment, or
/// `download_<hash>.bin` when the path has no final segment. The hash is the
/// first 8 bytes of the SHA-256 of the full URL, so the fallback is stable
/// across runs and distinct per URL.
#[must_use]
pub fn filename_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
            last.into()
        });
        let sanitized = sanitize_filename(&decoded);
        if !sanitized.trim_matches('_').is_empty() {
            return sanitized;
        }
    }

    fallback_filename(url.as_str())
}

/// Deterministic fallback name for URLs whose path has no usable segment.
fn fallback_filename(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hash = String::with_capacity(16);
    for byte in &digest[..8] {
        hash.push_str(&format!("{byte:02x}"));
    }
    format!("download_{hash}.bin")
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces separators and characters invalid on common filesystems, and
/// rewrites dot-only segments so the result can never escape the output
/// directory.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
