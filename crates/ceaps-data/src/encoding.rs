//! Character-encoding detection for the raw Senate exports.
//!
//! The CEAPS portal has shipped files as Windows-1252/Latin-1 in some years
//! and UTF-8 in others, so `--encoding auto` sniffs each file from its byte
//! content. The guess is best-effort; the loader still fails fast when the
//! resolved encoding cannot decode the bytes.

use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use ceaps_core::error::{PipelineError, Result};

// ── Public API ────────────────────────────────────────────────────────────────

/// Read `path` fully and return the best-guess encoding label.
///
/// The caller must tolerate decode failures downstream; a label is a guess,
/// not a guarantee.
pub fn detect_encoding(path: &Path) -> Result<&'static str> {
    let bytes = std::fs::read(path).map_err(|source| PipelineError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(sniff_encoding(&bytes).name())
}

/// Guess the encoding of raw byte content.
///
/// Order: BOM, then strict UTF-8 validation, then Windows-1252 (the superset
/// of Latin-1 the Senate files actually use). Windows-1252 decodes any byte
/// sequence, so it doubles as the fallback.
pub fn sniff_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }
    WINDOWS_1252
}

/// Resolve a user-supplied encoding label (e.g. `"latin1"`, `"utf-8"`,
/// `"Windows-1258"`) to an [`Encoding`].
pub fn resolve_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| PipelineError::Config(format!("unknown encoding label: {label}")))
}

/// Strictly decode `bytes` under `encoding`.
///
/// Any malformed sequence is an error, not a replacement character: a wrong
/// encoding must abort the load rather than ship mojibake downstream.
pub fn decode(bytes: &[u8], encoding: &'static Encoding, path: &Path) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(PipelineError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
