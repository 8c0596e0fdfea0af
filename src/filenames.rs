use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::models::{ALLOWED_EXTENSIONS, SPREADSHEET_SUFFIX};

const FALLBACK_FILENAME: &str = "upload.pdf";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").expect("hardcoded filename regex is valid"));

/// Accepts names whose last extension is in the allow list, ignoring case.
pub fn allowed_file(filename: &str) -> bool {
    filename.rsplit_once('.').is_some_and(|(_, extension)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    })
}

/// Reduces a client-supplied name to a flat ASCII filename.
pub fn secure_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let replaced = UNSAFE_CHARS.replace_all(base, "_");
    let trimmed = replaced.trim_matches(|ch: char| ch == '.' || ch == '_');

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn unique_upload_name(filename: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), secure_filename(filename))
}

pub fn spreadsheet_name() -> String {
    format!("{}_{SPREADSHEET_SUFFIX}", Uuid::new_v4())
}

/// A download name is only served when sanitising leaves it unchanged.
pub fn is_safe_download_name(filename: &str) -> bool {
    !filename.is_empty() && secure_filename(filename) == filename
}
