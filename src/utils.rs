use std::path::{Path, PathBuf};

/// Turns a free-form title into a file stem: whitespace becomes `_`,
/// single and double quotes are dropped.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

pub fn destination_path(folder: &Path, title: &str, extension: &str) -> PathBuf {
    let stem = sanitize_filename(title);
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        folder.join(stem)
    } else {
        folder.join(format!("{}.{}", stem, extension))
    }
}
