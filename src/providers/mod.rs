pub mod list_file;

use std::path::PathBuf;

pub use list_file::{parse_line, read_request_list};

/// One `(title, url)` entry bound to the folder it should land in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    pub title: String,
    pub source_url: String,
    pub destination_folder: PathBuf,
}

impl DownloadRequest {
    pub fn new(
        title: impl Into<String>,
        source_url: impl Into<String>,
        destination_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            destination_folder: destination_folder.into(),
        }
    }
}
