use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Video Downloader CLI", long_about = None)]
pub struct Args {
    /// Path to the text file containing video links (Title - URL format)
    #[arg(index = 1)]
    pub file: PathBuf,

    /// Folder to save downloaded videos (defaults to the current directory)
    #[arg(short = 'd', long = "download_folder", visible_alias = "download-folder")]
    pub download_folder: Option<PathBuf>,

    /// Optional TOML file with engine settings
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Do not draw progress bars
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

impl Args {
    pub fn download_folder(&self) -> std::io::Result<PathBuf> {
        match &self.download_folder {
            Some(folder) => Ok(folder.clone()),
            None => std::env::current_dir(),
        }
    }
}
