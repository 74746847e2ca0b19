// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines all subcommands and global flags

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "md2canvas")]
#[command(about = "Publish folders of markdown course material to Canvas", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Canvas base URL (overrides API_URL from the credential file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Canvas course id
    #[arg(long, global = true, env = "CANVAS_COURSE_ID")]
    pub course: Option<u64>,

    /// Also append logs to a file; `--log-file=PATH`, or a dated name in the
    /// current directory when no path is given
    #[arg(long, global = true, require_equals = true, num_args = 0..=1, value_name = "PATH")]
    pub log_file: Option<Option<PathBuf>>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Publish content folders (pages, assignments, files, links)
    Publish {
        /// Folders containing meta.json
        #[arg(required = true)]
        folders: Vec<PathBuf>,

        /// Update items that already exist instead of failing
        #[arg(long)]
        overwrite: bool,

        /// Stop at the first item that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// Render a content folder to result.html without contacting Canvas
    Render {
        /// Folder containing meta.json and source.md
        folder: PathBuf,
    },

    /// Download course pages into local content folders
    DownloadPages {
        /// Directory that receives one folder per page
        destination: PathBuf,

        /// Replace folders that already exist
        #[arg(long)]
        even_if_exists: bool,

        /// Only pages whose title matches this regex
        #[arg(long)]
        filter: Option<String>,
    },

    /// Delete a module by name
    DeleteModule {
        name: String,

        /// Succeed quietly when the module does not exist
        #[arg(long)]
        missing_ok: bool,
    },
}

impl Cli {
    /// Log file requested on the command line, if any.
    pub fn log_file(&self) -> Option<PathBuf> {
        match &self.log_file {
            Some(Some(path)) => Some(path.clone()),
            Some(None) => Some(crate::logging::default_log_file()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_publish() {
        let cli = Cli::try_parse_from([
            "md2canvas", "--course", "42", "publish", "week1/intro", "week1/hw", "--overwrite",
        ])
        .unwrap();
        assert_eq!(cli.course, Some(42));
        match cli.command {
            Commands::Publish { folders, overwrite, fail_fast } => {
                assert_eq!(folders.len(), 2);
                assert!(overwrite);
                assert!(!fail_fast);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_publish_requires_folder() {
        assert!(Cli::try_parse_from(["md2canvas", "publish"]).is_err());
    }

    #[test]
    fn test_log_file_default_name() {
        let cli = Cli::try_parse_from(["md2canvas", "render", "page", "--log-file"]).unwrap();
        let path = cli.log_file().unwrap();
        assert!(path.to_string_lossy().starts_with("md2canvas_"));

        let cli = Cli::try_parse_from(["md2canvas", "render", "page"]).unwrap();
        assert!(cli.log_file().is_none());
    }

    #[test]
    fn test_bare_log_file_does_not_swallow_subcommand() {
        let cli = Cli::try_parse_from(["md2canvas", "--log-file", "publish", "week1"]).unwrap();
        assert!(cli.log_file().is_some());
        assert_ne!(cli.log_file(), Some(PathBuf::from("publish")));
        match cli.command {
            Commands::Publish { folders, .. } => assert_eq!(folders, vec![PathBuf::from("week1")]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_log_file_explicit() {
        let cli =
            Cli::try_parse_from(["md2canvas", "--log-file=run.log", "render", "page"]).unwrap();
        assert_eq!(cli.log_file(), Some(PathBuf::from("run.log")));
    }
}
