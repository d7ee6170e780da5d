use std::path::{Path, PathBuf};

use markguard_model::{ImageUpload, ScanHistoryPage};
use thiserror::Error;

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectImage(PathBuf),
    SetPartNumber(String),
    Submit,
    Refresh,
    History { page: u32, limit: u32 },
    Show,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`, type `help` for a list")]
    Unknown(String),

    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    #[error("`{0}` is not a positive number")]
    InvalidNumber(String),
}

pub const HELP: &str = "\
commands:
  image <path>            choose the IC photograph to submit
  part <part number>      set the declared part number
  scan                    submit the image and part number
  refresh                 fetch the dashboard now
  history [page] [limit]  list past scans
  show                    redraw the dashboard, form and last result
  help                    this text
  quit                    leave";

fn positive(raw: &str) -> Result<u32, CommandError> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::InvalidNumber(raw.to_string())),
    }
}

impl Command {
    /// Parses a line; blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "image" | "file" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("image"));
                }
                Command::SelectImage(PathBuf::from(rest))
            }
            // An empty part number is allowed here; submit rejects it.
            "part" => Command::SetPartNumber(rest.to_string()),
            "scan" | "submit" => Command::Submit,
            "refresh" => Command::Refresh,
            "history" => {
                let mut args = rest.split_whitespace();
                let page = args
                    .next()
                    .map(positive)
                    .transpose()?
                    .unwrap_or(ScanHistoryPage::DEFAULT_PAGE);
                let limit = args
                    .next()
                    .map(positive)
                    .transpose()?
                    .unwrap_or(ScanHistoryPage::DEFAULT_LIMIT);
                Command::History { page, limit }
            }
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(verb.to_string())),
        };
        Ok(Some(command))
    }
}

/// Reads an image from disk for submission.
pub async fn load_image(path: &Path) -> std::io::Result<ImageUpload> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImageUpload::new(file_name, bytes))
}
