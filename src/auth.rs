// ABOUTME: Credential discovery for the Canvas API
// ABOUTME: Reads API_KEY / API_URL as data from the file named by CANVAS_CREDENTIAL_FILE

use crate::{Error, Result};
use std::env;
use std::fs;
use std::path::Path;

pub const CREDENTIAL_FILE_VAR: &str = "CANVAS_CREDENTIAL_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_url: String,
}

/// Resolve credentials from the file named by `CANVAS_CREDENTIAL_FILE`.
///
/// `url_override` replaces `API_URL` from the file, which then becomes optional.
pub fn resolve_credentials(url_override: Option<String>) -> Result<Credentials> {
    let location = env::var(CREDENTIAL_FILE_VAR).map_err(|_| {
        Error::Setup(format!(
            "{} must name the file containing your Canvas API_KEY, including the file name",
            CREDENTIAL_FILE_VAR
        ))
    })?;

    let creds = parse_credential_file(Path::new(&location), url_override)?;
    tracing::info!("using canvas with API_KEY as defined in {}", location);
    Ok(creds)
}

/// Parse `KEY = "value"` lines. Simple assignment files written for older
/// tooling are valid input; the contents are never evaluated.
pub fn parse_credential_file(path: &Path, url_override: Option<String>) -> Result<Credentials> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Setup(format!("cannot read credential file {}: {}", path.display(), e))
    })?;

    let table: toml::Table = content.parse().map_err(|e: toml::de::Error| {
        Error::Setup(format!(
            "credential file {} is not a list of KEY = \"value\" lines: {}",
            path.display(),
            e.message()
        ))
    })?;

    let api_key = match table.get("API_KEY").and_then(|v| v.as_str()) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => {
            return Err(Error::Setup(format!(
                "make sure that {} contains a line defining a string `API_KEY = \"keyhere\"`",
                path.display()
            )))
        }
    };

    let api_url = match url_override {
        Some(url) => url,
        None => table
            .get("API_URL")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Setup(format!(
                    "{} defines no string API_URL and no --api-url was given",
                    path.display()
                ))
            })?,
    };

    Ok(Credentials { api_key, api_url })
}
