// ABOUTME: Blocking HTTP client for the Canvas REST API
// ABOUTME: Handles auth headers, Link pagination, the three-step upload, and fail-fast errors

use crate::model::{RemoteFile, UploadTicket};
use crate::{Error, Result};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, LINK, LOCATION};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

const PAGE_SIZE: u32 = 100;

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(LINK)?.to_str().ok()?;
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        if is_next {
            Some(target.trim_start_matches('<').trim_end_matches('>').to_string())
        } else {
            None
        }
    })
}

fn with_query(url: &str, query: &str) -> String {
    if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

pub struct ApiClient {
    client: Client,
    upload_client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(token: String, base_url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        // Upload confirmations arrive as redirects that need the auth header,
        // which reqwest drops when following cross-host redirects.
        let upload_client = Client::builder()
            .timeout(Duration::from_secs(300))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(ApiClient {
            client,
            upload_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v1{}", self.base_url, endpoint)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .header("User-Agent", "md2canvas/0.3 (Rust)")
    }

    fn check(endpoint: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            let preview = truncate_str(&message, 100);
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: preview,
            });
        }
        Ok(response)
    }

    fn parse<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse response from {}: {}", endpoint, e);
            tracing::debug!("Response body (first 500 chars): {}", truncate_str(&body, 500));
            Error::Parse(e)
        })
    }

    pub fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.get_url(&self.api_url(endpoint), endpoint)
    }

    /// GET an absolute url with the API credentials.
    pub fn get_url<T: DeserializeOwned>(&self, url: &str, endpoint: &str) -> Result<T> {
        let response = self.authorized(self.client.get(url)).send()?;
        let response = Self::check(endpoint, response)?;
        Self::parse(endpoint, response)
    }

    /// GET every page of a collection endpoint, following `Link: rel="next"`.
    pub fn get_all<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let mut url = with_query(&self.api_url(endpoint), &format!("per_page={}", PAGE_SIZE));
        let mut items = Vec::new();

        loop {
            let response = self.authorized(self.client.get(&url)).send()?;
            let response = Self::check(endpoint, response)?;
            let next = next_link(response.headers());
            let mut page: Vec<T> = Self::parse(endpoint, response)?;
            items.append(&mut page);

            match next {
                Some(next_url) => url = next_url,
                None => break,
            }
        }

        Ok(items)
    }

    pub fn post<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<T> {
        let response = self
            .authorized(self.client.post(self.api_url(endpoint)))
            .json(&body)
            .send()?;
        let response = Self::check(endpoint, response)?;
        Self::parse(endpoint, response)
    }

    pub fn put<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<T> {
        let response = self
            .authorized(self.client.put(self.api_url(endpoint)))
            .json(&body)
            .send()?;
        let response = Self::check(endpoint, response)?;
        Self::parse(endpoint, response)
    }

    pub fn delete(&self, endpoint: &str) -> Result<()> {
        let response = self
            .authorized(self.client.delete(self.api_url(endpoint)))
            .send()?;
        Self::check(endpoint, response)?;
        Ok(())
    }

    /// Upload a local file through Canvas' three-step protocol.
    ///
    /// `endpoint` is the collection that receives the file (e.g.
    /// `/courses/1/files` or `/folders/9/files`); `params` carries
    /// placement options such as `parent_folder_path` and `on_duplicate`.
    pub fn upload_file(&self, endpoint: &str, path: &Path, params: Value) -> Result<RemoteFile> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Upload(format!("{} has no usable file name", path.display())))?
            .to_string();
        let size = std::fs::metadata(path)?.len();

        let mut request = serde_json::json!({ "name": name, "size": size });
        if let (Some(target), Value::Object(extra)) = (request.as_object_mut(), params) {
            target.extend(extra);
        }

        // 1. announce the upload
        let ticket: UploadTicket = self.post(endpoint, request)?;

        // 2. send the bytes to the storage url, without API credentials
        let mut form = multipart::Form::new();
        for (key, value) in ticket.upload_params {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            form = form.text(key, text);
        }
        let form = form.file("file", path)?;

        let response = self
            .upload_client
            .post(&ticket.upload_url)
            .multipart(form)
            .send()?;

        // 3. confirm
        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| Error::Upload(format!("{}: redirect without location", name)))?;
            return self.get_url(&location, endpoint);
        }

        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Upload(format!(
                "{} rejected by storage ({}): {}",
                name,
                status.as_u16(),
                truncate_str(&message, 100)
            )));
        }

        let reply: Value = Self::parse(endpoint, response)?;
        if reply.get("id").is_some() {
            return Ok(serde_json::from_value(reply)?);
        }
        match reply.get("location").and_then(|v| v.as_str()) {
            Some(location) => self.get_url(location, endpoint),
            None => Err(Error::Upload(format!(
                "{}: storage reply carried neither a file nor a location",
                name
            ))),
        }
    }
}
