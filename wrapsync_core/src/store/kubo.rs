//! Content store backed by the Kubo (IPFS) HTTP RPC API
//!
//! Trees are read with `ls` + `cat` and uploaded with a single multipart
//! `add` call using `wrap-with-directory`.

use super::ContentStore;
use crate::ClientConfig;
use crate::error::{Result, StoreError};
use crate::types::{AddedEntry, FileEntry};
use log::{debug, trace};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;

/// Characters left untouched in multipart file names, same as JavaScript's
/// `encodeURIComponent`
const FILE_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// unixfs node types that behave as directories
const DIRECTORY_TYPES: [u8; 2] = [1, 5];

/// Kubo RPC client implementing [`ContentStore`]
pub struct KuboStore {
    client: Client,
    api_base: String,
    cid_version: Option<u8>,
}

impl KuboStore {
    /// Create a store client for the RPC API below `config.store_url()`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("wrapsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::unavailable(format!("failed to build HTTP client: {e}")))?;

        let api_base = format!("{}/api/v0", config.store_url().trim_end_matches('/'));
        debug!("Kubo store endpoint: {api_base}");

        Ok(Self {
            client,
            api_base,
            cid_version: config.cid_version,
        })
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/{command}", self.api_base)
    }

    async fn post(&self, command: &str, query: &[(&str, &str)]) -> Result<Response> {
        trace!("POST {} {query:?}", self.endpoint(command));
        let response = self
            .client
            .post(self.endpoint(command))
            .query(query)
            .send()
            .await?;
        check_status(response).await
    }

    async fn ls(&self, cid: &str) -> Result<Vec<LsLink>> {
        let body = self.post("ls", &[("arg", cid)]).await?.text().await?;
        parse_ls_response(cid, &body)
    }

    async fn cat(&self, cid: &str) -> Result<Vec<u8>> {
        let bytes = self.post("cat", &[("arg", cid)]).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl ContentStore for KuboStore {
    async fn get_tree(&self, cid: &str) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        let mut pending = VecDeque::from([(String::new(), cid.to_string())]);

        while let Some((prefix, dir_cid)) = pending.pop_front() {
            for link in self.ls(&dir_cid).await? {
                let is_dir = link.is_directory();
                let path = if prefix.is_empty() {
                    link.name
                } else {
                    format!("{prefix}/{}", link.name)
                };

                if is_dir {
                    entries.push(FileEntry::new(path.clone(), Vec::new()));
                    pending.push_back((path, link.hash));
                } else {
                    let content = self.cat(&link.hash).await?;
                    trace!("Fetched {path} ({} bytes)", content.len());
                    entries.push(FileEntry::new(path, content));
                }
            }
        }

        debug!("Retrieved {} entries below {cid}", entries.len());
        Ok(entries)
    }

    async fn put_directory(&self, files: &[FileEntry]) -> Result<Vec<AddedEntry>> {
        // File names are already percent-encoded; reqwest must not encode them again
        let mut form = Form::new().percent_encode_noop();
        for file in files {
            let part = Part::bytes(file.content().to_vec())
                .file_name(encode_file_name(file.path()))
                .mime_str("application/octet-stream")?;
            form = form.part("file", part);
        }

        let version = self.cid_version.map(|v| v.to_string());
        let mut query = vec![
            ("wrap-with-directory", "true"),
            ("pin", "true"),
            ("progress", "false"),
        ];
        if let Some(version) = version.as_deref() {
            query.push(("cid-version", version));
        }

        trace!("POST {} with {} files", self.endpoint("add"), files.len());
        let response = self
            .client
            .post(self.endpoint("add"))
            .query(&query)
            .multipart(form)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;

        parse_add_response(&body)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::http(status.as_u16(), kubo_error_message(&body)).into())
}

/// Extract the `Message` field of a Kubo error body, falling back to the raw text
fn kubo_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct KuboError {
        #[serde(rename = "Message")]
        message: String,
    }

    serde_json::from_str::<KuboError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn encode_file_name(path: &str) -> String {
    utf8_percent_encode(path, FILE_NAME_ENCODE_SET).to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LsResponse {
    #[serde(default)]
    objects: Vec<LsObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LsObject {
    #[serde(default)]
    links: Vec<LsLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LsLink {
    name: String,
    hash: String,
    #[serde(rename = "Type", default)]
    kind: u8,
}

impl LsLink {
    fn is_directory(&self) -> bool {
        DIRECTORY_TYPES.contains(&self.kind)
    }
}

fn parse_ls_response(cid: &str, body: &str) -> Result<Vec<LsLink>> {
    let response: LsResponse = serde_json::from_str(body)?;
    let object = response
        .objects
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::malformed(format!("ls of {cid} returned no objects")))?;

    for link in &object.links {
        if link.name.is_empty() || link.name.contains('/') || link.name == ".." {
            return Err(StoreError::malformed(format!(
                "ls of {cid} returned invalid link name '{}'",
                link.name
            ))
            .into());
        }
    }

    Ok(object.links)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddLine {
    #[serde(default)]
    name: String,
    hash: Option<String>,
}

/// Parse the newline-delimited JSON body of `add`, skipping progress lines
fn parse_add_response(body: &str) -> Result<Vec<AddedEntry>> {
    let mut added = Vec::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let entry: AddLine = serde_json::from_str(line)?;
        if let Some(hash) = entry.hash {
            added.push(AddedEntry::new(entry.name, hash));
        }
    }
    Ok(added)
}
