use crate::package_metadata::domain::{Cursor, StreamPosition, SyncConfiguration};
use crate::ports::outbound::{FileSource, RawRecords, RemoteFile};
use crate::shared::error::SyncError;
use crate::shared::security::MAX_BUNDLE_FILE_SIZE;
use crate::shared::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::Deserialize;
use std::io::{self, BufRead};
use std::time::Duration;

/// One page of an object listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectListing {
    #[serde(default)]
    items: Vec<ObjectEntry>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

/// BucketFileSource adapter reading a stream from a remote bucket
///
/// Talks to the bucket JSON API: objects are listed page by page with
/// `prefix`, `startOffset` and `pageToken`, and downloaded one at a time
/// with `alt=media`. Pages are only requested as the listing is consumed.
pub struct BucketFileSource {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    prefix: String,
    extension: &'static str,
    max_retries: u32,
}

impl BucketFileSource {
    const TIMEOUT_SECONDS: u64 = 60;

    /// Creates the source for `config`'s stream in `bucket`
    pub fn new(base_url: &str, bucket: &str, config: &SyncConfiguration) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("advisory-sync/{}", version);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(Self::TIMEOUT_SECONDS))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            prefix: config.file_prefix(),
            extension: config.file_extension(),
            max_retries: 3,
        })
    }

    fn listing_url(&self, start_offset: Option<&str>, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/b/{}/o?prefix={}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(&self.prefix)
        );
        if let Some(offset) = start_offset {
            url.push_str("&startOffset=");
            url.push_str(&urlencoding::encode(offset));
        }
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    fn download_url(&self, object_name: &str) -> String {
        format!(
            "{}/b/{}/o/{}?alt=media",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(object_name)
        )
    }

    /// First object name a listing after `position` needs to consider
    fn start_offset(&self, position: StreamPosition) -> Option<String> {
        position
            .cursor()
            .map(|cursor| format!("{}{}", self.prefix, cursor.file_name(self.extension)))
    }

    /// Turns a page of object names into the files of this stream, in order
    fn files_in(&self, entries: Vec<ObjectEntry>, position: StreamPosition) -> Vec<RemoteFile> {
        let mut files: Vec<RemoteFile> = entries
            .into_iter()
            .filter_map(|entry| {
                let relative = entry.name.strip_prefix(&self.prefix)?;
                match Cursor::from_file_name(relative, self.extension) {
                    Some(cursor) => Some((cursor, entry.name)),
                    None => {
                        tracing::warn!(name = %entry.name, "ignoring object outside the file layout");
                        None
                    }
                }
            })
            .filter(|(cursor, _)| position.admits(*cursor))
            .map(|(cursor, name)| RemoteFile::new(cursor, name))
            .collect();
        files.sort_by_key(|file| file.cursor());
        files
    }

    async fn list_page(
        &self,
        start_offset: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<ObjectListing> {
        let url = self.listing_url(start_offset, page_token);
        let source_error = |details: String| SyncError::Source {
            location: format!("gs://{}/{}", self.bucket, self.prefix),
            details,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| source_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(source_error(format!("listing returned status {}", response.status())).into());
        }
        let listing = response
            .json::<ObjectListing>()
            .await
            .map_err(|e| source_error(e.to_string()))?;
        Ok(listing)
    }

    async fn download(&self, object_name: &str) -> Result<Vec<u8>> {
        let mut response = self.client.get(self.download_url(object_name)).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("download returned status {}", response.status());
        }
        if let Some(length) = response.content_length() {
            check_body_size(length)?;
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            check_body_size(body.len() as u64)?;
        }
        Ok(body)
    }

    async fn download_with_retry(&self, object_name: &str) -> Result<Vec<u8>> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.download(object_name).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::debug!(object = object_name, attempt, error = %e, "download failed");
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
                    }
                }
            }
        }

        let details = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no download attempted".to_string());
        Err(SyncError::Source {
            location: format!("gs://{}/{}", self.bucket, object_name),
            details,
        }
        .into())
    }
}

#[async_trait]
impl FileSource for BucketFileSource {
    fn data_after(&self, position: StreamPosition) -> BoxStream<'_, Result<RemoteFile>> {
        let start_offset = self.start_offset(position);

        // State: Some(token) while pages remain, the first page having no token
        stream::try_unfold(Some(None::<String>), move |page| {
            let start_offset = start_offset.clone();
            async move {
                let Some(page_token) = page else {
                    return Ok::<_, anyhow::Error>(None);
                };
                let listing = self
                    .list_page(start_offset.as_deref(), page_token.as_deref())
                    .await?;
                let files = self.files_in(listing.items, position);
                let next = listing.next_page_token.map(Some);
                Ok(Some((files, next)))
            }
        })
        .map_ok(|files| stream::iter(files.into_iter().map(Ok::<_, anyhow::Error>)))
        .try_flatten()
        .boxed()
    }

    async fn open(&self, file: &RemoteFile) -> Result<RawRecords> {
        let body = self.download_with_retry(file.location()).await?;
        Ok(Box::new(io::Cursor::new(body).lines()))
    }
}

fn check_body_size(size: u64) -> Result<()> {
    if size > MAX_BUNDLE_FILE_SIZE {
        anyhow::bail!(
            "object is {} bytes, larger than the {} byte limit",
            size,
            MAX_BUNDLE_FILE_SIZE
        );
    }
    Ok(())
}
