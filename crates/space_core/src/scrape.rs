use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Builder;
use tracing::info;

use crate::client::{ClientOptions, SpaceClient};
use crate::errors::{ScrapeError, SpaceError};
use crate::models::{format_video_records, CreatorProfile, FormattedVideoRecord};
use crate::timestamp::{current_timestamp, parse_creator_id};

#[derive(Debug, Clone)]
pub struct ScrapeProgress {
    pub page: u32,
    pub fetched: u64,
}

pub type ProgressCallback = Arc<dyn Fn(ScrapeProgress) + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ScrapeOptions {
    /// Numeric mid or a space page link.
    pub creator: String,
    pub max_videos: Option<usize>,
    pub request_delay: Duration,
    pub timeout_secs: u64,
    pub cookie: Option<String>,
    pub extra_headers: HashMap<String, String>,
    pub base_url: Option<String>,
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            creator: String::new(),
            max_videos: None,
            request_delay: Duration::from_secs(1),
            timeout_secs: 10,
            cookie: None,
            extra_headers: HashMap::new(),
            base_url: None,
            progress_callback: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeResult {
    #[serde(rename = "user_info")]
    pub profile: CreatorProfile,
    pub videos: Vec<FormattedVideoRecord>,
    #[serde(rename = "total_videos")]
    pub count: usize,
    #[serde(rename = "scrape_time")]
    pub produced_at: String,
}

impl SpaceClient {
    /// Profile, then every page, then formatting.
    ///
    /// Only a missing profile fails the scrape; page failures just end
    /// pagination early.
    pub async fn scrape(
        &self,
        mid: u64,
        max_videos: Option<usize>,
        progress: Option<&ProgressCallback>,
    ) -> Result<ScrapeResult, SpaceError> {
        info!("开始抓取UP主 {mid}");
        let profile = self.fetch_creator_profile(mid).await?;
        info!("UP主: {}", profile.name);

        let raw = self.fetch_all_videos(mid, max_videos, progress).await;
        let videos = format_video_records(raw, Some(&profile));

        Ok(ScrapeResult {
            count: videos.len(),
            profile,
            videos,
            produced_at: current_timestamp(),
        })
    }
}

pub async fn scrape_space(options: ScrapeOptions) -> Result<ScrapeResult, ScrapeError> {
    let mid = parse_creator_id(&options.creator)
        .map_err(|err| ScrapeError::from(err).context("解析UP主标识失败"))?;
    let client_options = ClientOptions {
        timeout: Duration::from_secs(options.timeout_secs),
        request_delay: options.request_delay,
        cookie: options.cookie.clone(),
        extra_headers: options.extra_headers.clone(),
        base_url: options.base_url.clone(),
    };
    let client = SpaceClient::new(client_options)?;

    client
        .scrape(mid, options.max_videos, options.progress_callback.as_ref())
        .await
        .map_err(ScrapeError::from)
}

pub fn scrape_space_blocking(options: ScrapeOptions) -> Result<ScrapeResult, ScrapeError> {
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| SpaceError::Other(format!("Tokio运行时初始化失败: {err}")))?;
    rt.block_on(scrape_space(options))
}
