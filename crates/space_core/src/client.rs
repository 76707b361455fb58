use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::errors::SpaceError;
use crate::keys::WbiKeyProvider;
use crate::models::{ApiResponse, ArcSearchPayload, CreatorProfile, VideoRecord};
use crate::scrape::{ProgressCallback, ScrapeProgress};
use crate::wbi::{mixin_key, sign_params, SignedParams};

pub const DEFAULT_BASE_URL: &str = "https://api.bilibili.com";
pub const NAV_PATH: &str = "/x/web-interface/nav";
pub const ARC_SEARCH_PATH: &str = "/x/space/wbi/arc/search";
pub const ACC_INFO_PATH: &str = "/x/space/acc/info";

pub const MAX_PAGE_SIZE: u32 = 50;

/// Returned when the request was intercepted by risk control.
pub const RISK_CONTROL_CODE: i32 = -412;

pub const DEFAULT_HEADERS: [(&str, &str); 2] = [
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0 Safari/537.36",
    ),
    ("referer", "https://www.bilibili.com/"),
];

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub request_delay: Duration,
    pub cookie: Option<String>,
    pub extra_headers: HashMap<String, String>,
    pub base_url: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            request_delay: Duration::from_secs(1),
            cookie: None,
            extra_headers: HashMap::new(),
            base_url: None,
        }
    }
}

#[derive(Clone)]
pub struct SpaceClient {
    client: Client,
    base_url: String,
    keys: WbiKeyProvider,
    options: ClientOptions,
}

impl SpaceClient {
    pub fn new(options: ClientOptions) -> Result<Self, SpaceError> {
        let mut headers = HeaderMap::new();
        for (name, value) in DEFAULT_HEADERS.iter() {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        if let Some(cookie) = &options.cookie {
            headers.insert(
                HeaderName::from_static("cookie"),
                HeaderValue::from_str(cookie)
                    .map_err(|err| SpaceError::Other(format!("Cookie格式无效: {err}")))?,
            );
        }
        for (key, value) in &options.extra_headers {
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|err| SpaceError::Other(format!("Header名无效: {err}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|err| SpaceError::Other(format!("Header值无效: {err}")))?;
            headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .build()
            .map_err(SpaceError::Request)?;

        let base_url = options
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let keys = WbiKeyProvider::new(client.clone(), format!("{base_url}{NAV_PATH}"));

        Ok(Self {
            client,
            base_url,
            keys,
            options,
        })
    }

    pub fn keys(&self) -> &WbiKeyProvider {
        &self.keys
    }

    pub async fn fetch_page(&self, mid: u64, page: u32, page_size: u32) -> Vec<VideoRecord> {
        let result = self.try_fetch_page(mid, page, page_size).await;
        self.pace().await;
        match result {
            Ok(videos) => videos,
            Err(err) => {
                warn!("获取第 {page} 页视频失败: {err}");
                Vec::new()
            }
        }
    }

    pub async fn fetch_all_videos(
        &self,
        mid: u64,
        max_videos: Option<usize>,
        progress: Option<&ProgressCallback>,
    ) -> Vec<VideoRecord> {
        let mut videos = Vec::new();
        if max_videos == Some(0) {
            return videos;
        }

        info!("开始获取UP主 {mid} 的视频列表");
        let mut page = 1u32;
        loop {
            debug!("正在获取第 {page} 页");
            let batch = self.fetch_page(mid, page, MAX_PAGE_SIZE).await;
            if batch.is_empty() {
                info!("第 {page} 页没有视频，停止翻页");
                break;
            }
            let batch_len = batch.len();
            videos.extend(batch);
            info!("第 {page} 页获取到 {batch_len} 个视频");

            let reached_limit = max_videos.is_some_and(|max| videos.len() >= max);
            if let Some(max) = max_videos.filter(|_| reached_limit) {
                videos.truncate(max);
            }
            if let Some(callback) = progress {
                callback(ScrapeProgress {
                    page,
                    fetched: videos.len() as u64,
                });
            }
            if reached_limit || batch_len < MAX_PAGE_SIZE as usize {
                break;
            }
            page += 1;
        }
        info!("共获取 {} 个视频", videos.len());
        videos
    }

    /// Unsigned first; a `-412` answer gets exactly one signed retry.
    pub async fn fetch_creator_profile(&self, mid: u64) -> Result<CreatorProfile, SpaceError> {
        let result = self.try_fetch_profile(mid).await;
        self.pace().await;
        result
    }

    async fn try_fetch_page(
        &self,
        mid: u64,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<VideoRecord>, SpaceError> {
        let params = [
            ("mid", mid.to_string()),
            ("ps", page_size.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("pn", page.to_string()),
            ("order", "pubdate".to_string()),
        ];
        let query = self.sign(&params).await;
        let envelope: ApiResponse<ArcSearchPayload> =
            self.get_envelope(ARC_SEARCH_PATH, &query).await?;
        if envelope.code != 0 {
            return Err(SpaceError::Api {
                code: envelope.code,
                message: envelope.message_or_unknown(),
            });
        }
        let payload = envelope
            .data
            .ok_or_else(|| SpaceError::InvalidJson("响应缺少data字段".to_string()))?;
        if let Some(page_info) = &payload.page {
            debug!(
                "分页信息: pn={}, ps={}, count={}",
                page_info.pn, page_info.ps, page_info.count
            );
        }
        Ok(payload.list.vlist)
    }

    async fn try_fetch_profile(&self, mid: u64) -> Result<CreatorProfile, SpaceError> {
        let params = [("mid", mid.to_string())];
        let unsigned = SignedParams::unsigned(params.iter().map(|(k, v)| (*k, v)));
        let mut envelope: ApiResponse<CreatorProfile> =
            self.get_envelope(ACC_INFO_PATH, &unsigned).await?;

        if envelope.code == RISK_CONTROL_CODE {
            warn!("请求被拦截(code={RISK_CONTROL_CODE})，尝试使用WBI签名重试");
            let signed = self.sign(&params).await;
            envelope = self.get_envelope(ACC_INFO_PATH, &signed).await?;
        }

        if envelope.code != 0 {
            return Err(SpaceError::ProfileNotFound {
                mid,
                code: envelope.code,
                message: envelope.message_or_unknown(),
            });
        }
        let mut profile = envelope.data.ok_or_else(|| SpaceError::ProfileNotFound {
            mid,
            code: 0,
            message: "响应缺少data字段".to_string(),
        })?;
        if profile.mid == 0 {
            profile.mid = mid;
        }
        Ok(profile)
    }

    async fn sign(&self, params: &[(&str, String)]) -> SignedParams {
        let pairs = params.iter().map(|(k, v)| (*k, v));
        let fragments = self.keys.key_fragments().await;
        if fragments.is_empty() {
            debug!("WBI密钥为空，发送未签名请求");
            return SignedParams::unsigned(pairs);
        }
        let key = mixin_key(&fragments.img_key, &fragments.sub_key);
        sign_params(pairs, &key, Utc::now().timestamp())
    }

    async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &SignedParams,
    ) -> Result<ApiResponse<T>, SpaceError> {
        let url = format!("{}{}?{}", self.base_url, path, query.to_query_string());
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        match serde_json::from_slice::<ApiResponse<T>>(&bytes) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => {
                Err(SpaceError::Other(format!("HTTP请求失败: {status}")))
            }
            Err(err) => Err(SpaceError::InvalidJson(err.to_string())),
        }
    }

    async fn pace(&self) {
        if !self.options.request_delay.is_zero() {
            tokio::time::sleep(self.options.request_delay).await;
        }
    }
}
