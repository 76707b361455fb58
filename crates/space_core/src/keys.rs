use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use crate::errors::SpaceError;
use crate::models::{ApiResponse, NavPayload};

pub const KEY_TTL_SECS: i64 = 3600;

/// `-101` is "not logged in"; the nav payload still carries `wbi_img`.
const ACCEPTED_NAV_CODES: [i32; 2] = [0, -101];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFragmentPair {
    pub img_key: String,
    pub sub_key: String,
    pub fetched_at: DateTime<Utc>,
}

impl KeyFragmentPair {
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            img_key: String::new(),
            sub_key: String::new(),
            fetched_at: at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.img_key.is_empty() || self.sub_key.is_empty()
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) < Duration::seconds(KEY_TTL_SECS)
    }
}

#[derive(Clone)]
pub struct WbiKeyProvider {
    client: Client,
    nav_url: String,
    cached: Arc<Mutex<Option<KeyFragmentPair>>>,
}

impl WbiKeyProvider {
    pub fn new(client: Client, nav_url: impl Into<String>) -> Self {
        Self {
            client,
            nav_url: nav_url.into(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn key_fragments(&self) -> KeyFragmentPair {
        self.key_fragments_at(Utc::now()).await
    }

    pub async fn key_fragments_at(&self, now: DateTime<Utc>) -> KeyFragmentPair {
        if let Some(pair) = self.cached_pair(now) {
            return pair;
        }
        match self.fetch_key_fragments(now).await {
            Ok(pair) => {
                if let Ok(mut slot) = self.cached.lock() {
                    *slot = Some(pair.clone());
                }
                pair
            }
            Err(err) => {
                warn!("获取WBI密钥失败，后续请求将不带签名: {err}");
                KeyFragmentPair::empty(now)
            }
        }
    }

    fn cached_pair(&self, now: DateTime<Utc>) -> Option<KeyFragmentPair> {
        let slot = self.cached.lock().ok()?;
        slot.as_ref().filter(|pair| pair.is_fresh(now)).cloned()
    }

    async fn fetch_key_fragments(
        &self,
        now: DateTime<Utc>,
    ) -> Result<KeyFragmentPair, SpaceError> {
        debug!("请求nav接口获取WBI密钥: {}", self.nav_url);
        let response = self.client.get(&self.nav_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SpaceError::KeysUnavailable(format!("HTTP请求失败: {status}")));
        }
        let bytes = response.bytes().await?;
        let payload: ApiResponse<NavPayload> = serde_json::from_slice(&bytes)
            .map_err(|err| SpaceError::InvalidJson(err.to_string()))?;
        if !ACCEPTED_NAV_CODES.contains(&payload.code) {
            return Err(SpaceError::Api {
                code: payload.code,
                message: payload.message_or_unknown(),
            });
        }
        let wbi_img = payload
            .data
            .and_then(|data| data.wbi_img)
            .ok_or_else(|| SpaceError::KeysUnavailable("响应缺少wbi_img字段".to_string()))?;

        let img_key = fragment_from_url(&wbi_img.img_url).ok_or_else(|| {
            SpaceError::KeysUnavailable(format!("img_url无效: {}", wbi_img.img_url))
        })?;
        let sub_key = fragment_from_url(&wbi_img.sub_url).ok_or_else(|| {
            SpaceError::KeysUnavailable(format!("sub_url无效: {}", wbi_img.sub_url))
        })?;

        Ok(KeyFragmentPair {
            img_key,
            sub_key,
            fetched_at: now,
        })
    }
}

pub fn fragment_from_url(url: &str) -> Option<String> {
    let file_name = url.rsplit('/').next()?;
    let stem = file_name.split('.').next()?.trim();
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
