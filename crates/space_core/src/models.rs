use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::timestamp::format_publish_time;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn message_or_unknown(&self) -> String {
        self.message
            .clone()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavPayload {
    pub wbi_img: Option<WbiImg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WbiImg {
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub sub_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArcSearchPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub list: ArcList,
    pub page: Option<ArcPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArcList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub vlist: Vec<VideoRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArcPage {
    #[serde(default)]
    pub pn: u32,
    #[serde(default)]
    pub ps: u32,
    #[serde(default)]
    pub count: u64,
}

/// Creator attributes as reported by `/x/space/acc/info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreatorProfile {
    #[serde(default)]
    pub mid: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub face: String,
    #[serde(default)]
    pub sign: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub level: i64,
    #[serde(default)]
    pub birthday: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub coins: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub fans: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub friend: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub attention: i64,
}

/// One entry of `data.list.vlist`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoRecord {
    #[serde(default)]
    pub aid: i64,
    #[serde(default)]
    pub bvid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pic: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub mid: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub play: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub video_review: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub favorites: i64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub created: i64,
    #[serde(default)]
    pub length: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormattedVideoRecord {
    pub title: String,
    pub bvid: String,
    pub aid: i64,
    pub pic: String,
    pub author: String,
    pub mid: u64,
    pub play: i64,
    pub video_review: i64,
    pub favorites: i64,
    pub created: String,
    pub length: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_face: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_sign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_fans: Option<i64>,
}

impl FormattedVideoRecord {
    pub fn from_raw(record: VideoRecord, profile: Option<&CreatorProfile>) -> Self {
        Self {
            title: record.title,
            bvid: record.bvid,
            aid: record.aid,
            pic: record.pic,
            author: record.author,
            mid: record.mid,
            play: record.play,
            video_review: record.video_review,
            favorites: record.favorites,
            created: format_publish_time(record.created),
            length: record.length,
            description: record.description,
            up_name: profile.map(|p| p.name.clone()),
            up_face: profile.map(|p| p.face.clone()),
            up_sign: profile.map(|p| p.sign.clone()),
            up_level: profile.map(|p| p.level),
            up_fans: profile.map(|p| p.fans),
        }
    }
}

pub fn format_video_records(
    records: Vec<VideoRecord>,
    profile: Option<&CreatorProfile>,
) -> Vec<FormattedVideoRecord> {
    records
        .into_iter()
        .map(|record| FormattedVideoRecord::from_raw(record, profile))
        .collect()
}

/// Counters come back as numbers, numeric strings, or placeholders like `"--"`.
fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or_default(),
        Some(Value::String(text)) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
