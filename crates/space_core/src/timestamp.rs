use chrono::{DateTime, FixedOffset, Local, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::errors::SpaceError;

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const PLATFORM_UTC_OFFSET_SECS: i32 = 8 * 3600;

lazy_static! {
    static ref SPACE_PATH: Regex = Regex::new(r"^/(\d+)(?:/|$)").expect("space路径正则");
}

pub fn current_timestamp() -> String {
    Local::now().format(TS_FORMAT).to_string()
}

/// Renders a publish epoch in the platform's timezone (UTC+8); 0 means unknown.
pub fn format_publish_time(epoch: i64) -> String {
    if epoch == 0 {
        return String::new();
    }
    let Some(offset) = FixedOffset::east_opt(PLATFORM_UTC_OFFSET_SECS) else {
        return String::new();
    };
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|utc| utc.with_timezone(&offset).format(TS_FORMAT).to_string())
        .unwrap_or_default()
}

/// Accepts a bare mid, `UID:123`, or a `space.bilibili.com/<mid>` link.
pub fn parse_creator_id(input: &str) -> Result<u64, SpaceError> {
    let trimmed = input.trim();
    let bare = trimmed
        .strip_prefix("UID:")
        .or_else(|| trimmed.strip_prefix("uid:"))
        .unwrap_or(trimmed)
        .trim();
    if !bare.is_empty() && bare.chars().all(|ch| ch.is_ascii_digit()) {
        return bare
            .parse::<u64>()
            .map_err(|_| SpaceError::InvalidCreator(format!("mid数值无效: {bare}")));
    }

    let url = Url::parse(trimmed)
        .map_err(|err| SpaceError::InvalidCreator(format!("URL解析失败: {err}")))?;
    if url.host_str() != Some("space.bilibili.com") {
        return Err(SpaceError::InvalidCreator(format!(
            "不是UP主空间链接: {trimmed}"
        )));
    }
    let captures = SPACE_PATH.captures(url.path()).ok_or_else(|| {
        SpaceError::InvalidCreator("未在链接路径中找到mid".to_string())
    })?;
    captures[1]
        .parse::<u64>()
        .map_err(|_| SpaceError::InvalidCreator(format!("mid数值无效: {}", &captures[1])))
}
