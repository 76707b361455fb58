use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};
use serde_json::Value;
use tracing::info;

use crate::errors::SpaceError;
use crate::models::FormattedVideoRecord;
use crate::scrape::ScrapeResult;

pub const PROFILE_FIELDNAMES: [&str; 13] = [
    "uid",
    "name",
    "sex",
    "face",
    "sign",
    "level",
    "birthday",
    "coins",
    "fans",
    "friend",
    "attention",
    "scrape_time",
    "total_videos",
];

const TOP_VIDEOS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Both,
}

impl ExportFormat {
    pub fn includes_json(self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::Both)
    }

    pub fn includes_csv(self) -> bool {
        matches!(self, ExportFormat::Csv | ExportFormat::Both)
    }
}

/// Writes the selected sinks into `output_dir` and returns the files created.
pub fn export_result(
    result: &ScrapeResult,
    output_dir: &Path,
    format: ExportFormat,
    summary: bool,
    encoding: &str,
) -> Result<Vec<PathBuf>, SpaceError> {
    std::fs::create_dir_all(output_dir)?;
    let mid = result.profile.mid;
    let mut written = Vec::new();

    if format.includes_json() {
        let path = output_dir.join(format!("videos_{mid}.json"));
        write_json(result, &path)?;
        written.push(path);
    }
    if format.includes_csv() {
        let path = output_dir.join(format!("videos_{mid}.csv"));
        if write_videos_csv(&result.videos, &path, encoding)? > 0 {
            written.push(path);
        } else {
            info!("没有视频数据，跳过视频CSV导出");
        }
        let path = output_dir.join(format!("user_{mid}.csv"));
        write_profile_csv(result, &path, encoding)?;
        written.push(path);
    }
    if summary {
        let path = output_dir.join(format!("summary_{mid}.txt"));
        write_summary(result, &path)?;
        written.push(path);
    }
    Ok(written)
}

pub fn write_json(result: &ScrapeResult, path: &Path) -> Result<(), SpaceError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|err| SpaceError::InvalidJson(err.to_string()))?;
    std::fs::write(path, json)?;
    info!("JSON已导出: {}", path.display());
    Ok(())
}

/// Sorted union of the keys present across `rows`.
pub fn video_columns(rows: &[BTreeMap<String, String>]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One row per video. Nothing is written when `videos` is empty.
pub fn write_videos_csv(
    videos: &[FormattedVideoRecord],
    path: &Path,
    encoding: &str,
) -> Result<usize, SpaceError> {
    if videos.is_empty() {
        return Ok(0);
    }
    let rows = videos
        .iter()
        .map(flatten_record)
        .collect::<Result<Vec<_>, _>>()?;
    let columns = video_columns(&rows);

    let enc = resolve_encoding(encoding)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_record(&mut writer, enc, &columns)?;
    for row in &rows {
        let record: Vec<&str> = columns
            .iter()
            .map(|column| row.get(column).map(String::as_str).unwrap_or(""))
            .collect();
        write_record(&mut writer, enc, &record)?;
    }
    writer.flush()?;
    info!("视频CSV已导出: {}", path.display());
    Ok(rows.len())
}

pub fn write_profile_csv(
    result: &ScrapeResult,
    path: &Path,
    encoding: &str,
) -> Result<(), SpaceError> {
    let profile = &result.profile;
    let row = [
        profile.mid.to_string(),
        profile.name.clone(),
        profile.sex.clone(),
        profile.face.clone(),
        profile.sign.clone(),
        profile.level.to_string(),
        profile.birthday.clone(),
        profile.coins.to_string(),
        profile.fans.to_string(),
        profile.friend.to_string(),
        profile.attention.to_string(),
        result.produced_at.clone(),
        result.count.to_string(),
    ];

    let enc = resolve_encoding(encoding)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_record(&mut writer, enc, &PROFILE_FIELDNAMES)?;
    write_record(&mut writer, enc, &row)?;
    writer.flush()?;
    info!("UP主信息CSV已导出: {}", path.display());
    Ok(())
}

pub fn write_summary(result: &ScrapeResult, path: &Path) -> Result<(), SpaceError> {
    std::fs::write(path, render_summary(result))?;
    info!("摘要已导出: {}", path.display());
    Ok(())
}

// Lenient counters can already sit at i64::MAX.
fn saturating_total(
    videos: &[FormattedVideoRecord],
    field: impl Fn(&FormattedVideoRecord) -> i64,
) -> i64 {
    videos.iter().map(field).fold(0i64, i64::saturating_add)
}

pub fn render_summary(result: &ScrapeResult) -> String {
    let profile = &result.profile;
    let videos = &result.videos;

    let mut out = String::new();
    let _ = writeln!(out, "=== Bilibili UP Master Video Summary ===\n");
    let _ = writeln!(out, "Scrape Time: {}", result.produced_at);
    let _ = writeln!(out, "Total Videos: {}\n", result.count);

    let _ = writeln!(out, "=== UP Master Information ===");
    let _ = writeln!(out, "Name: {}", profile.name);
    let _ = writeln!(out, "UID: {}", profile.mid);
    let _ = writeln!(out, "Level: {}", profile.level);
    let _ = writeln!(out, "Fans: {}", profile.fans);
    let _ = writeln!(out, "Following: {}", profile.attention);
    let _ = writeln!(out, "Sign: {}\n", profile.sign);

    if videos.is_empty() {
        return out;
    }

    let total_plays = saturating_total(videos, |video| video.play);
    let total_comments = saturating_total(videos, |video| video.video_review);
    let total_favorites = saturating_total(videos, |video| video.favorites);
    let average = total_plays / videos.len() as i64;

    let _ = writeln!(out, "=== Video Statistics ===");
    let _ = writeln!(out, "Total Videos: {}", videos.len());
    let _ = writeln!(out, "Total Views: {}", group_thousands(total_plays));
    let _ = writeln!(out, "Total Comments: {}", group_thousands(total_comments));
    let _ = writeln!(out, "Total Favorites: {}", group_thousands(total_favorites));
    let _ = writeln!(
        out,
        "Average Views per Video: {}\n",
        group_thousands(average)
    );

    let _ = writeln!(out, "=== Top {TOP_VIDEOS} Most Popular Videos ===");
    for (rank, video) in top_videos(videos, TOP_VIDEOS).into_iter().enumerate() {
        let _ = writeln!(out, "{}. {}", rank + 1, video.title);
        let _ = writeln!(
            out,
            "   Views: {} | Comments: {}",
            group_thousands(video.play),
            group_thousands(video.video_review)
        );
        let _ = writeln!(out, "   Published: {}\n", video.created);
    }
    out
}

/// Highest view counts first; equal counts keep their original order.
pub fn top_videos(videos: &[FormattedVideoRecord], limit: usize) -> Vec<&FormattedVideoRecord> {
    let mut ranked: Vec<&FormattedVideoRecord> = videos.iter().collect();
    ranked.sort_by(|a, b| b.play.cmp(&a.play));
    ranked.truncate(limit);
    ranked
}

pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn flatten_record(video: &FormattedVideoRecord) -> Result<BTreeMap<String, String>, SpaceError> {
    let value =
        serde_json::to_value(video).map_err(|err| SpaceError::InvalidJson(err.to_string()))?;
    let Value::Object(map) = value else {
        return Err(SpaceError::Other("视频记录无法展开为表格行".to_string()));
    };
    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let cell = match value {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, cell)
        })
        .collect())
}

fn resolve_encoding(label: &str) -> Result<&'static Encoding, SpaceError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| SpaceError::Encoding(format!("不支持的编码: {label}")))
}

fn write_record<W: Write, S: AsRef<str>>(
    writer: &mut W,
    encoding: &'static Encoding,
    record: &[S],
) -> Result<(), SpaceError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    csv_writer.write_record(record.iter().map(|field| field.as_ref()))?;
    csv_writer.flush()?;
    let buffer = csv_writer
        .into_inner()
        .map_err(|err| SpaceError::Io(err.into_error()))?;
    if encoding == UTF_8 {
        writer.write_all(&buffer)?;
    } else {
        let utf8 =
            String::from_utf8(buffer).map_err(|err| SpaceError::Encoding(err.to_string()))?;
        let (encoded, _, had_errors) = encoding.encode(&utf8);
        if had_errors {
            return Err(SpaceError::Encoding("编码转换失败".into()));
        }
        writer.write_all(&encoded)?;
    }
    Ok(())
}
