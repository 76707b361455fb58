pub mod client;
pub mod errors;
pub mod export;
pub mod keys;
pub mod models;
pub mod scrape;
pub mod timestamp;
pub mod wbi;

pub use client::{ClientOptions, SpaceClient, DEFAULT_HEADERS, MAX_PAGE_SIZE};
pub use errors::{ScrapeError, SpaceError};
pub use export::{
    export_result, render_summary, write_json, write_profile_csv, write_summary,
    write_videos_csv, ExportFormat, PROFILE_FIELDNAMES,
};
pub use keys::{fragment_from_url, KeyFragmentPair, WbiKeyProvider, KEY_TTL_SECS};
pub use models::{format_video_records, CreatorProfile, FormattedVideoRecord, VideoRecord};
pub use scrape::{
    scrape_space, scrape_space_blocking, ProgressCallback, ScrapeOptions, ScrapeProgress,
    ScrapeResult,
};
pub use timestamp::{current_timestamp, format_publish_time, parse_creator_id};
pub use wbi::{filter_value, mixin_key, sign_params, SignedParams, MIXIN_KEY_ENC_TAB};
