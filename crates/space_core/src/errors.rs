use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("无法解析UP主标识: {0}")]
    InvalidCreator(String),
    #[error("网络请求失败: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API响应错误(code={code}, message={message})")]
    Api { code: i32, message: String },
    #[error("响应不是有效的JSON: {0}")]
    InvalidJson(String),
    #[error("WBI密钥不可用: {0}")]
    KeysUnavailable(String),
    #[error("无法获取UP主信息(mid={mid}, code={code}, message={message})")]
    ProfileNotFound {
        mid: u64,
        code: i32,
        message: String,
    },
    #[error("读取文件失败: {0}")]
    Io(#[from] io::Error),
    #[error("CSV写入失败: {0}")]
    Csv(#[from] csv::Error),
    #[error("编码转换失败: {0}")]
    Encoding(String),
    #[error("未知错误: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("UP主视频抓取失败: {0}")]
    Core(#[from] SpaceError),
    #[error("执行业务流程失败: {0}")]
    Context(String),
}

impl ScrapeError {
    pub fn context<T: Into<String>>(self, message: T) -> Self {
        let message = message.into();
        match self {
            ScrapeError::Core(err) => ScrapeError::Context(format!("{message}: {err}")),
            ScrapeError::Context(existing) => {
                ScrapeError::Context(format!("{message}: {existing}"))
            }
        }
    }

    /// The underlying library error, if no context has been layered on yet.
    pub fn as_core(&self) -> Option<&SpaceError> {
        match self {
            ScrapeError::Core(err) => Some(err),
            ScrapeError::Context(_) => None,
        }
    }
}
