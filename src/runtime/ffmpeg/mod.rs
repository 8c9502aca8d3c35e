// src/runtime/ffmpeg/mod.rs

pub mod binary;
pub mod manager;

use bytes::Bytes;
use serde::Serialize;

pub use manager::{FatalError, VtxFfmpegManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeMode {
    /// 仅更换容器
    Remux,
    /// 重新编码
    Reencode,
}

#[derive(Debug, Clone)]
pub struct Transcoded {
    pub bytes: Bytes,
    pub mode: TranscodeMode,
}

#[derive(Debug)]
pub enum TranscodeError {
    Io(String),
    Spawn(String),
    Timeout(u64),
    Failed { code: Option<i32>, stderr: String },
    EmptyOutput,
}

impl std::fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscodeError::Io(message) => write!(f, "I/O error: {}", message),
            TranscodeError::Spawn(message) => write!(f, "Failed to spawn ffmpeg: {}", message),
            TranscodeError::Timeout(secs) => write!(f, "ffmpeg timed out after {}s", secs),
            TranscodeError::Failed { code, stderr } => match code {
                Some(code) => write!(f, "ffmpeg exited with code {}: {}", code, stderr),
                None => write!(f, "ffmpeg terminated by signal: {}", stderr),
            },
            TranscodeError::EmptyOutput => write!(f, "ffmpeg produced no output"),
        }
    }
}

impl std::error::Error for TranscodeError {}

/// 转码能力抽象：输入原始 QuickTime 字节，输出浏览器可播放的 MP4
#[async_trait::async_trait]
pub trait Transcode: Send + Sync {
    async fn transcode(&self, input: Bytes) -> Result<Transcoded, TranscodeError>;
}
