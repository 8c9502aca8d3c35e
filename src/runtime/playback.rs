use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use crate::common::scope::ScopePolicy;
use crate::common::size::format_file_size;
use crate::common::url_ext::{file_name, path_extension};
use crate::config::PlaybackSettings;
use crate::detect;
use crate::reconcile::{fetch_with_deadline, ProbeError, ProbeRequest, ProbeTimeouts, Prober};
use crate::runtime::ffmpeg::{Transcode, TranscodeMode};

const DEFAULT_MEDIA_TYPE: &str = "video/mp4";
const MB: u64 = 1024 * 1024;

/// 可直接交给播放器的媒体数据
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackMedia {
    #[serde(skip)]
    pub bytes: Bytes,
    pub content_type: String,
    pub label: String,
    pub file_name: String,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub enum PlaybackError {
    OutOfScope(String),
    Fetch(ProbeError),
    Status(u16),
    EmptyBody,
}

impl std::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackError::OutOfScope(url) => {
                write!(f, "Video preview is restricted to the allowed dataset scope: {}", url)
            }
            PlaybackError::Fetch(e) => write!(f, "Failed to fetch video: {}", e),
            PlaybackError::Status(status) => write!(f, "Server responded with HTTP {}", status),
            PlaybackError::EmptyBody => write!(f, "Received empty file data"),
        }
    }
}

impl std::error::Error for PlaybackError {}

/// 播放预处理：完整下载，必要时把 QuickTime 转成 MP4
pub struct PlaybackService<P> {
    prober: P,
    scope: ScopePolicy,
    timeouts: ProbeTimeouts,
    transcoder: Option<Arc<dyn Transcode>>,
    settings: PlaybackSettings,
    max_convert_bytes: u64,
}

impl<P: Prober> PlaybackService<P> {
    pub fn new(prober: P, scope: ScopePolicy, settings: PlaybackSettings) -> Self {
        Self {
            prober,
            scope,
            timeouts: ProbeTimeouts::default(),
            transcoder: None,
            settings,
            max_convert_bytes: 60 * MB,
        }
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcode>, max_convert_mb: u64) -> Self {
        self.transcoder = Some(transcoder);
        self.max_convert_bytes = max_convert_mb.saturating_mul(MB);
        self
    }

    pub fn with_timeouts(mut self, timeouts: ProbeTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub async fn prepare(&self, raw_url: &str) -> Result<PlaybackMedia, PlaybackError> {
        let url = self
            .scope
            .check(raw_url.trim())
            .ok_or_else(|| PlaybackError::OutOfScope(raw_url.to_string()))?
            .to_string();

        info!("[Playback] Fetching {}", url);
        let response = fetch_with_deadline(&self.prober, &self.timeouts, &url, ProbeRequest::Full)
            .await
            .map_err(PlaybackError::Fetch)?;
        if !response.is_reachable() {
            return Err(PlaybackError::Status(response.status));
        }

        let declared_type = response.content_type().map(str::to_string);
        let bytes = match response.body {
            Some(body) if !body.is_empty() => body,
            _ => return Err(PlaybackError::EmptyBody),
        };

        let content_type = detect::detect(&bytes)
            .map(str::to_string)
            .or(declared_type)
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());

        let mut warnings = self.size_warnings(bytes.len() as u64);
        let is_quicktime = path_extension(&url).as_deref() == Some("mov")
            || content_type.to_ascii_lowercase().contains("quicktime");

        let (bytes, content_type, label) = if is_quicktime {
            self.prepare_quicktime(bytes, content_type, &mut warnings).await
        } else {
            let label = content_type.clone();
            (bytes, content_type, label)
        };

        Ok(PlaybackMedia {
            bytes,
            content_type,
            label,
            file_name: file_name(&url),
            warnings,
        })
    }

    fn size_warnings(&self, len: u64) -> Vec<String> {
        let mut warnings = Vec::new();
        if len < self.settings.small_file_warn_bytes {
            warn!("[Playback] File is very small ({} bytes), might be an error page", len);
            warnings.push(format!(
                "File is very small ({}). This might be an error page or redirect, \
                 not the actual video file.",
                format_file_size(len)
            ));
        }
        if len > self.settings.large_file_warn_mb.saturating_mul(MB) {
            warn!("[Playback] File is very large ({} bytes)", len);
            warnings.push(format!(
                "Large file detected ({}). Conversion may take a while and use significant memory.",
                format_file_size(len)
            ));
        }
        warnings
    }

    async fn prepare_quicktime(
        &self,
        bytes: Bytes,
        content_type: String,
        warnings: &mut Vec<String>,
    ) -> (Bytes, String, String) {
        let Some(transcoder) = &self.transcoder else {
            warnings.push(
                "ffmpeg is not available. MOV files may not play in the browser; \
                 download the file to view it."
                    .to_string(),
            );
            let label = content_type.clone();
            return (bytes, content_type, label);
        };

        let len = bytes.len() as u64;
        if len > self.max_convert_bytes {
            warn!("[Playback] MOV too large for conversion: {} bytes", len);
            warnings.push(format!(
                "File is {}. Conversion is skipped above {}, so the original file is returned.",
                format_file_size(len),
                format_file_size(self.max_convert_bytes)
            ));
            let label = format!(
                "{} (original - conversion skipped due to file size)",
                content_type
            );
            return (bytes, content_type, label);
        }

        info!("[Playback] Converting MOV ({} bytes) for browser playback", len);
        match transcoder.transcode(bytes.clone()).await {
            Ok(converted) => {
                let label = match converted.mode {
                    TranscodeMode::Remux => "video/mp4 (remuxed from MOV)",
                    TranscodeMode::Reencode => "video/mp4 (transcoded from MOV)",
                };
                (converted.bytes, "video/mp4".to_string(), label.to_string())
            }
            Err(e) => {
                warn!("[Playback] Conversion failed, returning original: {}", e);
                warnings.push(format!(
                    "MOV conversion failed ({}). The original file is returned \
                     and may not play in the browser.",
                    e
                ));
                let label = content_type.clone();
                (bytes, content_type, label)
            }
        }
    }
}
