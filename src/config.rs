use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::scope::{ScopePolicy, ScopeRule};
use crate::reconcile::{ProbeTimeouts, ALTERNATIVE_EXTENSIONS, DEFAULT_SNIFF_BYTES};

/// 应用配置总结构
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub scope: ScopeSettings,
    pub probe: ProbeSettings,
    pub vtx_ffmpeg: VtxFfmpegSettings,
    pub playback: PlaybackSettings,
}

/// 服务相关配置（监听地址、端口）
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// 允许访问的数据集范围
#[derive(Debug, Deserialize, Clone)]
pub struct ScopeSettings {
    pub rules: Vec<ScopeRule>,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            rules: vec![
                ScopeRule::new("www.justice.gov", "/epstein/files"),
                ScopeRule::new("assets.getkino.com", "/documents"),
            ],
        }
    }
}

impl ScopeSettings {
    pub fn policy(&self) -> ScopePolicy {
        ScopePolicy::new(self.rules.clone())
    }
}

/// 探测相关配置
#[derive(Debug, Deserialize, Clone)]
pub struct ProbeSettings {
    /// 魔数识别读取的字节数
    pub sniff_bytes: usize,
    /// HEAD / Range 请求等待上限（毫秒）
    pub metadata_timeout_ms: u64,
    /// 完整下载等待上限（毫秒）
    pub full_timeout_ms: u64,
    /// `.pdf` 占位时依次尝试的扩展名
    pub alternative_extensions: Vec<String>,
    pub max_redirects: usize,
    /// 主通道携带的会话 Cookie（用于年龄验证等页面态）
    /// 若设置，请求失败时会退回到不带凭据的通道
    #[serde(default)]
    pub session_cookie: Option<String>,
}

impl ProbeSettings {
    pub fn timeouts(&self) -> ProbeTimeouts {
        ProbeTimeouts {
            metadata: Duration::from_millis(self.metadata_timeout_ms),
            full: Duration::from_millis(self.full_timeout_ms),
        }
    }
}

/// VtxFfmpeg 转码配置
///
/// 职责：定义 QuickTime 转码所用二进制的位置与运行时约束
#[derive(Debug, Deserialize, Clone)]
pub struct VtxFfmpegSettings {
    /// 显式指定的 ffmpeg 路径，优先级最高
    #[serde(default)]
    pub binary_path: Option<PathBuf>,
    /// 未指定路径时是否使用 PATH 中的 `ffmpeg`
    pub use_system_binary: bool,
    /// 单个转码阶段的超时时间（单位：秒）
    pub execution_timeout_secs: u64,
    /// 超过该大小（MB）的文件跳过转码，直接返回原始数据
    pub max_convert_mb: u64,
    /// 转码临时文件目录
    pub work_dir: PathBuf,
}

/// 播放预处理配置
#[derive(Debug, Deserialize, Clone)]
pub struct PlaybackSettings {
    /// 小于该字节数的文件很可能是错误页
    pub small_file_warn_bytes: u64,
    pub large_file_warn_mb: u64,
}

impl Settings {
    /// 加载配置：支持默认值、可选配置文件、环境变量覆盖
    pub fn new() -> anyhow::Result<Self> {
        let extensions: Vec<String> = ALTERNATIVE_EXTENSIONS
            .iter()
            .map(|e| e.to_string())
            .collect();

        let builder = Config::builder()
            // 默认值（代码内硬编码）
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("probe.sniff_bytes", DEFAULT_SNIFF_BYTES as i64)?
            .set_default("probe.metadata_timeout_ms", 15_000)?
            .set_default("probe.full_timeout_ms", 60_000)?
            .set_default("probe.alternative_extensions", extensions)?
            .set_default("probe.max_redirects", 10)?
            .set_default::<&str, Option<String>>("probe.session_cookie", None)?
            .set_default::<&str, Option<String>>("vtx_ffmpeg.binary_path", None)?
            .set_default("vtx_ffmpeg.use_system_binary", true)?
            .set_default("vtx_ffmpeg.execution_timeout_secs", 600)?
            .set_default("vtx_ffmpeg.max_convert_mb", 60)?
            .set_default(
                "vtx_ffmpeg.work_dir",
                std::env::temp_dir().to_string_lossy().to_string(),
            )?
            .set_default("playback.small_file_warn_bytes", 10_240)?
            .set_default("playback.large_file_warn_mb", 100)?
            .add_source(File::with_name("config").required(false))
            // 列表型配置用逗号分隔，例如 SNIFF__PROBE__ALTERNATIVE_EXTENSIONS=mov,mp4
            // scope.rules 为结构体列表，只能通过配置文件设置
            .add_source(
                Environment::with_prefix("SNIFF")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("probe.alternative_extensions"),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
