use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

/// 单次探测请求的形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeRequest {
    /// 仅获取响应头
    Head,
    /// `Range: bytes=0-{len-1}`，保留服务端返回的整个分段
    Range { len: usize },
    /// 普通 GET，只保留前 `len` 字节
    Window { len: usize },
    /// 完整下载 (播放用)
    Full,
}

impl ProbeRequest {
    pub fn is_full(&self) -> bool {
        matches!(self, ProbeRequest::Full)
    }
}

/// 探测响应，header 名称统一小写
#[derive(Debug, Clone, Default)]
pub struct ProbeResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

impl ProbeResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// [200, 400) 视为可达
    pub fn is_reachable(&self) -> bool {
        (200..400).contains(&self.status)
    }

    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    /// 文件声明大小：优先 Content-Range 中的总长度，其次 Content-Length
    pub fn declared_size(&self) -> Option<u64> {
        let from_range = self
            .header("content-range")
            .and_then(|v| v.rsplit('/').next())
            .and_then(|total| total.trim().parse::<u64>().ok());
        from_range.or_else(|| {
            self.header("content-length")
                .and_then(|v| v.trim().parse::<u64>().ok())
        })
    }
}

#[derive(Debug)]
pub enum ProbeError {
    InvalidUrl(String),
    OutOfScope(String),
    Timeout(Duration),
    Transport(String),
    Body(String),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            ProbeError::OutOfScope(url) => {
                write!(f, "Blocked URL outside allowed dataset scope: {}", url)
            }
            ProbeError::Timeout(limit) => {
                write!(f, "Probe timed out after {} ms", limit.as_millis())
            }
            ProbeError::Transport(message) => write!(f, "HTTP request failed: {}", message),
            ProbeError::Body(message) => write!(f, "Failed to read response body: {}", message),
        }
    }
}

impl std::error::Error for ProbeError {}

/// 网络探测能力的抽象
///
/// 核心算法只依赖此 trait，实际传输 (reqwest、测试桩) 由调用方提供。
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn fetch(&self, url: &str, request: ProbeRequest) -> Result<ProbeResponse, ProbeError>;
}

#[async_trait::async_trait]
impl<P: Prober + ?Sized> Prober for std::sync::Arc<P> {
    async fn fetch(&self, url: &str, request: ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        (**self).fetch(url, request).await
    }
}

/// 探测等待上限：元数据 / Range 请求用短上限，完整下载用长上限
#[derive(Debug, Clone, Copy)]
pub struct ProbeTimeouts {
    pub metadata: Duration,
    pub full: Duration,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            metadata: Duration::from_secs(15),
            full: Duration::from_secs(60),
        }
    }
}

impl ProbeTimeouts {
    pub fn for_request(&self, request: ProbeRequest) -> Duration {
        if request.is_full() {
            self.full
        } else {
            self.metadata
        }
    }
}

/// 带超时的探测；超时后丢弃探测 future，进行中的请求随之取消
pub async fn fetch_with_deadline<P: Prober + ?Sized>(
    prober: &P,
    timeouts: &ProbeTimeouts,
    url: &str,
    request: ProbeRequest,
) -> Result<ProbeResponse, ProbeError> {
    let limit = timeouts.for_request(request);
    match tokio::time::timeout(limit, prober.fetch(url, request)).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(limit)),
    }
}

/// 读取资源头部用于魔数识别：先尝试 Range，失败后退回普通 GET
pub async fn fetch_sniff_window<P: Prober + ?Sized>(
    prober: &P,
    timeouts: &ProbeTimeouts,
    url: &str,
    len: usize,
) -> Result<ProbeResponse, ProbeError> {
    match fetch_with_deadline(prober, timeouts, url, ProbeRequest::Range { len }).await {
        Ok(response) => Ok(response),
        Err(range_error) => {
            tracing::debug!(
                "[Probe] Range request failed for {}, trying plain GET: {}",
                url,
                range_error
            );
            fetch_with_deadline(prober, timeouts, url, ProbeRequest::Window { len }).await
        }
    }
}
