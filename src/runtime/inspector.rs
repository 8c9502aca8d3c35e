use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::common::scope::ScopePolicy;
use crate::common::size::format_file_size;
use crate::common::url_ext::replace_file_extension;
use crate::detect::{self, OCTET_STREAM};
use crate::reconcile::{
    fetch_sniff_window, fetch_with_deadline, ProbeRequest, ProbeResponse, ProbeTimeouts, Prober,
    Reconciler, ReconciliationOutcome, DEFAULT_SNIFF_BYTES,
};

/// MIME -> 打开文件时使用的扩展名
pub const MIME_TO_EXTENSION: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    ("video/mp4", "mp4"),
    ("audio/mp4", "m4a"),
    ("audio/m4a", "m4a"),
    ("video/x-m4v", "m4v"),
    ("video/quicktime", "mov"),
    ("video/3gpp", "3gp"),
    ("video/x-msvideo", "avi"),
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("video/webm", "webm"),
    ("application/zip", "zip"),
];

/// 可以进入播放预览的类型
pub const PLAYABLE_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/webm",
    "video/x-m4v",
    "video/3gpp",
    "video/quicktime",
    "video/x-msvideo",
    "audio/mp4",
    "audio/m4a",
];

/// 一次完整识别的结果
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub requested_url: String,
    pub mime_type: String,
    pub method: String,
    pub magic_bytes: bool,
    pub status_code: Option<u16>,
    pub file_size: Option<u64>,
    pub file_size_display: Option<String>,
    pub source_url: String,
    pub extension_hint: Option<String>,
    pub preferred_extension: Option<String>,
    pub open_url: Option<String>,
    pub quicktime_warning: bool,
    pub playable: bool,
    pub warnings: Vec<String>,
    pub reconciliation: ReconciliationOutcome,
}

#[derive(Debug)]
pub enum InspectError {
    OutOfScope(String),
}

impl std::fmt::Display for InspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectError::OutOfScope(url) => {
                write!(f, "URL is outside the allowed dataset scope: {}", url)
            }
        }
    }
}

impl std::error::Error for InspectError {}

/// HEAD 与 GET 响应中收集到的元信息，先到先得
#[derive(Debug, Default)]
struct ResponseFacts {
    status: Option<u16>,
    content_type: Option<String>,
    size: Option<u64>,
}

impl ResponseFacts {
    fn absorb(&mut self, response: &ProbeResponse) {
        self.status.get_or_insert(response.status);
        if self.content_type.is_none() {
            self.content_type = response.content_type().map(str::to_string);
        }
        if self.size.is_none() {
            self.size = response.declared_size();
        }
    }
}

/// 识别流水线：HEAD -> 头部字节 -> 魔数 -> 扩展名校正
pub struct Inspector<P> {
    prober: P,
    scope: ScopePolicy,
    reconciler: Reconciler,
    timeouts: ProbeTimeouts,
    sniff_bytes: usize,
}

impl<P: Prober> Inspector<P> {
    pub fn new(prober: P, scope: ScopePolicy, reconciler: Reconciler) -> Self {
        Self {
            prober,
            scope,
            reconciler,
            timeouts: ProbeTimeouts::default(),
            sniff_bytes: DEFAULT_SNIFF_BYTES,
        }
    }

    pub fn with_timeouts(mut self, timeouts: ProbeTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_sniff_bytes(mut self, sniff_bytes: usize) -> Self {
        self.sniff_bytes = sniff_bytes.max(1);
        self
    }

    pub fn scope(&self) -> &ScopePolicy {
        &self.scope
    }

    pub async fn inspect(&self, raw_url: &str) -> Result<Inspection, InspectError> {
        let unwrapped = self.scope.extract_real_url(raw_url);
        let url = self
            .scope
            .check(&unwrapped)
            .ok_or_else(|| InspectError::OutOfScope(unwrapped.clone()))?
            .to_string();

        info!("[Inspect] Detecting {}", url);
        let mut facts = ResponseFacts::default();

        match fetch_with_deadline(&self.prober, &self.timeouts, &url, ProbeRequest::Head).await {
            Ok(head) => facts.absorb(&head),
            Err(e) => debug!("[Inspect] HEAD failed, continuing with GET: {}", e),
        }

        let mut warnings = Vec::new();
        let outcome = match self.fetch_leading_bytes(&url, &mut facts).await {
            Ok(body) => {
                let detection = detect::classify(&body, facts.content_type.as_deref());
                let outcome = self.reconciler.reconcile(&url, &detection, &self.prober).await;
                if let Some(size) = outcome.content_length {
                    facts.size = Some(size);
                }
                outcome
            }
            Err(reason) => {
                warn!("[Inspect] Failed to fetch file bytes for {}: {}", url, reason);
                warnings.push(format!(
                    "Could not fetch file bytes ({}). Using Content-Type header only.",
                    reason
                ));
                let detection = detect::from_content_type(facts.content_type.as_deref());
                self.reconciler.reconcile(&url, &detection, &self.prober).await
            }
        };

        Ok(self.build_inspection(url, outcome, facts, warnings))
    }

    async fn fetch_leading_bytes(
        &self,
        url: &str,
        facts: &mut ResponseFacts,
    ) -> Result<Bytes, String> {
        let response = fetch_sniff_window(&self.prober, &self.timeouts, url, self.sniff_bytes)
            .await
            .map_err(|e| e.to_string())?;
        facts.absorb(&response);

        if !response.is_reachable() {
            return Err(format!("HTTP {}", response.status));
        }
        match response.body {
            Some(body) if !body.is_empty() => Ok(body),
            _ => Err("No data received for magic byte detection".to_string()),
        }
    }

    fn build_inspection(
        &self,
        requested_url: String,
        outcome: ReconciliationOutcome,
        facts: ResponseFacts,
        warnings: Vec<String>,
    ) -> Inspection {
        let mime_type = outcome
            .mime_type
            .clone()
            .unwrap_or_else(|| OCTET_STREAM.to_string());
        let preferred_extension =
            preferred_extension(&mime_type, outcome.extension_hint.as_deref());
        let open_url = preferred_extension
            .as_deref()
            .map(|ext| replace_file_extension(&outcome.source_url, ext))
            .filter(|candidate| self.scope.is_allowed(candidate));

        Inspection {
            requested_url,
            method: outcome.method.label(),
            magic_bytes: outcome.method.is_magic_bytes(),
            status_code: facts.status,
            file_size: facts.size,
            file_size_display: facts.size.map(format_file_size),
            source_url: outcome.source_url.clone(),
            extension_hint: outcome.extension_hint.clone(),
            quicktime_warning: preferred_extension.as_deref() == Some("mov"),
            playable: PLAYABLE_MIME_TYPES.contains(&mime_type.as_str()),
            preferred_extension,
            open_url,
            mime_type,
            warnings,
            reconciliation: outcome,
        }
    }
}

/// 已验证的扩展名优先于由 MIME 推导出的扩展名
pub fn preferred_extension(mime_type: &str, extension_hint: Option<&str>) -> Option<String> {
    let from_mime = MIME_TO_EXTENSION
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(mime_type))
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime_type).and_then(|exts| exts.first().copied())
        });

    if let Some(hint) = extension_hint {
        if let Some(ext) = from_mime.filter(|ext| *ext != hint) {
            debug!(
                "[Inspect] Extension hint mismatch (hint: .{}, mime: .{}), using verified hint",
                hint, ext
            );
        }
        return Some(hint.to_string());
    }
    from_mime.map(str::to_string)
}
