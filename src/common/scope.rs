use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use url::Url;

/// 单条允许规则: 精确主机名 + 路径前缀
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScopeRule {
    pub host: String,
    pub path_prefix: String,
}

impl ScopeRule {
    pub fn new(host: &str, path_prefix: &str) -> Self {
        Self {
            host: host.to_string(),
            path_prefix: path_prefix.to_string(),
        }
    }

    fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        host.eq_ignore_ascii_case(&self.host) && url.path().starts_with(&self.path_prefix)
    }
}

/// URL 作用域策略
///
/// 所有探测、播放请求在发出前都必须通过该策略。
#[derive(Debug, Clone, Default)]
pub struct ScopePolicy {
    rules: Vec<ScopeRule>,
}

impl ScopePolicy {
    pub fn new(rules: Vec<ScopeRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ScopeRule] {
        &self.rules
    }

    /// 解析并校验 URL，仅允许 http/https 且命中任一规则
    pub fn check(&self, raw: &str) -> Option<Url> {
        let url = Url::parse(raw).ok()?;
        self.check_url(&url).then_some(url)
    }

    pub fn check_url(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        self.rules.iter().any(|rule| rule.matches(url))
    }

    pub fn is_allowed(&self, raw: &str) -> bool {
        self.check(raw).is_some()
    }

    /// 还原被扩展页包裹的真实地址
    ///
    /// 形如 `chrome-extension://<id>/<encoded-url>`，仅当解码后的地址
    /// 位于允许范围内时才替换，否则原样返回。
    pub fn extract_real_url(&self, raw: &str) -> String {
        static WRAPPED: OnceLock<Regex> = OnceLock::new();
        let pattern = WRAPPED.get_or_init(|| {
            Regex::new(r"^chrome-extension://[^/]+/(.+)$").expect("static regex is valid")
        });

        let Some(inner) = pattern.captures(raw).and_then(|c| c.get(1)) else {
            return raw.to_string();
        };
        let inner = inner.as_str();

        let decoded = decode_wrapped(inner).unwrap_or_else(|| inner.to_string());
        for candidate in [decoded.as_str(), inner] {
            if let Some(url) = self.check(candidate) {
                tracing::debug!("[Scope] Unwrapped extension URL -> {}", url);
                return url.to_string();
            }
        }
        raw.to_string()
    }
}

/// 百分号解码；非法转义 (如 `%+1`) 保持原样，非 UTF-8 结果返回 None
fn decode_wrapped(input: &str) -> Option<String> {
    urlencoding::decode(input).ok().map(|decoded| decoded.into_owned())
}
