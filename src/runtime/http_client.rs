use std::collections::HashMap;

use bytes::Bytes;
use reqwest::redirect::Policy;
use reqwest::{header, Client, Method};
use url::Url;

use crate::common::scope::ScopePolicy;
use crate::reconcile::{ProbeError, ProbeRequest, ProbeResponse, Prober};

/// 基于 reqwest 的探测通道
///
/// 请求发出前校验作用域；重定向仅在目标仍位于作用域内时跟随。
pub struct HttpProber {
    client: Client,
    scope: ScopePolicy,
    extra_headers: header::HeaderMap,
    label: &'static str,
}

impl HttpProber {
    pub fn new(scope: ScopePolicy, max_redirects: usize) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .redirect(build_redirect_policy(scope.clone(), max_redirects))
            .build()
            .map_err(|e| ProbeError::Transport(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            client,
            scope,
            extra_headers: header::HeaderMap::new(),
            label: "direct",
        })
    }

    /// 附加固定请求头 (例如会话 Cookie)
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ProbeError> {
        let header_name = header::HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ProbeError::Transport(format!("Invalid header name: {}", name)))?;
        let header_value = header::HeaderValue::from_str(value)
            .map_err(|_| ProbeError::Transport(format!("Invalid header value for {}.", name)))?;
        self.extra_headers.append(header_name, header_value);
        Ok(self)
    }

    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn fetch(&self, url: &str, request: ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        let parsed = Url::parse(url).map_err(|_| ProbeError::InvalidUrl(url.to_string()))?;
        if !self.scope.check_url(&parsed) {
            return Err(ProbeError::OutOfScope(url.to_string()));
        }

        let method = match request {
            ProbeRequest::Head => Method::HEAD,
            _ => Method::GET,
        };

        let mut builder = self
            .client
            .request(method, parsed)
            .headers(self.extra_headers.clone());
        if let ProbeRequest::Range { len } = request {
            builder = builder.header(header::RANGE, format!("bytes=0-{}", len.saturating_sub(1)));
        }

        tracing::trace!("[Probe:{}] {:?} {}", self.label, request, url);
        let mut response = builder
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|val| (k.as_str().to_ascii_lowercase(), val.to_string()))
            })
            .collect::<HashMap<_, _>>();

        let body = match request {
            ProbeRequest::Head => None,
            // 206 分段同样截断：服务端可能无视请求的区间上界
            ProbeRequest::Range { len } | ProbeRequest::Window { len } => {
                Some(read_prefix(&mut response, len).await?)
            }
            ProbeRequest::Full => Some(
                response
                    .bytes()
                    .await
                    .map_err(|e| ProbeError::Body(e.to_string()))?,
            ),
        };

        Ok(ProbeResponse {
            status,
            headers,
            body,
        })
    }
}

/// 只读取响应体的前 `len` 字节，够数后停止拉取
async fn read_prefix(response: &mut reqwest::Response, len: usize) -> Result<Bytes, ProbeError> {
    let mut data = Vec::with_capacity(len.min(64 * 1024));
    while data.len() < len {
        match response
            .chunk()
            .await
            .map_err(|e| ProbeError::Body(e.to_string()))?
        {
            Some(chunk) => data.extend_from_slice(&chunk),
            None => break,
        }
    }
    data.truncate(len);
    Ok(Bytes::from(data))
}

fn build_redirect_policy(scope: ScopePolicy, max_redirects: usize) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= max_redirects {
            return attempt.error("too many redirects");
        }
        if scope.check_url(attempt.url()) {
            return attempt.follow();
        }
        tracing::debug!(
            "[Probe] Redirect to {} leaves the allowed scope, not following",
            attempt.url()
        );
        attempt.stop()
    })
}
