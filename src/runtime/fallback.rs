use crate::reconcile::{ProbeError, ProbeRequest, ProbeResponse, Prober};

/// 双通道探测：主通道失败时退回备用通道
///
/// 典型组合是携带会话凭据的通道在前，匿名通道在后。
pub struct FallbackProber<A, B> {
    primary: A,
    secondary: B,
}

impl<A, B> FallbackProber<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait::async_trait]
impl<A: Prober, B: Prober> Prober for FallbackProber<A, B> {
    async fn fetch(&self, url: &str, request: ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        match self.primary.fetch(url, request).await {
            Ok(response) => Ok(response),
            Err(ProbeError::OutOfScope(blocked)) => Err(ProbeError::OutOfScope(blocked)),
            Err(e) => {
                tracing::debug!(
                    "[Probe] Primary transport failed for {} ({}), trying fallback",
                    url,
                    e
                );
                self.secondary.fetch(url, request).await
            }
        }
    }
}
