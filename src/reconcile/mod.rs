//! Extension reconciliation.
//!
//! Some origins answer a literal `.pdf` path with a placeholder document while
//! the real media sits at the same base path under another extension. When an
//! [`AmbiguityPredicate`] fires, the reconciler probes each alternative
//! extension in order, sniffs the returned bytes and keeps the best-scoring
//! candidate. It never fails: the worst case is the original detection.

pub mod ambiguity;
pub mod probe;
pub mod score;

use serde::Serialize;
use tracing::{debug, info};

use crate::common::url_ext::with_extension;
use crate::detect::{self, DetectionMethod, DetectionResult, PDF_MIME};

pub use self::ambiguity::{AlternativeBase, AmbiguityPredicate, PdfPlaceholder};
pub use self::probe::{
    fetch_sniff_window, fetch_with_deadline, ProbeError, ProbeRequest, ProbeResponse,
    ProbeTimeouts, Prober,
};
pub use self::score::score_candidate;

/// Probed in this order; earlier entries win score ties.
pub const ALTERNATIVE_EXTENSIONS: &[&str] = &[
    "mp4", "m4a", "m4v", "mov", "3gp", "avi", "mkv", "webm", "mp3", "wav", "flac", "aac",
];

/// Bytes requested per probe.
pub const DEFAULT_SNIFF_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeCandidate {
    pub extension: String,
    pub url: String,
    pub mime: String,
    pub score: i32,
    pub content_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OutcomeMethod {
    /// Not ambiguous; the original detection stands.
    Direct { detection: DetectionMethod },
    /// Magic bytes verified at an alternative-extension URL.
    AlternativeExtension { extension: String },
    /// Alternatives were probed but none validated.
    AlternativesExhausted,
}

impl OutcomeMethod {
    pub fn label(&self) -> String {
        match self {
            OutcomeMethod::Direct { detection } => match detection {
                DetectionMethod::MagicBytes => "Magic bytes".to_string(),
                DetectionMethod::ContentTypeHeader { generic: true } => {
                    "Content-Type header (generic, magic bytes not detected)".to_string()
                }
                DetectionMethod::ContentTypeHeader { generic: false } => {
                    "Content-Type header (magic bytes not detected)".to_string()
                }
                DetectionMethod::Unknown => {
                    "Unknown (no Content-Type, magic bytes not detected)".to_string()
                }
            },
            OutcomeMethod::AlternativeExtension { extension } => format!(
                "Magic bytes (verified via .{} URL - server serves different content by extension)",
                extension
            ),
            OutcomeMethod::AlternativesExhausted => {
                "Magic bytes (tried alternative extensions but none returned valid file)"
                    .to_string()
            }
        }
    }

    pub fn is_magic_bytes(&self) -> bool {
        match self {
            OutcomeMethod::Direct { detection } => *detection == DetectionMethod::MagicBytes,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationOutcome {
    pub mime_type: Option<String>,
    pub source_url: String,
    pub extension_hint: Option<String>,
    pub method: OutcomeMethod,
    /// Declared size reported by the winning probe.
    pub content_length: Option<u64>,
    /// Every candidate that produced a score, in probe order.
    pub candidates: Vec<ProbeCandidate>,
}

impl ReconciliationOutcome {
    fn direct(url: &str, detection: &DetectionResult) -> Self {
        Self {
            mime_type: detection.mime_type.clone(),
            source_url: url.to_string(),
            extension_hint: None,
            method: OutcomeMethod::Direct {
                detection: detection.method,
            },
            content_length: None,
            candidates: Vec::new(),
        }
    }
}

pub struct Reconciler {
    predicate: Box<dyn AmbiguityPredicate>,
    extensions: Vec<String>,
    sniff_bytes: usize,
    timeouts: ProbeTimeouts,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            predicate: Box::new(PdfPlaceholder),
            extensions: ALTERNATIVE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            sniff_bytes: DEFAULT_SNIFF_BYTES,
            timeouts: ProbeTimeouts::default(),
        }
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_predicate(mut self, predicate: impl AmbiguityPredicate + 'static) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sniff_bytes(mut self, sniff_bytes: usize) -> Self {
        self.sniff_bytes = sniff_bytes.max(1);
        self
    }

    pub fn with_timeouts(mut self, timeouts: ProbeTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Yields exactly one outcome per call.
    ///
    /// Candidates are probed one at a time; each probe's full
    /// fetch-sniff-score cycle finishes before the next begins.
    pub async fn reconcile<P: Prober + ?Sized>(
        &self,
        url: &str,
        detection: &DetectionResult,
        prober: &P,
    ) -> ReconciliationOutcome {
        let Some(base) = self.predicate.alternative_base(url, detection) else {
            return ReconciliationOutcome::direct(url, detection);
        };

        info!(
            "[Reconcile] Ambiguous detection for {}, probing {} alternative extensions",
            url,
            self.extensions.len()
        );

        let mut candidates = Vec::new();
        for extension in &self.extensions {
            let candidate_url = with_extension(&base.stem, extension, &base.suffix);
            if let Some(candidate) = self.probe_candidate(prober, extension, &candidate_url).await {
                info!(
                    "[Reconcile] Candidate .{} => {} (score {})",
                    candidate.extension, candidate.mime, candidate.score
                );
                candidates.push(candidate);
            }
        }

        match select_best(&candidates).cloned() {
            Some(best) => {
                info!("[Reconcile] Selected .{} ({})", best.extension, best.url);
                ReconciliationOutcome {
                    mime_type: Some(best.mime.clone()),
                    source_url: best.url.clone(),
                    extension_hint: Some(best.extension.clone()),
                    method: OutcomeMethod::AlternativeExtension {
                        extension: best.extension.clone(),
                    },
                    content_length: best.content_length,
                    candidates,
                }
            }
            None => {
                info!("[Reconcile] No alternative validated, keeping original detection");
                ReconciliationOutcome {
                    mime_type: detection.mime_type.clone(),
                    source_url: url.to_string(),
                    extension_hint: None,
                    method: OutcomeMethod::AlternativesExhausted,
                    content_length: None,
                    candidates,
                }
            }
        }
    }

    async fn probe_candidate<P: Prober + ?Sized>(
        &self,
        prober: &P,
        extension: &str,
        url: &str,
    ) -> Option<ProbeCandidate> {
        let response =
            match fetch_sniff_window(prober, &self.timeouts, url, self.sniff_bytes).await {
                Ok(response) => response,
                Err(e) => {
                    debug!("[Reconcile] Both probes failed for .{}: {}", extension, e);
                    return None;
                }
            };

        if !response.is_reachable() {
            if response.status == 404 {
                debug!("[Reconcile] .{} returned 404", extension);
            } else {
                debug!("[Reconcile] .{} returned status {}", extension, response.status);
            }
            return None;
        }

        let body = response.body_bytes();
        if body.is_empty() {
            debug!("[Reconcile] .{} returned an empty body", extension);
            return None;
        }

        match detect::detect(body) {
            None => {
                debug!("[Reconcile] .{} returned an unrecognized payload", extension);
                None
            }
            Some(PDF_MIME) => {
                debug!("[Reconcile] .{} still serves the PDF placeholder", extension);
                None
            }
            Some(mime) => Some(ProbeCandidate {
                extension: extension.to_string(),
                url: url.to_string(),
                mime: mime.to_string(),
                score: score_candidate(extension, mime),
                content_length: response.declared_size(),
            }),
        }
    }
}

/// Highest score wins; among equal scores the earliest-probed entry is kept.
pub fn select_best(candidates: &[ProbeCandidate]) -> Option<&ProbeCandidate> {
    let mut best: Option<&ProbeCandidate> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }
    best
}
