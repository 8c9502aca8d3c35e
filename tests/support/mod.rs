#![allow(dead_code)]

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use vtx_sniff::reconcile::{ProbeError, ProbeRequest, ProbeResponse, Prober};

pub const BASE: &str = "https://www.justice.gov/epstein/files/DataSet%201/EFTA0001";

pub fn ftyp(brand: &[u8; 4]) -> Vec<u8> {
    let mut buf = 24u32.to_be_bytes().to_vec();
    buf.extend_from_slice(b"ftyp");
    buf.extend_from_slice(brand);
    buf.extend_from_slice(&[0, 0, 0, 0]);
    buf.extend_from_slice(b"isommp41");
    buf
}

pub fn avi() -> Vec<u8> {
    let mut buf = b"RIFF".to_vec();
    buf.extend_from_slice(&[0x10, 0x20, 0x30, 0x00]);
    buf.extend_from_slice(b"AVI LIST");
    buf
}

pub fn pdf() -> Vec<u8> {
    b"%PDF-1.7\n%\xE2\xE3\xCF\xD3".to_vec()
}

#[derive(Clone)]
pub enum Route {
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    },
    Fail,
    Hang(Duration),
}

impl Route {
    pub fn ok(body: Vec<u8>) -> Self {
        Route::Respond {
            status: 200,
            headers: Vec::new(),
            body,
        }
    }

    pub fn status(status: u16) -> Self {
        Route::Respond {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(self, name: &str, value: &str) -> Self {
        match self {
            Route::Respond {
                status,
                mut headers,
                body,
            } => {
                headers.push((name.to_string(), value.to_string()));
                Route::Respond {
                    status,
                    headers,
                    body,
                }
            }
            other => other,
        }
    }
}

/// In-memory transport; unknown URLs answer 404.
#[derive(Default)]
pub struct FakeProber {
    routes: HashMap<String, Route>,
    range_failures: Vec<String>,
    head_failures: bool,
    calls: Mutex<Vec<(String, ProbeRequest)>>,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, route: Route) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    pub fn fail_range(mut self, url: &str) -> Self {
        self.range_failures.push(url.to_string());
        self
    }

    pub fn fail_head(mut self) -> Self {
        self.head_failures = true;
        self
    }

    pub fn calls(&self) -> Vec<(String, ProbeRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls_for(&self, request: ProbeRequest) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(_, r)| *r == request)
            .map(|(u, _)| u)
            .collect()
    }
}

#[async_trait::async_trait]
impl Prober for FakeProber {
    async fn fetch(&self, url: &str, request: ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        self.calls.lock().unwrap().push((url.to_string(), request));

        if request == ProbeRequest::Head && self.head_failures {
            return Err(ProbeError::Transport("HEAD not allowed".into()));
        }
        if matches!(request, ProbeRequest::Range { .. })
            && self.range_failures.iter().any(|u| u == url)
        {
            return Err(ProbeError::Transport("range rejected".into()));
        }

        let route = self.routes.get(url).cloned().unwrap_or(Route::status(404));
        match route {
            Route::Fail => Err(ProbeError::Transport("connection reset".into())),
            Route::Hang(duration) => {
                tokio::time::sleep(duration).await;
                Err(ProbeError::Transport("hung".into()))
            }
            Route::Respond {
                status,
                headers,
                mut body,
            } => {
                let body = match request {
                    ProbeRequest::Head => None,
                    ProbeRequest::Window { len } => {
                        body.truncate(len);
                        Some(Bytes::from(body))
                    }
                    _ => Some(Bytes::from(body)),
                };
                Ok(ProbeResponse {
                    status,
                    headers: headers
                        .into_iter()
                        .map(|(k, v)| (k.to_ascii_lowercase(), v))
                        .collect(),
                    body,
                })
            }
        }
    }
}
