mod support;

use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use support::{ftyp, FakeProber, Route, BASE};
use vtx_sniff::config::{PlaybackSettings, ScopeSettings};
use vtx_sniff::runtime::ffmpeg::{Transcode, TranscodeError, TranscodeMode, Transcoded};
use vtx_sniff::runtime::playback::{PlaybackError, PlaybackService};

struct StubTranscoder {
    mode: Option<TranscodeMode>,
    calls: AtomicUsize,
}

impl StubTranscoder {
    fn succeeding(mode: TranscodeMode) -> Arc<Self> {
        Arc::new(Self {
            mode: Some(mode),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            mode: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transcode for StubTranscoder {
    async fn transcode(&self, _input: Bytes) -> Result<Transcoded, TranscodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Some(mode) => Ok(Transcoded {
                bytes: Bytes::from(ftyp(b"isom")),
                mode,
            }),
            None => Err(TranscodeError::Failed {
                code: Some(1),
                stderr: "moov atom not found".into(),
            }),
        }
    }
}

fn settings() -> PlaybackSettings {
    PlaybackSettings {
        small_file_warn_bytes: 10_240,
        large_file_warn_mb: 100,
    }
}

fn service(prober: FakeProber) -> PlaybackService<FakeProber> {
    PlaybackService::new(prober, ScopeSettings::default().policy(), settings())
}

fn padded(mut body: Vec<u8>) -> Vec<u8> {
    body.resize(20_000, 0);
    body
}

fn mov_url() -> String {
    format!("{}.mov", BASE)
}

fn mov_prober() -> FakeProber {
    FakeProber::new().route(&mov_url(), Route::ok(padded(ftyp(b"qt  "))))
}

#[tokio::test]
async fn mp4_is_returned_untouched() {
    let mp4 = format!("{}.mp4", BASE);
    let body = padded(ftyp(b"isom"));
    let prober = FakeProber::new().route(&mp4, Route::ok(body.clone()));
    let transcoder = StubTranscoder::succeeding(TranscodeMode::Remux);

    let media = service(prober)
        .with_transcoder(transcoder.clone(), 60)
        .prepare(&mp4)
        .await
        .unwrap();

    assert_eq!(media.content_type, "video/mp4");
    assert_eq!(media.label, "video/mp4");
    assert_eq!(media.file_name, "EFTA0001.mp4");
    assert_eq!(media.bytes.len(), body.len());
    assert!(media.warnings.is_empty());
    assert_eq!(transcoder.calls(), 0);
}

#[tokio::test]
async fn quicktime_is_remuxed() {
    let transcoder = StubTranscoder::succeeding(TranscodeMode::Remux);

    let media = service(mov_prober())
        .with_transcoder(transcoder.clone(), 60)
        .prepare(&mov_url())
        .await
        .unwrap();

    assert_eq!(media.content_type, "video/mp4");
    assert_eq!(media.label, "video/mp4 (remuxed from MOV)");
    assert_eq!(media.bytes, Bytes::from(ftyp(b"isom")));
    assert_eq!(transcoder.calls(), 1);
}

#[tokio::test]
async fn quicktime_reencode_is_labelled() {
    let media = service(mov_prober())
        .with_transcoder(StubTranscoder::succeeding(TranscodeMode::Reencode), 60)
        .prepare(&mov_url())
        .await
        .unwrap();

    assert_eq!(media.label, "video/mp4 (transcoded from MOV)");
}

#[tokio::test]
async fn failed_conversion_returns_original() {
    let media = service(mov_prober())
        .with_transcoder(StubTranscoder::failing(), 60)
        .prepare(&mov_url())
        .await
        .unwrap();

    assert_eq!(media.content_type, "video/quicktime");
    assert_eq!(media.bytes.len(), 20_000);
    assert_eq!(media.warnings.len(), 1);
    assert!(media.warnings[0].contains("conversion failed"));
}

#[tokio::test]
async fn oversized_quicktime_skips_conversion() {
    let transcoder = StubTranscoder::succeeding(TranscodeMode::Remux);

    let media = service(mov_prober())
        .with_transcoder(transcoder.clone(), 0)
        .prepare(&mov_url())
        .await
        .unwrap();

    assert_eq!(
        media.label,
        "video/quicktime (original - conversion skipped due to file size)"
    );
    assert_eq!(transcoder.calls(), 0);
    assert!(!media.warnings.is_empty());
}

#[tokio::test]
async fn huge_size_limits_do_not_overflow() {
    let transcoder = StubTranscoder::succeeding(TranscodeMode::Remux);
    let settings = PlaybackSettings {
        small_file_warn_bytes: 0,
        large_file_warn_mb: u64::MAX,
    };

    let media = PlaybackService::new(mov_prober(), ScopeSettings::default().policy(), settings)
        .with_transcoder(transcoder.clone(), u64::MAX)
        .prepare(&mov_url())
        .await
        .unwrap();

    assert_eq!(media.label, "video/mp4 (remuxed from MOV)");
    assert!(media.warnings.is_empty());
    assert_eq!(transcoder.calls(), 1);
}

#[tokio::test]
async fn quicktime_without_transcoder_warns() {
    let media = service(mov_prober()).prepare(&mov_url()).await.unwrap();

    assert_eq!(media.content_type, "video/quicktime");
    assert!(media.warnings[0].contains("ffmpeg is not available"));
}

#[tokio::test]
async fn quicktime_brand_under_other_extension_is_converted() {
    let mp4 = format!("{}.mp4", BASE);
    let prober = FakeProber::new().route(&mp4, Route::ok(padded(ftyp(b"qt  "))));
    let transcoder = StubTranscoder::succeeding(TranscodeMode::Remux);

    let media = service(prober)
        .with_transcoder(transcoder.clone(), 60)
        .prepare(&mp4)
        .await
        .unwrap();

    assert_eq!(media.label, "video/mp4 (remuxed from MOV)");
    assert_eq!(transcoder.calls(), 1);
}

#[tokio::test]
async fn tiny_files_are_flagged() {
    let mp4 = format!("{}.mp4", BASE);
    let prober = FakeProber::new().route(&mp4, Route::ok(ftyp(b"isom")));

    let media = service(prober).prepare(&mp4).await.unwrap();

    assert_eq!(media.warnings.len(), 1);
    assert!(media.warnings[0].contains("very small"));
}

#[tokio::test]
async fn content_type_falls_back_to_header_then_mp4() {
    let flv = format!("{}.flv", BASE);
    let raw = format!("{}.raw", BASE);
    let prober = FakeProber::new()
        .route(
            &flv,
            Route::ok(padded(b"FLV\x01".to_vec())).with_header("Content-Type", "video/x-flv"),
        )
        .route(&raw, Route::ok(padded(b"????".to_vec())));
    let service = service(prober);

    assert_eq!(service.prepare(&flv).await.unwrap().content_type, "video/x-flv");
    assert_eq!(service.prepare(&raw).await.unwrap().content_type, "video/mp4");
}

#[tokio::test]
async fn failures_map_to_errors() {
    let empty = format!("{}.m4v", BASE);
    let broken = format!("{}.avi", BASE);
    let prober = FakeProber::new()
        .route(&empty, Route::ok(Vec::new()))
        .route(&broken, Route::Fail);
    let service = service(prober);

    assert!(matches!(
        service.prepare("https://example.com/a.mov").await,
        Err(PlaybackError::OutOfScope(_))
    ));
    assert!(matches!(
        service.prepare(&format!("{}.webm", BASE)).await,
        Err(PlaybackError::Status(404))
    ));
    assert!(matches!(
        service.prepare(&empty).await,
        Err(PlaybackError::EmptyBody)
    ));
    assert!(matches!(
        service.prepare(&broken).await,
        Err(PlaybackError::Fetch(_))
    ));
}
