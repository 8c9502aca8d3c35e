use std::sync::Arc;

use crate::config::Settings;
use crate::reconcile::{Prober, Reconciler};
use crate::runtime::ffmpeg::Transcode;
use crate::runtime::inspector::Inspector;
use crate::runtime::playback::PlaybackService;

pub type SharedProber = Arc<dyn Prober>;

/// Web 应用全局状态
///
/// 职责：包含所有跨请求共享的对象，通过 Arc 注入到 Axum 的 Handler 中。
/// 每次识别的结果都由调用返回，这里不保存任何请求间的可变状态。
pub struct AppState {
    pub inspector: Inspector<SharedProber>,
    pub playback: PlaybackService<SharedProber>,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        prober: SharedProber,
        transcoder: Option<Arc<dyn Transcode>>,
    ) -> Self {
        let scope = settings.scope.policy();
        let timeouts = settings.probe.timeouts();

        let reconciler = Reconciler::new()
            .with_extensions(settings.probe.alternative_extensions.clone())
            .with_sniff_bytes(settings.probe.sniff_bytes)
            .with_timeouts(timeouts);

        let inspector = Inspector::new(prober.clone(), scope.clone(), reconciler)
            .with_timeouts(timeouts)
            .with_sniff_bytes(settings.probe.sniff_bytes);

        let mut playback =
            PlaybackService::new(prober, scope, settings.playback.clone()).with_timeouts(timeouts);
        if let Some(transcoder) = transcoder {
            playback = playback.with_transcoder(transcoder, settings.vtx_ffmpeg.max_convert_mb);
        }

        Self {
            inspector,
            playback,
        }
    }
}
