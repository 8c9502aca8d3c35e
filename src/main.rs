use std::sync::Arc;
use tracing::{info, warn};

use vtx_sniff::config::Settings;
use vtx_sniff::runtime::fallback::FallbackProber;
use vtx_sniff::runtime::ffmpeg::{Transcode, VtxFfmpegManager};
use vtx_sniff::runtime::http_client::HttpProber;
use vtx_sniff::web::{self, state::{AppState, SharedProber}};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vtx_sniff=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("[Startup] vtx-sniff initializing...");

    let settings = Settings::new()?;
    info!(
        "[Config] Binding at {}:{}",
        settings.server.host, settings.server.port
    );
    info!(
        "[Config] {} scope rule(s), {} alternative extension(s)",
        settings.scope.rules.len(),
        settings.probe.alternative_extensions.len()
    );

    let scope = settings.scope.policy();
    let direct = HttpProber::new(scope.clone(), settings.probe.max_redirects)?;
    let prober: SharedProber = match &settings.probe.session_cookie {
        Some(cookie) => {
            let session = HttpProber::new(scope.clone(), settings.probe.max_redirects)?
                .with_header("cookie", cookie)?
                .with_label("session");
            info!("[Startup] Session transport enabled with anonymous fallback");
            Arc::new(FallbackProber::new(session, direct))
        }
        None => Arc::new(direct),
    };

    let transcoder: Option<Arc<dyn Transcode>> =
        match VtxFfmpegManager::new(&settings.vtx_ffmpeg) {
            Ok(manager) => Some(Arc::new(manager)),
            Err(e) => {
                warn!("[VtxFfmpeg] Transcoding disabled: {}", e);
                None
            }
        };

    let state = Arc::new(AppState::new(&settings, prober, transcoder));
    let app = web::router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("[Startup] Service ready at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
