use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::binary::{verify_binary, FfmpegBinary};
use super::{Transcode, TranscodeError, TranscodeMode, Transcoded};
use crate::config::VtxFfmpegSettings;

#[derive(Debug)]
pub enum FatalError {
    EnvironmentBroken(String),
}

impl std::fmt::Display for FatalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FatalError::EnvironmentBroken(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for FatalError {}

/// 先尝试只换容器（不重新编码），内存占用最低
const REMUX_ARGS: &[&str] = &["-c", "copy", "-movflags", "+faststart"];

/// 换容器失败时的轻量转码
const REENCODE_ARGS: &[&str] = &[
    "-vf",
    "scale=min(960\\,iw):-2",
    "-c:v",
    "mpeg4",
    "-q:v",
    "8",
    "-c:a",
    "aac",
    "-b:a",
    "96k",
    "-threads",
    "1",
];

/// QuickTime -> MP4 转码器
pub struct VtxFfmpegManager {
    binary: FfmpegBinary,
    work_dir: PathBuf,
    pub execution_timeout_secs: u64,
}

impl VtxFfmpegManager {
    pub fn new(settings: &VtxFfmpegSettings) -> Result<Self, FatalError> {
        let path = resolve_ffmpeg_path(settings)?;

        let binary = verify_binary(&path).map_err(|e| {
            FatalError::EnvironmentBroken(format!(
                "ffmpeg failed verification ({}): {}",
                path.display(),
                e
            ))
        })?;

        info!(
            "[VtxFfmpeg] Using {} ({}) at {}",
            binary.identity,
            binary.version,
            binary.path.display()
        );

        Ok(Self {
            binary,
            work_dir: settings.work_dir.clone(),
            execution_timeout_secs: settings.execution_timeout_secs,
        })
    }

    pub fn binary(&self) -> &FfmpegBinary {
        &self.binary
    }

    async fn run_stage(
        &self,
        input: &Path,
        output: &Path,
        stage_args: &[&str],
    ) -> Result<(), TranscodeError> {
        let mut cmd = tokio::process::Command::new(&self.binary.path);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(input)
            .args(stage_args)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| TranscodeError::Spawn(e.to_string()))?;

        let result = if self.execution_timeout_secs == 0 {
            child.wait_with_output().await
        } else {
            tokio::time::timeout(
                Duration::from_secs(self.execution_timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| TranscodeError::Timeout(self.execution_timeout_secs))?
        };

        let output = result.map_err(|e| TranscodeError::Io(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscodeError::Failed {
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    async fn convert(&self, input: &Path, output: &Path) -> Result<TranscodeMode, TranscodeError> {
        match self.run_stage(input, output, REMUX_ARGS).await {
            Ok(()) => Ok(TranscodeMode::Remux),
            Err(remux_error) => {
                warn!(
                    "[VtxFfmpeg] Remux failed, trying lightweight transcode: {}",
                    remux_error
                );
                let _ = tokio::fs::remove_file(output).await;
                self.run_stage(input, output, REENCODE_ARGS).await?;
                Ok(TranscodeMode::Reencode)
            }
        }
    }
}

#[async_trait::async_trait]
impl Transcode for VtxFfmpegManager {
    async fn transcode(&self, input: Bytes) -> Result<Transcoded, TranscodeError> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| TranscodeError::Io(e.to_string()))?;

        let id = Uuid::new_v4();
        let input_path = self.work_dir.join(format!("{}-input.mov", id));
        let output_path = self.work_dir.join(format!("{}-output.mp4", id));

        tokio::fs::write(&input_path, &input)
            .await
            .map_err(|e| TranscodeError::Io(e.to_string()))?;
        debug!(
            "[VtxFfmpeg] Converting {} bytes ({})",
            input.len(),
            input_path.display()
        );

        let result = match self.convert(&input_path, &output_path).await {
            Ok(mode) => tokio::fs::read(&output_path)
                .await
                .map_err(|e| TranscodeError::Io(e.to_string()))
                .and_then(|data| {
                    if data.is_empty() {
                        Err(TranscodeError::EmptyOutput)
                    } else {
                        Ok(Transcoded {
                            bytes: Bytes::from(data),
                            mode,
                        })
                    }
                }),
            Err(e) => Err(e),
        };

        let _ = tokio::fs::remove_file(&input_path).await;
        let _ = tokio::fs::remove_file(&output_path).await;
        result
    }
}

fn resolve_ffmpeg_path(settings: &VtxFfmpegSettings) -> Result<PathBuf, FatalError> {
    if let Some(path) = &settings.binary_path {
        if !path.is_file() {
            return Err(FatalError::EnvironmentBroken(format!(
                "vtx_ffmpeg.binary_path points to a missing file: {}",
                path.display()
            )));
        }
        return Ok(path.clone());
    }
    if settings.use_system_binary {
        return Ok(PathBuf::from("ffmpeg"));
    }
    Err(FatalError::EnvironmentBroken(
        "No ffmpeg binary configured and system binary disabled".to_string(),
    ))
}
