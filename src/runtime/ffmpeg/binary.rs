use std::path::{Path, PathBuf};
use std::process::Command;

/// 描述一个可用的 ffmpeg 二进制文件
#[derive(Debug, Clone)]
pub struct FfmpegBinary {
    /// 可执行文件路径（可以是 PATH 中的命令名）
    pub path: PathBuf,
    /// 解析出的版本号 (e.g., "v0.1.3" 或 "6.0")
    pub version: String,
    /// 完整的构建标识 (e.g., "vtx-v0.1.3-a5e16b0" 或 "system-ffmpeg-6.0")
    pub identity: String,
}

/// 运行 `ffmpeg -version` 获取元数据
///
/// 兼容 vtx 定制版输出格式与标准 FFmpeg 输出格式
pub fn verify_binary(path: &Path) -> anyhow::Result<FfmpegBinary> {
    let output = Command::new(path)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("Failed to execute: {}", e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("Non-zero exit code"));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let (identity, version) = parse_version_banner(&stdout);

    Ok(FfmpegBinary {
        path: path.to_path_buf(),
        version,
        identity,
    })
}

/// 从 `-version` 输出中解析 (identity, version)
pub fn parse_version_banner(stdout: &str) -> (String, String) {
    // 示例输出: "vtx-v0.1.3-a5e16b0 Copyright (c) ..."
    if let Some(vtx_id) = stdout.split_whitespace().find(|s| s.starts_with("vtx-")) {
        let version = vtx_id.split('-').nth(1).unwrap_or("0.0.0").to_string();
        return (vtx_id.to_string(), version);
    }

    // 示例输出: "ffmpeg version 4.4.2-0ubuntu0.22.04.1 Copyright (c) ..."
    if stdout.starts_with("ffmpeg version") {
        let parts: Vec<&str> = stdout.split_whitespace().collect();
        if parts.len() >= 3 {
            let version = parts[2].to_string();
            let identity = format!("system-ffmpeg-{}", version);
            return (identity, version);
        }
    }

    ("unknown-build".to_string(), "0.0.0".to_string())
}
