//! 候选打分

/// 任一有效的非 PDF 识别结果的基础分
pub const BASE_SCORE: i32 = 10;
/// 扩展名与识别出的 MIME 一致
pub const EXTENSION_MATCH_BONUS: i32 = 100;
/// 音视频类型
pub const MEDIA_BONUS: i32 = 15;
/// 明确识别为 AVI
pub const AVI_BONUS: i32 = 15;

/// 扩展名 -> 期望 MIME
pub const EXPECTED_MIME_BY_EXTENSION: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4a", "audio/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("3gp", "video/3gpp"),
    ("avi", "video/x-msvideo"),
    ("webm", "video/webm"),
];

pub fn expected_mime(extension: &str) -> Option<&'static str> {
    EXPECTED_MIME_BY_EXTENSION
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
}

/// 为一次探测结果打分，只依赖扩展名与识别出的类型
pub fn score_candidate(extension: &str, detected: &str) -> i32 {
    let mut score = BASE_SCORE;
    if expected_mime(extension) == Some(detected) {
        score += EXTENSION_MATCH_BONUS;
    }
    if detected.starts_with("video/") || detected.starts_with("audio/") {
        score += MEDIA_BONUS;
    }
    if detected == "video/x-msvideo" {
        score += AVI_BONUS;
    }
    score
}
