const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// 1024 进制的人类可读大小，保留两位小数
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0;
    let mut whole = bytes;
    while whole >= 1024 && exponent < UNITS.len() - 1 {
        whole /= 1024;
        exponent += 1;
    }
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}
