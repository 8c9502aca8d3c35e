//! 容器结构识别 (RIFF / ISO-BMFF)
//!
//! 与固定魔数不同，这里需要解析头部的少量字段才能得到子类型。

/// RIFF 头部长度: "RIFF" + size(4) + form type(4)
const RIFF_HEADER_LEN: usize = 12;

/// ftyp box 头部长度: size(4) + "ftyp" + major brand(4)
const FTYP_HEADER_LEN: usize = 12;

/// 第一个 box 允许的最大声明长度，超过视为损坏
const MAX_FTYP_BOX_SIZE: u32 = 4096;

/// 最小合法 box 长度 (size + type)
const MIN_BOX_SIZE: u32 = 8;

/// size == 1 表示后面跟着 64 位扩展长度
const EXTENDED_SIZE_MARKER: u32 = 1;

/// MP4 家族中统一映射为 video/mp4 的 major brand
const MP4_BRANDS: &[&str] = &[
    "isom", "iso2", "iso3", "iso4", "iso5", "iso6", "mp41", "mp42", "avc1", "dash", "msnv",
    "f4v", "f4p", "f4a", "f4b",
];

/// 读取 RIFF form type (offset 8..12)
///
/// 仅当 buffer 以 "RIFF" 开头且长度足够时返回。
pub fn riff_form_type(bytes: &[u8]) -> Option<[u8; 4]> {
    if bytes.len() < RIFF_HEADER_LEN || &bytes[0..4] != b"RIFF" {
        return None;
    }
    let mut form = [0u8; 4];
    form.copy_from_slice(&bytes[8..12]);
    Some(form)
}

/// AVI 识别：RIFF 容器且 form type 为 "AVI " 或 "AVIX"
pub fn recognize_avi(bytes: &[u8]) -> Option<&'static str> {
    match &riff_form_type(bytes)? {
        b"AVI " | b"AVIX" => Some("video/x-msvideo"),
        _ => None,
    }
}

/// 读取 ISO-BMFF 第一个 box 的 major brand
///
/// 要求 offset 4 处为 "ftyp"，并且声明的 box 长度可信
/// (等于 1，或位于 [8, 4096] 区间内)。
pub fn iso_bmff_major_brand(bytes: &[u8]) -> Option<[u8; 4]> {
    if bytes.len() < FTYP_HEADER_LEN || &bytes[4..8] != b"ftyp" {
        return None;
    }

    let box_size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let plausible = box_size == EXTENDED_SIZE_MARKER
        || (MIN_BOX_SIZE..=MAX_FTYP_BOX_SIZE).contains(&box_size);
    if !plausible {
        return None;
    }

    let mut brand = [0u8; 4];
    brand.copy_from_slice(&bytes[8..12]);
    Some(brand)
}

/// 将 major brand 映射为 MIME 类型
///
/// 结构合法但 brand 未知时仍返回 video/mp4。
pub fn brand_to_mime(brand: &[u8; 4]) -> &'static str {
    let normalized = String::from_utf8_lossy(brand)
        .trim_end_matches([' ', '\0'])
        .to_ascii_lowercase();

    match normalized.as_str() {
        "m4a" => "audio/mp4",
        "m4v" => "video/x-m4v",
        "qt" => "video/quicktime",
        b if b.starts_with("3gp") => "video/3gpp",
        b if MP4_BRANDS.contains(&b) => "video/mp4",
        _ => "video/mp4",
    }
}

/// ISO-BMFF 识别入口
pub fn recognize_iso_bmff(bytes: &[u8]) -> Option<&'static str> {
    iso_bmff_major_brand(bytes).map(|brand| brand_to_mime(&brand))
}
