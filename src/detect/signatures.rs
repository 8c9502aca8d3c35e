use super::container::{recognize_avi, recognize_iso_bmff};

/// 固定魔数规则: 一个 MIME 类型对应若干个 offset 0 处的前缀
#[derive(Debug, Clone, Copy)]
pub struct SignatureRule {
    pub mime_type: &'static str,
    pub patterns: &'static [&'static [u8]],
}

impl SignatureRule {
    /// buffer 长度不足时该规则直接视为不匹配
    pub fn matches(&self, bytes: &[u8]) -> bool {
        self.patterns
            .iter()
            .any(|pattern| bytes.len() >= pattern.len() && bytes.starts_with(pattern))
    }
}

/// 识别器种类
#[derive(Debug, Clone, Copy)]
pub enum Recognizer {
    /// 需要解析头部字段的容器格式
    Structural {
        name: &'static str,
        recognize: fn(&[u8]) -> Option<&'static str>,
    },
    /// 固定前缀匹配
    Fixed(SignatureRule),
}

impl Recognizer {
    pub fn recognize(&self, bytes: &[u8]) -> Option<&'static str> {
        match self {
            Recognizer::Structural { recognize, .. } => recognize(bytes),
            Recognizer::Fixed(rule) => rule.matches(bytes).then_some(rule.mime_type),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Recognizer::Structural { name, .. } => name,
            Recognizer::Fixed(rule) => rule.mime_type,
        }
    }
}

/// 固定魔数表，按声明顺序匹配
pub const SIGNATURE_TABLE: &[SignatureRule] = &[
    SignatureRule {
        mime_type: "application/pdf",
        patterns: &[b"%PDF"],
    },
    SignatureRule {
        mime_type: "image/png",
        patterns: &[&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]],
    },
    SignatureRule {
        mime_type: "image/jpeg",
        patterns: &[&[0xFF, 0xD8, 0xFF]],
    },
    SignatureRule {
        mime_type: "image/gif",
        patterns: &[b"GIF89a", b"GIF87a"],
    },
    SignatureRule {
        mime_type: "video/webm",
        patterns: &[&[0x1A, 0x45, 0xDF, 0xA3]],
    },
    SignatureRule {
        mime_type: "application/zip",
        patterns: &[
            &[0x50, 0x4B, 0x03, 0x04],
            &[0x50, 0x4B, 0x05, 0x06],
            &[0x50, 0x4B, 0x07, 0x08],
        ],
    },
];

/// 完整识别顺序: 容器结构优先，其次固定魔数表
///
/// 顺序不可调整，RIFF/ftyp 必须在通用前缀匹配之前排除。
pub const RECOGNIZERS: &[Recognizer] = &[
    Recognizer::Structural {
        name: "riff-avi",
        recognize: recognize_avi,
    },
    Recognizer::Structural {
        name: "iso-bmff",
        recognize: recognize_iso_bmff,
    },
    Recognizer::Fixed(SIGNATURE_TABLE[0]),
    Recognizer::Fixed(SIGNATURE_TABLE[1]),
    Recognizer::Fixed(SIGNATURE_TABLE[2]),
    Recognizer::Fixed(SIGNATURE_TABLE[3]),
    Recognizer::Fixed(SIGNATURE_TABLE[4]),
    Recognizer::Fixed(SIGNATURE_TABLE[5]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rules_follow_table_order() {
        let fixed: Vec<&str> = RECOGNIZERS
            .iter()
            .filter_map(|r| match r {
                Recognizer::Fixed(rule) => Some(rule.mime_type),
                Recognizer::Structural { .. } => None,
            })
            .collect();
        let table: Vec<&str> = SIGNATURE_TABLE.iter().map(|r| r.mime_type).collect();
        assert_eq!(fixed, table);
    }

    #[test]
    fn short_buffer_fails_rule_without_panicking() {
        let png = &SIGNATURE_TABLE[1];
        assert!(!png.matches(&[0x89, 0x50, 0x4E]));
        assert!(!png.matches(&[]));
    }
}
