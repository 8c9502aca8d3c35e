use crate::common::url_ext::split_pdf_base;
use crate::detect::{DetectionResult, PDF_MIME};

/// 判定一次识别结果是否"可疑"，需要换扩展名重新探测
///
/// 返回 `Some(base)` 时表示触发，`base` 为拼接候选扩展名的基础地址。
pub trait AmbiguityPredicate: Send + Sync {
    fn alternative_base(&self, url: &str, detection: &DetectionResult) -> Option<AlternativeBase>;
}

/// 候选地址 = `stem` + "." + 扩展名 + `suffix`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternativeBase {
    pub stem: String,
    pub suffix: String,
}

/// `.pdf` 地址返回 PDF 魔数：部分站点在字面 `.pdf` 路径上提供占位文档，
/// 真实媒体位于同名不同扩展名的路径下
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfPlaceholder;

impl AmbiguityPredicate for PdfPlaceholder {
    fn alternative_base(&self, url: &str, detection: &DetectionResult) -> Option<AlternativeBase> {
        if !detection.is_magic(PDF_MIME) {
            return None;
        }
        let (stem, suffix) = split_pdf_base(url)?;
        Some(AlternativeBase { stem, suffix })
    }
}
