use url::Url;

/// 拆分出路径部分与 query/fragment 后缀
fn split_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

/// 路径以 `.pdf` 结尾 (忽略大小写) 时返回去掉后缀的基础地址
pub fn split_pdf_base(url: &str) -> Option<(String, String)> {
    let (path, suffix) = split_suffix(url);
    let cut = path.len().checked_sub(4)?;
    let tail = path.get(cut..)?;
    if !tail.eq_ignore_ascii_case(".pdf") {
        return None;
    }
    Some((path[..cut].to_string(), suffix.to_string()))
}

/// 在基础地址上拼接候选扩展名，保留原 query/fragment
pub fn with_extension(base: &str, extension: &str, suffix: &str) -> String {
    format!("{}.{}{}", base, extension, suffix)
}

/// URL 路径的扩展名 (小写)
pub fn path_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => split_suffix(url).0.to_string(),
    };
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// 替换路径中的扩展名；最后一段没有扩展名时追加
pub fn replace_file_extension(url: &str, extension: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return url.to_string();
    }

    let path = parsed.path().to_string();
    let last_slash = path.rfind('/');
    let new_path = match path.rfind('.') {
        Some(dot) if dot > 0 && last_slash.map_or(true, |slash| dot > slash) => {
            format!("{}.{}", &path[..dot], extension)
        }
        _ => format!("{}.{}", path, extension),
    };
    parsed.set_path(&new_path);
    parsed.to_string()
}

/// URL 最后一段作为文件名
pub fn file_name(url: &str) -> String {
    split_suffix(url)
        .0
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("video")
        .to_string()
}
