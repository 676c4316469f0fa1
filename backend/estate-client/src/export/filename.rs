//! Filename derivation for downloaded files.

use std::borrow::Cow;

/// Extract the suggested filename from a `Content-Disposition` value.
///
/// `filename*` (RFC 5987, percent-encoded with a charset prefix) wins over
/// `filename`. Both forms are percent-decoded. Directory components are stripped so
/// a hostile header cannot point outside the download directory. Pure: the same
/// header always yields the same name.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_params(header) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_extended(value.trim()),
            "filename" => plain = Some(percent_decode(&unquote(value.trim()))),
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| sanitize(&name))
        .filter(|name| !name.is_empty())
}

/// Fallback name when the server sent no usable `Content-Disposition`.
pub fn default_filename(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let extension = match essence.as_str() {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.ms-excel" => "xls",
        "application/pdf" => "pdf",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/msword" => "doc",
        "text/csv" => "csv",
        "application/zip" => "zip",
        _ => "bin",
    };
    format!("export.{extension}")
}

/// Split on `;` outside double quotes.
fn split_params(header: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, ch) in header.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&header[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    params.push(&header[start..]);
    params
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// `UTF-8''na%C3%AFve.xlsx` -> `naïve.xlsx`. The language tag is ignored.
fn decode_extended(value: &str) -> Option<String> {
    let value = unquote(value);
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    if !charset.eq_ignore_ascii_case("utf-8") && !charset.is_empty() {
        return Some(encoded.to_string());
    }
    Some(percent_decode(encoded))
}

fn percent_decode(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(Cow::Borrowed(decoded)) => decoded.to_string(),
        Ok(Cow::Owned(decoded)) => decoded,
        Err(_) => value.to_string(),
    }
}

fn sanitize(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "." | ".." => String::new(),
        _ => last.to_string(),
    }
}
