use crate::services::compression::CompressionFormat;
use std::path::Path;

/// Key separator used by the object store.
pub const SEPARATOR: char = '/';

/// Collapses a folder path into `a/b/c` form: no leading, trailing or repeated
/// separators. Returns `None` when nothing is left.
pub fn normalize_folder(folder: Option<&str>) -> Option<String> {
    let segments: Vec<&str> = folder?
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Joins an optional folder with a name. Used directly for downloads, where the
/// name already carries its format suffix.
pub fn source_key(folder: Option<&str>, object_name: &str) -> String {
    match normalize_folder(folder) {
        Some(folder) => format!("{}/{}", folder, object_name),
        None => object_name.to_string(),
    }
}

/// Key for a compressed upload: `{folder}/{object_name}.{format}`.
pub fn object_key(folder: Option<&str>, object_name: &str, format: CompressionFormat) -> String {
    source_key(folder, &format!("{}.{}", object_name, format.as_str()))
}

/// Listing prefixes always end with a separator unless empty.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with(SEPARATOR) {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, SEPARATOR)
    }
}

pub fn public_url(bucket: &str, region_host: &str, key: &str) -> String {
    format!("https://{}.{}/{}", bucket, region_host, key)
}

/// Final path component, lossily converted.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extension without the leading dot, empty when there is none.
pub fn file_type(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}
