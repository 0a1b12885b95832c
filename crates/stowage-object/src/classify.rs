//! Content classification from declared media type and file extension.
//!
//! The classifier decides how an object body is materialised: text is
//! decoded and returned inline, everything else is handled as opaque bytes.
//! Unrecognised content is never guessed to be text, since decoding binary
//! data as text corrupts it.

use mime::Mime;
use serde::Serialize;

/// Classification of an object's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentClass {
    /// Known textual format.
    Text,
    /// Known binary format.
    Binary,
    /// Nothing matched; handled as [`Binary`](Self::Binary).
    Unknown,
}

impl ContentClass {
    /// Returns the class the content is materialised as.
    ///
    /// [`Unknown`](Self::Unknown) collapses to [`Binary`](Self::Binary).
    #[inline]
    pub fn effective(self) -> Self {
        match self {
            Self::Unknown => Self::Binary,
            other => other,
        }
    }

    /// Whether the content is decoded as text.
    #[inline]
    pub fn is_text(self) -> bool {
        self == Self::Text
    }
}

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "log", "json", "jsonl", "ndjson", "xml", "yml", "yaml", "md", "markdown", "csv",
    "tsv", "ini", "conf", "py", "js", "mjs", "html", "htm", "css", "sh", "bash", "cfg",
    "properties", "ts", "tsx", "jsx", "sql", "env", "toml", "rst", "tex", "rs", "go", "java",
    "svg",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "ico", "heic", "avif",
    "mp3", "wav", "flac", "ogg", "m4a", "mp4", "mov", "avi", "mkv", "webm", "zip", "gz", "tgz",
    "tar", "bz2", "xz", "zst", "7z", "rar", "jar", "exe", "dll", "so", "dylib", "bin", "wasm",
    "class", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "parquet", "avro",
    "orc", "woff", "woff2", "ttf", "otf", "sqlite", "db",
];

const TEXT_APPLICATION_SUBTYPES: &[&str] = &[
    "json",
    "ld+json",
    "x-ndjson",
    "xml",
    "javascript",
    "ecmascript",
    "x-javascript",
    "yaml",
    "x-yaml",
    "toml",
    "x-toml",
    "sql",
    "x-sh",
    "x-shellscript",
    "csv",
    "x-httpd-php",
    "graphql",
    "x-tex",
    "rtf",
];

const BINARY_APPLICATION_SUBTYPES: &[&str] = &[
    "pdf",
    "zip",
    "gzip",
    "x-gzip",
    "x-tar",
    "x-7z-compressed",
    "x-rar-compressed",
    "vnd.rar",
    "x-bzip2",
    "x-xz",
    "zstd",
    "java-archive",
    "x-executable",
    "x-msdownload",
    "x-mach-binary",
    "x-sharedlib",
    "wasm",
    "msword",
    "vnd.ms-excel",
    "vnd.ms-powerpoint",
    "vnd.apache.parquet",
    "x-parquet",
    "vnd.sqlite3",
    "x-sqlite3",
];

/// Classifies content by declared media type and/or object key extension.
///
/// A specific declared media type takes precedence. A missing, unparseable,
/// or generic (`application/octet-stream`) type defers to the extension.
pub fn classify(content_type: Option<&str>, key: Option<&str>) -> ContentClass {
    if let Some(class) = content_type.and_then(classify_media_type) {
        return class;
    }
    key.and_then(extension)
        .map(|ext| classify_extension(&ext))
        .unwrap_or(ContentClass::Unknown)
}

/// Whether the object is a PDF by media type or extension.
pub fn is_pdf(content_type: Option<&str>, key: &str) -> bool {
    let declared = content_type
        .and_then(|ct| ct.parse::<Mime>().ok())
        .is_some_and(|m| m.essence_str() == "application/pdf");
    declared || extension(key).as_deref() == Some("pdf")
}

/// Classifies a media type, returning `None` when it carries no information.
fn classify_media_type(content_type: &str) -> Option<ContentClass> {
    let mime: Mime = content_type.trim().parse().ok()?;
    if mime.essence_str() == mime::APPLICATION_OCTET_STREAM.essence_str() {
        return None;
    }

    let subtype = mime.subtype().as_str();
    let suffix = mime.suffix().map(|s| s.as_str());

    let class = match mime.type_().as_str() {
        "text" => ContentClass::Text,
        "image" if subtype == "svg" && suffix == Some("xml") => ContentClass::Text,
        "image" | "audio" | "video" | "font" => ContentClass::Binary,
        "application" => {
            let essence = match suffix {
                Some(suffix) => format!("{subtype}+{suffix}"),
                None => subtype.to_owned(),
            };
            if TEXT_APPLICATION_SUBTYPES.contains(&essence.as_str())
                || matches!(suffix, Some("json" | "xml" | "yaml"))
            {
                ContentClass::Text
            } else if BINARY_APPLICATION_SUBTYPES.contains(&essence.as_str())
                || subtype.starts_with("vnd.openxmlformats")
                || subtype.starts_with("vnd.oasis.opendocument")
                || suffix == Some("zip")
            {
                ContentClass::Binary
            } else {
                return None;
            }
        }
        _ => return None,
    };
    Some(class)
}

fn classify_extension(ext: &str) -> ContentClass {
    if TEXT_EXTENSIONS.contains(&ext) {
        ContentClass::Text
    } else if BINARY_EXTENSIONS.contains(&ext) {
        ContentClass::Binary
    } else {
        ContentClass::Unknown
    }
}

/// Lowercased extension of the last key segment, if any.
fn extension(key: &str) -> Option<String> {
    let name = key.rsplit('/').next()?;
    // `.env` style names count as their own extension.
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}
