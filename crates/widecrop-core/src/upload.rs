//! Choosing which uploaded file to open.
//!
//! Both the file picker and drag-and-drop hand over a list of files; only the
//! first one is considered, and only if its MIME type says it is an image.
//! Anything else is dropped without a message.

/// What the host knows about a picked or dropped file before reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    /// MIME type as reported by the browser (may be empty).
    pub mime_type: String,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// True when the MIME type starts with `image/`.
///
/// This is a prefix check only; the bytes are not sniffed here.
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// Pick the file to open from a selection or drop.
///
/// Returns the first file if it is an image. Later files are never
/// considered, even when the first one is rejected.
pub fn select_image(files: &[FileInfo]) -> Option<&FileInfo> {
    let first = files.first()?;
    if is_image_mime(&first.mime_type) {
        Some(first)
    } else {
        log::debug!("ignoring non-image upload {:?} ({})", first.name, first.mime_type);
        None
    }
}
