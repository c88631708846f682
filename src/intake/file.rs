use std::path::{Path, PathBuf};

/// Where the bytes of an incoming file live
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A file on disk, read lazily
    Path(PathBuf),
    /// Contents already in memory
    Bytes(Vec<u8>),
}

/// A file handed over by the drop zone or the file picker
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    /// Media type declared by the sender, if any
    pub content_type: Option<String>,
    pub source: FileSource,
}

impl IncomingFile {
    /// A file on disk with no declared type
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Self {
            name,
            content_type: None,
            source: FileSource::Path(path.to_path_buf()),
        }
    }

    /// In-memory contents with a declared type
    pub fn from_bytes<S: Into<String>>(name: S, content_type: S, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: Some(content_type.into()),
            source: FileSource::Bytes(bytes),
        }
    }

    /// Declared type, else a guess from the file name.
    ///
    /// An empty declared type counts as undeclared.
    pub fn media_type(&self) -> Option<String> {
        match self.content_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() => Some(declared.to_ascii_lowercase()),
            _ => mime_guess::from_path(&self.name)
                .first()
                .map(|mime| mime.essence_str().to_string()),
        }
    }

    pub async fn size(&self) -> std::io::Result<u64> {
        match &self.source {
            FileSource::Path(path) => Ok(tokio::fs::metadata(path).await?.len()),
            FileSource::Bytes(bytes) => Ok(bytes.len() as u64),
        }
    }

    pub async fn read(self) -> std::io::Result<Vec<u8>> {
        match self.source {
            FileSource::Path(path) => tokio::fs::read(path).await,
            FileSource::Bytes(bytes) => Ok(bytes),
        }
    }
}
