use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// URL prefix under which the store directory is served.
pub const STATIC_ROUTE: &str = "/static";

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub url: String,
}

impl ImageStore {
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under the client-supplied name, replacing any earlier
    /// upload with the same name. Directory components are dropped so the
    /// write always lands inside the store.
    pub fn store(&self, filename: &str, bytes: &[u8]) -> io::Result<StoredImage> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid upload filename {:?}", filename),
                )
            })?;

        let path = self.root.join(name);
        fs::write(&path, bytes)?;
        tracing::debug!("Stored {} bytes at {:?}", bytes.len(), path);

        Ok(StoredImage {
            url: format!("{}/{}", STATIC_ROUTE, urlencoding::encode(name)),
            path,
        })
    }
}
