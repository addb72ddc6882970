use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use chrono::Utc;
use log::{debug, warn};
use rand::Rng;
use tempfile::NamedTempFile;
use crate::errors::AppError;

const TEMP_PREFIX: &str = ".upload-";
const MAX_NAME_ATTEMPTS: usize = 8;

/// Directory-backed storage for uploaded documents, one file per stored name.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

fn write_failure(context: &str, err: io::Error) -> AppError {
    warn!("{}: {}", context, err);
    AppError::WriteFailure(format!("{}: {}", context, err))
}

/// Extension of the caller's file name, kept only when it is plain ASCII
/// alphanumerics so it can never smuggle separators into the stored name.
fn safe_extension(original_file_name: &str) -> String {
    Path::new(original_file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 16 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

fn generate_name(extension: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}{}", millis, suffix, extension)
}

impl FileStore {
    /// Uses `root` as-is; see [`FileStore::open`] to create it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| write_failure("Failed to create upload directory", err))?;
        Ok(FileStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `content` under a freshly generated name and returns that name.
    ///
    /// The bytes go to a temporary file in the root first and are linked into
    /// place only once fully flushed; the temporary file is deleted on any
    /// failure.
    pub fn save(&self, original_file_name: &str, content: &[u8]) -> Result<String, AppError> {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|err| write_failure("Failed to create upload file", err))?;
        temp.write_all(content)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|err| write_failure("Failed to write upload file", err))?;

        let extension = safe_extension(original_file_name);
        let mut pending: NamedTempFile = temp;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let stored_name = generate_name(&extension);
            match pending.persist_noclobber(self.root.join(&stored_name)) {
                Ok(_) => {
                    debug!("Stored {} ({} bytes) as {}", original_file_name, content.len(), stored_name);
                    return Ok(stored_name);
                }
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("Stored name {} already taken, retrying", stored_name);
                    pending = err.file;
                }
                Err(err) => return Err(write_failure("Failed to persist upload file", err.error)),
            }
        }

        Err(AppError::WriteFailure("Could not allocate a unique file name".to_string()))
    }

    /// Deletes the file behind `stored_file_name`. A file that is already gone
    /// counts as removed.
    pub fn remove(&self, stored_file_name: &str) -> Result<(), AppError> {
        let path = self.resolve_path(stored_file_name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed stored file {}", stored_file_name);
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("Stored file {} already absent", stored_file_name);
                Ok(())
            }
            Err(err) => Err(write_failure("Failed to remove stored file", err)),
        }
    }

    pub fn resolve_path(&self, stored_file_name: &str) -> Result<PathBuf, AppError> {
        let invalid = || AppError::InvalidName(stored_file_name.to_string());

        if stored_file_name.is_empty()
            || stored_file_name.starts_with('.')
            || stored_file_name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
        {
            return Err(invalid());
        }

        let mut components = Path::new(stored_file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if part == stored_file_name => Ok(self.root.join(part)),
            _ => Err(invalid()),
        }
    }

    /// Names of the stored files currently under the root, excluding
    /// in-flight temporary uploads.
    pub fn stored_names(&self) -> Result<Vec<String>, AppError> {
        let mut names = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|err| write_failure("Failed to read upload directory", err))?;
        for entry in entries {
            let entry = entry.map_err(|err| write_failure("Failed to read upload directory", err))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if let Some(name) = entry.file_name().to_str() {
                if is_file && !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
