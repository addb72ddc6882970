use std::sync::{Mutex, MutexGuard, PoisonError};
use std::path::PathBuf;
use chrono::Utc;
use log::{info, warn};
use crate::errors::AppError;
use crate::models::cv::{CvEntry, NewCv};
use crate::store::files::FileStore;
use crate::store::index::CvIndex;
use crate::utils::validation::invalid_fields;

/// Name reported for a missing or empty upload.
pub const FILE_FIELD: &str = "cvFile";

/// Owns the submission index and the storage its records are bound to.
///
/// Every record in the index has its file in `files`; deleting a record
/// removes the file first and the index entry last.
#[derive(Debug)]
pub struct CvService {
    index: Mutex<CvIndex>,
    files: FileStore,
}

impl CvService {
    pub fn new(files: FileStore) -> Self {
        CvService {
            index: Mutex::new(CvIndex::new()),
            files,
        }
    }

    // Index mutations are single map operations, so a panic elsewhere while
    // the lock was held cannot leave the index half-updated.
    fn index(&self) -> MutexGuard<'_, CvIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn files(&self) -> &FileStore {
        &self.files
    }

    pub fn submit(&self, new_cv: NewCv, original_file_name: &str, content: &[u8]) -> Result<CvEntry, AppError> {
        let mut missing = invalid_fields(&new_cv);
        if content.is_empty() {
            missing.push(FILE_FIELD.to_string());
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(missing));
        }

        // Written outside the lock; the record only becomes visible once the
        // file is complete.
        let stored_file_name = self.files.save(original_file_name, content)?;

        let mut index = self.index();
        let entry = CvEntry {
            id: index.next_id(),
            name: new_cv.name,
            email: new_cv.email,
            phone: new_cv.phone,
            stored_file_name,
            original_file_name: original_file_name.to_string(),
            submitted_at: Utc::now(),
        };
        index.insert(entry.clone());
        info!(
            "Stored CV {} ({}) as {}, {} indexed",
            entry.id,
            entry.original_file_name,
            entry.stored_file_name,
            index.len()
        );

        Ok(entry)
    }

    pub fn list(&self) -> Vec<CvEntry> {
        self.index().list()
    }

    pub fn get(&self, id: u64) -> Result<CvEntry, AppError> {
        self.index().get_by_id(id).cloned()
    }

    /// Removes the record and its file. If the file cannot be removed the
    /// record stays indexed so the caller can retry.
    pub fn delete(&self, id: u64) -> Result<CvEntry, AppError> {
        let mut index = self.index();
        let stored_file_name = index.get_by_id(id)?.stored_file_name.clone();

        if let Err(err) = self.files.remove(&stored_file_name) {
            warn!("Keeping CV {} indexed, file removal failed: {}", id, err);
            return Err(err);
        }

        let entry = index.remove_by_id(id)?;
        info!("Deleted CV {} and its file {}, {} indexed", id, entry.stored_file_name, index.len());
        Ok(entry)
    }

    pub fn resolve_path(&self, stored_file_name: &str) -> Result<PathBuf, AppError> {
        self.files.resolve_path(stored_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn service() -> (TempDir, CvService) {
        let dir = TempDir::new().unwrap();
        let files = FileStore::open(dir.path()).unwrap();
        (dir, CvService::new(files))
    }

    fn alice() -> NewCv {
        NewCv::new("Alice", "a@x.com", "555-0100")
    }

    #[test]
    fn submit_binds_file_and_assigns_ids() {
        let (_dir, service) = service();

        let first = service.submit(alice(), "resume.pdf", b"%PDF-1.4...").unwrap();
        let second = service.submit(alice(), "resume.pdf", b"%PDF-1.4...").unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.original_file_name, "resume.pdf");
        assert_ne!(first.stored_file_name, "resume.pdf");
        assert_ne!(first.stored_file_name, second.stored_file_name);

        let stored = service.get(1).unwrap();
        let path = service.resolve_path(&stored.stored_file_name).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"%PDF-1.4...");
    }

    #[test]
    fn incomplete_submission_has_no_side_effects() {
        let (dir, service) = service();

        let err = service.submit(NewCv::new("Alice", "", "555-0100"), "resume.pdf", b"").unwrap_err();
        assert_eq!(err, AppError::Validation(vec!["email".to_string(), FILE_FIELD.to_string()]));

        let err = service.submit(NewCv::new("", "a@x.com", ""), "resume.pdf", b"data").unwrap_err();
        assert_eq!(err, AppError::Validation(vec!["name".to_string(), "phone".to_string()]));

        assert!(service.list().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(service.submit(alice(), "resume.pdf", b"data").unwrap().id, 1);
    }

    #[test]
    fn write_failure_creates_no_record_and_consumes_no_id() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let service = CvService::new(FileStore::new(&blocker));

        let err = service.submit(alice(), "resume.pdf", b"data").unwrap_err();
        assert!(matches!(err, AppError::WriteFailure(_)));
        assert!(service.list().is_empty());
        assert_eq!(service.index().next_id(), 1);
    }

    #[test]
    fn list_reports_submission_order() {
        let (_dir, service) = service();
        service.submit(alice(), "resume.pdf", b"one").unwrap();
        service.submit(NewCv::new("Bob", "b@x.com", "555-0101"), "cv.docx", b"two").unwrap();

        let ids: Vec<u64> = service.list().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn delete_removes_record_and_file() {
        let (_dir, service) = service();
        let first = service.submit(alice(), "resume.pdf", b"one").unwrap();
        service.submit(alice(), "resume.pdf", b"two").unwrap();
        let path = service.resolve_path(&first.stored_file_name).unwrap();

        let deleted = service.delete(1).unwrap();

        assert_eq!(deleted, first);
        assert!(!path.exists());
        assert!(matches!(service.get(1), Err(AppError::NotFound(_))));
        let ids: Vec<u64> = service.list().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(service.files().stored_names().unwrap().len(), 1);
    }

    #[test]
    fn delete_of_unknown_id_changes_nothing() {
        let (_dir, service) = service();
        service.submit(alice(), "resume.pdf", b"one").unwrap();

        assert!(matches!(service.delete(99), Err(AppError::NotFound(_))));
        assert_eq!(service.list().len(), 1);
        assert_eq!(service.files().stored_names().unwrap().len(), 1);

        service.delete(1).unwrap();
        assert!(matches!(service.delete(1), Err(AppError::NotFound(_))));
    }

    #[test]
    fn failed_file_removal_keeps_record_indexed() {
        let (_dir, service) = service();
        let entry = service.submit(alice(), "resume.pdf", b"one").unwrap();
        let path = service.resolve_path(&entry.stored_file_name).unwrap();
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inner"), b"x").unwrap();
        let before = service.list();

        let err = service.delete(entry.id).unwrap_err();

        assert!(matches!(err, AppError::WriteFailure(_)));
        assert_eq!(service.get(entry.id).unwrap(), entry);
        assert_eq!(service.list(), before);
    }

    #[test]
    fn delete_tolerates_file_already_gone() {
        let (_dir, service) = service();
        let entry = service.submit(alice(), "resume.pdf", b"one").unwrap();
        fs::remove_file(service.resolve_path(&entry.stored_file_name).unwrap()).unwrap();

        service.delete(entry.id).unwrap();
        assert!(service.list().is_empty());
    }

    #[test]
    fn concurrent_submits_never_share_ids_or_files() {
        let (_dir, service) = service();
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    (0..10)
                        .map(|_| service.submit(alice(), "resume.pdf", b"same").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            let entries = handle.join().unwrap();
            let thread_ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
            assert!(thread_ids.windows(2).all(|w| w[0] < w[1]));
            ids.extend(thread_ids);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids, (1..=80).collect::<Vec<u64>>());

        let listed: Vec<u64> = service.list().iter().map(|e| e.id).collect();
        assert_eq!(listed, (1..=80).collect::<Vec<u64>>());
        assert_eq!(service.files().stored_names().unwrap().len(), 80);
    }
}
