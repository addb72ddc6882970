use std::collections::BTreeMap;
use crate::errors::AppError;
use crate::models::cv::CvEntry;

/// In-memory index of live submissions.
///
/// Ids are minted in increasing order, so the map's key order is also the
/// insertion order that `list` reports.
#[derive(Debug, Default)]
pub struct CvIndex {
    last_id: u64,
    entries: BTreeMap<u64, CvEntry>,
}

fn not_found() -> AppError {
    AppError::NotFound("CV not found".to_string())
}

impl CvIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an id greater than any returned before. Deletions never free ids.
    pub fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    pub fn insert(&mut self, entry: CvEntry) {
        debug_assert!(!self.entries.contains_key(&entry.id), "duplicate CV id {}", entry.id);
        self.entries.insert(entry.id, entry);
    }

    pub fn list(&self) -> Vec<CvEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn get_by_id(&self, id: u64) -> Result<&CvEntry, AppError> {
        self.entries.get(&id).ok_or_else(not_found)
    }

    pub fn remove_by_id(&mut self, id: u64) -> Result<CvEntry, AppError> {
        self.entries.remove(&id).ok_or_else(not_found)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(index: &mut CvIndex, name: &str) -> CvEntry {
        CvEntry {
            id: index.next_id(),
            name: name.to_string(),
            email: format!("{}@x.com", name),
            phone: "555-0100".to_string(),
            stored_file_name: format!("{}.pdf", name),
            original_file_name: "resume.pdf".to_string(),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn ids_start_at_one_and_are_not_reused() {
        let mut index = CvIndex::new();
        let first = entry(&mut index, "alice");
        let second = entry(&mut index, "bob");
        assert_eq!((first.id, second.id), (1, 2));

        index.insert(first);
        index.insert(second);
        index.remove_by_id(2).unwrap();

        assert_eq!(index.next_id(), 3);
    }

    #[test]
    fn list_keeps_insertion_order() {
        let mut index = CvIndex::new();
        for name in ["alice", "bob", "carol"] {
            let e = entry(&mut index, name);
            index.insert(e);
        }

        let names: Vec<String> = index.list().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn get_and_remove_report_missing_ids() {
        let mut index = CvIndex::new();
        let e = entry(&mut index, "alice");
        index.insert(e.clone());

        assert_eq!(index.get_by_id(1).unwrap(), &e);
        assert!(matches!(index.get_by_id(99), Err(AppError::NotFound(_))));
        assert_eq!(index.remove_by_id(1).unwrap(), e);
        assert!(matches!(index.remove_by_id(1), Err(AppError::NotFound(_))));
        assert!(index.is_empty());
    }

    #[test]
    fn snapshot_survives_later_removal() {
        let mut index = CvIndex::new();
        let e = entry(&mut index, "alice");
        index.insert(e);

        let snapshot = index.list();
        index.remove_by_id(1).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(index.len(), 0);
    }
}
