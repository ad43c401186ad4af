use super::normalize::{normalize_segments, raw_segments, title_case};
use crate::models::{FileRecord, ParaBucket};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualPath {
    keys: Vec<String>,
    display: Vec<String>,
    explicit: usize,
}

impl VirtualPath {
    pub fn from_record(record: &FileRecord) -> Self {
        Self::build(
            record.para_bucket,
            record.folder(),
            &record.original_relative_path,
            record.is_directory,
        )
    }

    pub fn build(
        bucket: ParaBucket,
        folder: Option<&str>,
        original_relative_path: &str,
        is_directory: bool,
    ) -> Self {
        let mut path_display = raw_segments(original_relative_path);
        let leading = path_display
            .iter()
            .take_while(|segment| segment.to_lowercase() == bucket.key())
            .count();
        path_display.drain(..leading);
        if !is_directory {
            path_display.pop();
        }
        let path_keys = path_display
            .iter()
            .map(|segment| segment.to_lowercase())
            .collect::<Vec<_>>();

        let folder_keys = folder
            .map(|folder| normalize_segments(folder, Some(bucket)))
            .unwrap_or_default();

        let mut path = Self::default();
        let consumed = if !folder_keys.is_empty() {
            for key in &folder_keys {
                path.push(key.clone(), title_case(key));
            }
            path.explicit = folder_keys.len();
            if path_keys.starts_with(&folder_keys) {
                folder_keys.len()
            } else {
                0
            }
        } else if let Some(first) = path_keys.first() {
            path.push(first.clone(), path_display[0].clone());
            1
        } else {
            return path;
        };

        let anchor = path.keys[0].clone();
        for (key, shown) in path_keys.iter().zip(path_display.iter()).skip(consumed) {
            if *key == anchor {
                continue;
            }
            path.push(key.clone(), shown.clone());
        }
        path
    }

    fn push(&mut self, key: String, display: String) {
        self.keys.push(key);
        self.display.push(display);
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn display(&self) -> &[String] {
        &self.display
    }

    pub fn is_explicit(&self, index: usize) -> bool {
        index < self.explicit
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn starts_with(&self, prefix: &[String]) -> bool {
        self.keys.starts_with(prefix)
    }
}
