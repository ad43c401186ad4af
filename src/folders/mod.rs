pub mod contents;
pub mod merge;
pub mod normalize;
pub mod restructure;
pub mod tree;
pub mod virtual_path;

pub use normalize::{normalize_folder_path, normalize_segments};
pub use virtual_path::VirtualPath;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{FileRecord, ParaBucket};
    use chrono::Utc;
    use uuid::Uuid;

    pub const OWNER: &str = "0b5f4c52-3f7e-4b57-9d0e-4d4ab9a8c001";

    pub fn record(bucket: ParaBucket, folder: Option<&str>, path: &str, is_directory: bool) -> FileRecord {
        let now = Utc::now();
        let para_folder = folder.map(ToString::to_string);
        FileRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: OWNER.to_string(),
            base_directory: Some("/home/user/Documents".to_string()),
            original_relative_path: path.to_string(),
            is_directory,
            is_development: false,
            size_bytes: if is_directory { 0 } else { 1024 },
            modified_at: None,
            keywords: Vec::new(),
            korean_file_name: None,
            english_file_name: None,
            para_full_path: bucket.full_path(para_folder.as_deref()),
            para_bucket: bucket,
            para_folder,
            reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
