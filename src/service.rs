use crate::config::{database_path, AppSettings};
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::folders::contents::{build_folder_contents, folder_pattern};
use crate::folders::merge::apply_merge;
use crate::folders::normalize::raw_segments;
use crate::folders::restructure::analyze_folder_structure;
use crate::folders::tree::build_folder_tree;
use crate::folders::{normalize_folder_path, normalize_segments};
use crate::models::{
    parse_file_id, ApplyMergeRequest, FileRecord, FileStats, FolderBreadcrumbRequest, FolderContents,
    FolderContentsRequest, FolderNode, FolderStructureRequest, FolderTreeRequest, ListOrganizedFilesRequest,
    MergeOutcome, OrganizedFileEntry, OrganizedFileRequest, OwnerId, OwnerRequest, ParaBucket, RestructureResponse,
    SaveOperation, SaveOrganizedFilesPayload, SaveOutcome, SavedFile,
};
use crate::suggest::SuggestionProvider;
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct FolderService {
    db: Arc<Database>,
    suggestions: Arc<dyn SuggestionProvider>,
}

impl FolderService {
    pub fn new(db: Arc<Database>, suggestions: Arc<dyn SuggestionProvider>) -> Self {
        Self { db, suggestions }
    }

    pub fn open(data_dir: &Path, settings: &AppSettings) -> AppResult<Self> {
        let db = Arc::new(Database::new(&database_path(data_dir))?);
        Ok(Self::new(db, settings.suggestion.build_provider()))
    }

    pub fn database_path(&self) -> &Path {
        self.db.path()
    }

    pub fn get_folder_contents(&self, request: FolderContentsRequest) -> AppResult<FolderContents> {
        let owner = OwnerId::parse(&request.owner_id)?;
        let bucket = ParaBucket::parse(&request.para_bucket)?;
        let folder = normalize_folder_path(request.para_folder.as_deref().unwrap_or_default(), Some(bucket));

        let records = self.db.find_by_owner_and_bucket_and_folder_pattern(
            &owner,
            bucket,
            &folder_pattern(&folder, bucket),
        )?;
        let contents = build_folder_contents(bucket, &folder, &records);
        tracing::info!(
            owner = %owner,
            bucket = %bucket,
            folder = %folder,
            candidates = records.len(),
            files = contents.total_files,
            subfolders = contents.total_subfolders,
            "browsed folder contents"
        );
        Ok(contents)
    }

    pub fn get_folder_breadcrumb(&self, request: FolderBreadcrumbRequest) -> AppResult<Vec<String>> {
        let bucket = ParaBucket::parse(&request.para_bucket)?;
        let mut crumbs = vec![bucket.as_str().to_string()];
        crumbs.extend(raw_segments(request.para_folder.as_deref().unwrap_or_default()));
        Ok(crumbs)
    }

    pub fn get_folder_tree(&self, request: FolderTreeRequest) -> AppResult<Vec<FolderNode>> {
        let owner = OwnerId::parse(&request.owner_id)?;
        let bucket = ParaBucket::parse(&request.para_bucket)?;
        let prefix = normalize_segments(request.path.as_deref().unwrap_or_default(), Some(bucket));

        let records = self.db.find_by_owner_and_bucket(&owner, bucket)?;
        let nodes = build_folder_tree(&records, &prefix);
        tracing::info!(
            owner = %owner,
            bucket = %bucket,
            depth = prefix.len(),
            children = nodes.len(),
            "built folder tree level"
        );
        Ok(nodes)
    }

    pub async fn analyze_folder_structure(&self, request: FolderStructureRequest) -> AppResult<RestructureResponse> {
        let owner = OwnerId::parse(&request.owner_id)?;
        let bucket = ParaBucket::parse(&request.para_bucket)?;
        let records = self.db.find_by_owner_and_bucket(&owner, bucket)?;
        tracing::info!(owner = %owner, bucket = %bucket, records = records.len(), "analyzing folder structure");
        Ok(analyze_folder_structure(self.suggestions.as_ref(), bucket, &records).await)
    }

    pub fn apply_merge(&self, request: ApplyMergeRequest) -> AppResult<MergeOutcome> {
        let owner = OwnerId::parse(&request.owner_id)?;
        let bucket = ParaBucket::parse(&request.para_bucket)?;
        apply_merge(&self.db, &owner, bucket, &request.suggestion)
    }

    pub fn save_organized_files(&self, payload: SaveOrganizedFilesPayload) -> AppResult<SaveOutcome> {
        let owner = OwnerId::parse(&payload.owner_id)?;
        let base_directory = payload.base_directory.trim();
        if base_directory.is_empty() {
            return Err(AppError::Validation("baseDirectory cannot be empty".to_string()));
        }
        if payload.files.is_empty() {
            return Err(AppError::Validation("files cannot be empty".to_string()));
        }

        let mut saved_files = Vec::new();
        let mut error_messages = Vec::new();
        let mut saved_count = 0;
        let mut updated_count = 0;

        for entry in &payload.files {
            match self.save_entry(&owner, base_directory, entry) {
                Ok(saved) => {
                    match saved.operation {
                        SaveOperation::Created => saved_count += 1,
                        SaveOperation::Updated => updated_count += 1,
                    }
                    saved_files.push(saved);
                }
                Err(error) => {
                    tracing::warn!(
                        owner = %owner,
                        path = %entry.original_relative_path,
                        error = %error,
                        "failed to save organized file"
                    );
                    error_messages.push(format!("{}: {}", entry.original_relative_path, error));
                }
            }
        }

        tracing::info!(
            owner = %owner,
            total = payload.files.len(),
            created = saved_count,
            updated = updated_count,
            failed = error_messages.len(),
            "saved organized files"
        );

        Ok(SaveOutcome {
            total_processed: payload.files.len(),
            saved_count,
            updated_count,
            failed_count: error_messages.len(),
            error_messages,
            saved_files,
            processed_at: Utc::now(),
        })
    }

    fn save_entry(&self, owner: &OwnerId, base_directory: &str, entry: &OrganizedFileEntry) -> AppResult<SavedFile> {
        let path = entry.original_relative_path.trim();
        if path.is_empty() {
            return Err(AppError::Validation("originalRelativePath cannot be empty".to_string()));
        }
        let bucket = ParaBucket::parse(&entry.para_bucket)?;
        let para_folder = entry
            .para_folder
            .as_deref()
            .map(|folder| normalize_folder_path(folder, Some(bucket)))
            .filter(|folder| !folder.is_empty());

        let now = Utc::now();
        let existing = self.db.find_by_owner_and_path(owner, path)?;
        let (id, created_at, operation) = match existing {
            Some(existing) => (existing.id, existing.created_at, SaveOperation::Updated),
            None => (Uuid::new_v4().to_string(), now, SaveOperation::Created),
        };

        let record = FileRecord {
            id,
            owner_id: owner.as_str().to_string(),
            base_directory: Some(base_directory.to_string()),
            original_relative_path: path.to_string(),
            is_directory: entry.is_directory,
            is_development: entry.is_development,
            size_bytes: entry.size_bytes,
            modified_at: entry.modified_at.clone(),
            keywords: dedupe_keywords(&entry.keywords),
            korean_file_name: entry.korean_file_name.clone(),
            english_file_name: entry.english_file_name.clone(),
            para_full_path: bucket.full_path(para_folder.as_deref()),
            para_bucket: bucket,
            para_folder,
            reason: entry.reason.clone(),
            created_at,
            updated_at: now,
        };
        let saved = self.db.upsert(&record)?;

        Ok(SavedFile {
            id: saved.id,
            original_relative_path: saved.original_relative_path,
            korean_file_name: saved.korean_file_name,
            english_file_name: saved.english_file_name,
            para_bucket: saved.para_bucket,
            para_folder: saved.para_folder,
            operation,
        })
    }

    pub fn list_organized_files(&self, request: ListOrganizedFilesRequest) -> AppResult<Vec<FileRecord>> {
        let owner = OwnerId::parse(&request.owner_id)?;
        match request.para_bucket.as_deref().map(str::trim).filter(|bucket| !bucket.is_empty()) {
            Some(bucket) => self.db.find_by_owner_and_bucket(&owner, ParaBucket::parse(bucket)?),
            None => self.db.find_by_owner(&owner),
        }
    }

    pub fn get_organized_file(&self, request: OrganizedFileRequest) -> AppResult<FileRecord> {
        let owner = OwnerId::parse(&request.owner_id)?;
        let file_id = parse_file_id(&request.file_id)?;
        self.db
            .find_by_id_and_owner(&file_id, &owner)?
            .ok_or_else(|| AppError::NotFound(format!("Organized file not found: {}", file_id)))
    }

    pub fn delete_organized_file(&self, request: OrganizedFileRequest) -> AppResult<bool> {
        let owner = OwnerId::parse(&request.owner_id)?;
        let file_id = parse_file_id(&request.file_id)?;
        if !self.db.exists_by_id_and_owner(&file_id, &owner)? {
            tracing::warn!(owner = %owner, file_id = %file_id, "delete requested for unknown organized file");
            return Ok(false);
        }
        let deleted = self.db.delete_by_id(&file_id)?;
        tracing::info!(owner = %owner, file_id = %file_id, deleted, "deleted organized file");
        Ok(deleted)
    }

    pub fn get_file_stats(&self, request: OwnerRequest) -> AppResult<FileStats> {
        let owner = OwnerId::parse(&request.owner_id)?;
        let records = self.db.find_by_owner(&owner)?;
        let mut stats = FileStats {
            total_files: records.len(),
            ..FileStats::default()
        };
        for record in &records {
            match record.para_bucket {
                ParaBucket::Projects => stats.projects_count += 1,
                ParaBucket::Areas => stats.areas_count += 1,
                ParaBucket::Resources => stats.resources_count += 1,
                ParaBucket::Archive => stats.archive_count += 1,
            }
            if record.is_development {
                stats.development_count += 1;
            }
        }
        Ok(stats)
    }
}

fn dedupe_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|keyword| keyword.trim())
        .filter(|keyword| !keyword.is_empty() && seen.insert(keyword.to_string()))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{dedupe_keywords, FolderService};
    use crate::db::Database;
    use crate::errors::AppError;
    use crate::folders::test_support::OWNER;
    use crate::models::{
        FolderBreadcrumbRequest, FolderContentsRequest, OrganizedFileEntry, OrganizedFileRequest, OwnerRequest,
        SaveOperation, SaveOrganizedFilesPayload,
    };
    use crate::suggest::UnconfiguredSuggestionProvider;
    use std::sync::Arc;

    fn service() -> (tempfile::TempDir, FolderService) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("test.db")).expect("db");
        (dir, FolderService::new(Arc::new(db), Arc::new(UnconfiguredSuggestionProvider)))
    }

    fn entry(path: &str, bucket: &str, folder: Option<&str>) -> OrganizedFileEntry {
        OrganizedFileEntry {
            original_relative_path: path.to_string(),
            para_bucket: bucket.to_string(),
            para_folder: folder.map(ToString::to_string),
            ..OrganizedFileEntry::default()
        }
    }

    fn payload(files: Vec<OrganizedFileEntry>) -> SaveOrganizedFilesPayload {
        SaveOrganizedFilesPayload {
            owner_id: OWNER.to_string(),
            base_directory: "/home/user/Documents".to_string(),
            files,
        }
    }

    #[test]
    fn save_counts_created_updated_and_failed_entries() {
        let (_dir, service) = service();
        let first = service
            .save_organized_files(payload(vec![entry("a.md", "projects", Some("Projects/Nebula"))]))
            .expect("first save");
        assert_eq!(first.saved_count, 1);
        assert_eq!(first.saved_files[0].para_folder.as_deref(), Some("nebula"));
        let id = first.saved_files[0].id.clone();

        let second = service
            .save_organized_files(payload(vec![
                entry("a.md", "Areas", None),
                entry("b.md", "Projects", Some("nebula")),
                entry("c.md", "Inbox", None),
                entry("  ", "Projects", None),
            ]))
            .expect("second save");
        assert_eq!(second.total_processed, 4);
        assert_eq!(second.saved_count, 1);
        assert_eq!(second.updated_count, 1);
        assert_eq!(second.failed_count, 2);
        assert_eq!(second.error_messages.len(), 2);
        assert_eq!(second.saved_files[0].id, id);
        assert_eq!(second.saved_files[0].operation, SaveOperation::Updated);

        let stats = service
            .get_file_stats(OwnerRequest {
                owner_id: OWNER.to_string(),
            })
            .expect("stats");
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.areas_count, 1);
        assert_eq!(stats.projects_count, 1);
    }

    #[test]
    fn request_level_validation_rejects_whole_batch() {
        let (_dir, service) = service();
        let mut bad_owner = payload(vec![entry("a.md", "Projects", None)]);
        bad_owner.owner_id = "not-a-uuid".to_string();
        assert!(matches!(service.save_organized_files(bad_owner), Err(AppError::Validation(_))));
        assert!(matches!(service.save_organized_files(payload(Vec::new())), Err(AppError::Validation(_))));
    }

    #[test]
    fn invalid_bucket_is_rejected_before_storage() {
        let (_dir, service) = service();
        let result = service.get_folder_contents(FolderContentsRequest {
            owner_id: OWNER.to_string(),
            para_bucket: "Someday".to_string(),
            para_folder: None,
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn breadcrumb_uses_canonical_bucket_and_raw_segments() {
        let (_dir, service) = service();
        let crumbs = service
            .get_folder_breadcrumb(FolderBreadcrumbRequest {
                para_bucket: "resources".to_string(),
                para_folder: Some(r" Docs\Specs / v2 ".to_string()),
            })
            .expect("breadcrumb");
        assert_eq!(crumbs, vec!["Resources", "Docs", "Specs", "v2"]);
    }

    #[test]
    fn delete_is_scoped_to_owner() {
        let (_dir, service) = service();
        let saved = service
            .save_organized_files(payload(vec![entry("a.md", "Archive", None)]))
            .expect("save");
        let id = saved.saved_files[0].id.clone();

        let stranger = OrganizedFileRequest {
            owner_id: "7d0b5a8e-1c6f-4d8e-9a51-3f2c8b7e6d10".to_string(),
            file_id: id.clone(),
        };
        assert!(!service.delete_organized_file(stranger).expect("stranger delete"));

        let request = OrganizedFileRequest {
            owner_id: OWNER.to_string(),
            file_id: id,
        };
        assert!(service.get_organized_file(request.clone()).is_ok());
        assert!(service.delete_organized_file(request.clone()).expect("delete"));
        assert!(matches!(service.get_organized_file(request), Err(AppError::NotFound(_))));
    }

    #[test]
    fn keywords_are_trimmed_and_deduplicated_in_order() {
        let keywords = vec![" plan ".to_string(), "".to_string(), "b".to_string(), "plan".to_string()];
        assert_eq!(dedupe_keywords(&keywords), vec!["plan".to_string(), "b".to_string()]);
    }
}
