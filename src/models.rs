use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParaBucket {
    Projects,
    Areas,
    Resources,
    Archive,
}

impl ParaBucket {
    pub const ALL: [ParaBucket; 4] = [Self::Projects, Self::Areas, Self::Resources, Self::Archive];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "Projects",
            Self::Areas => "Areas",
            Self::Resources => "Resources",
            Self::Archive => "Archive",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Areas => "areas",
            Self::Resources => "resources",
            Self::Archive => "archive",
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| AppError::Validation(format!("Unsupported PARA bucket '{}'", raw)))
    }

    pub fn full_path(self, folder: Option<&str>) -> String {
        match folder.map(str::trim).filter(|folder| !folder.is_empty()) {
            Some(folder) => format!("{}/{}", self.key(), folder.to_lowercase()),
            None => self.key().to_string(),
        }
    }
}

impl TryFrom<String> for ParaBucket {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ParaBucket> for String {
    fn from(value: ParaBucket) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ParaBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn parse(raw: &str) -> AppResult<Self> {
        parse_uuid("owner id", raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn parse_file_id(raw: &str) -> AppResult<String> {
    parse_uuid("file id", raw)
}

fn parse_uuid(kind: &str, raw: &str) -> AppResult<String> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.hyphenated().to_string())
        .map_err(|_| AppError::Validation(format!("Invalid {} format: {}", kind, raw)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub owner_id: String,
    pub base_directory: Option<String>,
    pub original_relative_path: String,
    pub is_directory: bool,
    pub is_development: bool,
    pub size_bytes: u64,
    pub modified_at: Option<String>,
    pub keywords: Vec<String>,
    pub korean_file_name: Option<String>,
    pub english_file_name: Option<String>,
    pub para_bucket: ParaBucket,
    pub para_folder: Option<String>,
    pub para_full_path: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.korean_file_name.as_deref()).or(self.english_file_name.as_deref())
    }

    pub fn folder(&self) -> Option<&str> {
        non_blank(self.para_folder.as_deref())
    }

    pub fn move_to_folder(&mut self, folder: Option<&str>) {
        self.para_folder = non_blank(folder).map(|folder| folder.trim().to_lowercase());
        self.para_full_path = self.para_bucket.full_path(self.para_folder.as_deref());
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNode {
    pub display_name: String,
    pub path_key: String,
    pub has_children: bool,
    pub korean_display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    pub id: String,
    pub korean_file_name: Option<String>,
    pub english_file_name: Option<String>,
    pub display_name: Option<String>,
    pub original_relative_path: String,
    pub size_bytes: u64,
    pub modified_at: Option<String>,
    pub keywords: Vec<String>,
    pub reason: Option<String>,
    pub is_development: bool,
}

impl From<&FileRecord> for FileItem {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            korean_file_name: record.korean_file_name.clone(),
            english_file_name: record.english_file_name.clone(),
            display_name: record.display_name().map(ToString::to_string),
            original_relative_path: record.original_relative_path.clone(),
            size_bytes: record.size_bytes,
            modified_at: record.modified_at.clone(),
            keywords: record.keywords.clone(),
            reason: record.reason.clone(),
            is_development: record.is_development,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderItem {
    pub folder_name: String,
    pub full_path: String,
    pub file_count: usize,
    pub subfolder_count: usize,
    pub last_modified: Option<String>,
    pub common_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderContents {
    pub folder_path: String,
    pub para_bucket: ParaBucket,
    pub para_folder: String,
    pub total_files: usize,
    pub total_subfolders: usize,
    pub files: Vec<FileItem>,
    pub subfolders: Vec<FolderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderProfile {
    pub folder_name: String,
    pub file_count: usize,
    pub subfolder_count: usize,
    pub sample_file_names: Vec<String>,
    pub common_keywords: Vec<String>,
    pub folder_purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSuggestion {
    #[serde(default)]
    pub target_folder: String,
    pub source_folders: Vec<String>,
    pub suggested_name: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestructureResponse {
    pub merge_suggestions: Vec<MergeSuggestion>,
    pub reason: String,
}

impl RestructureResponse {
    pub fn empty(reason: impl Into<String>) -> Self {
        Self {
            merge_suggestions: Vec::new(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFailure {
    pub folder: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub message: String,
    pub suggested_name: String,
    pub migrated_folders: Vec<String>,
    pub moved_records: usize,
    pub failed_folders: Vec<FolderFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrganizedFileEntry {
    pub original_relative_path: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub is_development: bool,
    #[serde(default)]
    pub size_bytes: u64,
    pub modified_at: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub korean_file_name: Option<String>,
    pub english_file_name: Option<String>,
    pub para_bucket: String,
    pub para_folder: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOrganizedFilesPayload {
    pub owner_id: String,
    pub base_directory: String,
    pub files: Vec<OrganizedFileEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaveOperation {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFile {
    pub id: String,
    pub original_relative_path: String,
    pub korean_file_name: Option<String>,
    pub english_file_name: Option<String>,
    pub para_bucket: ParaBucket,
    pub para_folder: Option<String>,
    pub operation: SaveOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub total_processed: usize,
    pub saved_count: usize,
    pub updated_count: usize,
    pub failed_count: usize,
    pub error_messages: Vec<String>,
    pub saved_files: Vec<SavedFile>,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub total_files: usize,
    pub projects_count: usize,
    pub areas_count: usize,
    pub resources_count: usize,
    pub archive_count: usize,
    pub development_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderContentsRequest {
    pub owner_id: String,
    pub para_bucket: String,
    #[serde(default)]
    pub para_folder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderBreadcrumbRequest {
    pub para_bucket: String,
    #[serde(default)]
    pub para_folder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderTreeRequest {
    pub owner_id: String,
    pub para_bucket: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderStructureRequest {
    pub owner_id: String,
    pub para_bucket: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyMergeRequest {
    pub owner_id: String,
    pub para_bucket: String,
    pub suggestion: MergeSuggestion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrganizedFilesRequest {
    pub owner_id: String,
    #[serde(default)]
    pub para_bucket: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizedFileRequest {
    pub owner_id: String,
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRequest {
    pub owner_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanResponse {
    pub success: bool,
}
