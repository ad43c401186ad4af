use super::normalize::normalize_folder_path;
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{FileRecord, FolderFailure, MergeOutcome, MergeSuggestion, OwnerId, ParaBucket};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub suggested_name: String,
    pub source_folders: Vec<String>,
}

pub fn plan_merge(bucket: ParaBucket, suggestion: &MergeSuggestion) -> AppResult<MergePlan> {
    let suggested_name = normalize_folder_path(&suggestion.suggested_name, Some(bucket));
    if suggested_name.is_empty() {
        return Err(AppError::Validation("suggestedName cannot be empty".to_string()));
    }

    let mut seen = BTreeSet::new();
    let source_folders = suggestion
        .source_folders
        .iter()
        .map(|source| normalize_folder_path(source, Some(bucket)))
        .filter(|source| !source.is_empty() && seen.insert(source.clone()))
        .collect::<Vec<_>>();
    if source_folders.is_empty() {
        return Err(AppError::Validation("sourceFolders cannot be empty".to_string()));
    }

    Ok(MergePlan {
        suggested_name,
        source_folders,
    })
}

pub fn rewrite_into_folder(records: Vec<FileRecord>, folder: &str) -> Vec<FileRecord> {
    records
        .into_iter()
        .map(|mut record| {
            record.move_to_folder(Some(folder));
            record
        })
        .collect()
}

// One transaction per source folder; a failed folder is reported and the rest continue.
pub fn apply_merge(
    db: &Database,
    owner: &OwnerId,
    bucket: ParaBucket,
    suggestion: &MergeSuggestion,
) -> AppResult<MergeOutcome> {
    let plan = plan_merge(bucket, suggestion)?;
    let mut migrated_folders = Vec::new();
    let mut failed_folders = Vec::new();
    let mut moved_records = 0;

    for source in &plan.source_folders {
        let result = db
            .find_by_owner_and_bucket_and_folder(owner, bucket, source)
            .and_then(|records| db.rewrite_records(&rewrite_into_folder(records, &plan.suggested_name)));
        match result {
            Ok(count) => {
                tracing::info!(
                    owner = %owner,
                    bucket = %bucket,
                    from = %source,
                    to = %plan.suggested_name,
                    count,
                    "moved folder records"
                );
                moved_records += count;
                migrated_folders.push(source.clone());
            }
            Err(error) => {
                tracing::error!(
                    owner = %owner,
                    bucket = %bucket,
                    folder = %source,
                    error = %error,
                    "folder merge failed; continuing with remaining folders"
                );
                failed_folders.push(FolderFailure {
                    folder: source.clone(),
                    error: error.to_string(),
                });
            }
        }
    }

    let message = if failed_folders.is_empty() {
        format!(
            "폴더 재구성이 완료되었습니다. {}개 폴더가 '{}'로 통합되었습니다.",
            migrated_folders.len(),
            plan.suggested_name
        )
    } else {
        format!(
            "폴더 재구성이 일부만 완료되었습니다. {}개 폴더가 '{}'로 통합되었고 {}개 폴더는 실패했습니다.",
            migrated_folders.len(),
            plan.suggested_name,
            failed_folders.len()
        )
    };

    Ok(MergeOutcome {
        message,
        suggested_name: plan.suggested_name,
        migrated_folders,
        moved_records,
        failed_folders,
    })
}
