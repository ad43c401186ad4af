use crate::models::{non_blank, FileRecord, FolderProfile, ParaBucket, RestructureResponse};
use crate::suggest::{SuggestionProvider, SuggestionRequest};
use std::collections::{BTreeMap, BTreeSet};

pub const NOT_ENOUGH_FOLDERS_MESSAGE: &str = "폴더가 충분하지 않아 통합 제안을 할 수 없습니다.";
pub const MAX_SAMPLE_FILE_NAMES: usize = 5;
pub const MAX_PROFILE_KEYWORDS: usize = 5;

pub fn build_folder_profiles(records: &[FileRecord]) -> Vec<FolderProfile> {
    let mut groups: BTreeMap<String, Vec<&FileRecord>> = BTreeMap::new();
    for record in records {
        if let Some(folder) = record.folder() {
            groups.entry(folder.trim().to_string()).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(folder_name, members)| build_folder_profile(&folder_name, &members))
        .collect()
}

pub fn build_folder_profile(folder_name: &str, records: &[&FileRecord]) -> FolderProfile {
    let mut file_count = 0;
    let mut subfolder_count = 0;
    let mut sample_file_names = Vec::new();
    let mut keywords = BTreeSet::new();

    for record in records {
        if record.is_directory {
            subfolder_count += 1;
            continue;
        }
        file_count += 1;
        if sample_file_names.len() < MAX_SAMPLE_FILE_NAMES {
            if let Some(name) = non_blank(record.display_name()) {
                sample_file_names.push(name.to_string());
            }
        }
        keywords.extend(
            record
                .keywords
                .iter()
                .map(|keyword| keyword.trim())
                .filter(|keyword| !keyword.is_empty())
                .map(ToString::to_string),
        );
    }

    let common_keywords = keywords
        .into_iter()
        .take(MAX_PROFILE_KEYWORDS)
        .collect::<Vec<_>>();
    let folder_purpose = infer_folder_purpose(folder_name, &common_keywords, file_count, subfolder_count);

    FolderProfile {
        folder_name: folder_name.to_string(),
        file_count,
        subfolder_count,
        sample_file_names,
        common_keywords,
        folder_purpose,
    }
}

fn infer_folder_purpose(folder_name: &str, keywords: &[String], file_count: usize, subfolder_count: usize) -> String {
    let mut purpose = format!(
        "폴더명: {}, 파일 {}개, 하위폴더 {}개",
        folder_name, file_count, subfolder_count
    );
    if !keywords.is_empty() {
        purpose.push_str(&format!(" | 주요키워드: {}", keywords.join(", ")));
    }
    purpose
}

pub async fn analyze_folder_structure(
    provider: &dyn SuggestionProvider,
    bucket: ParaBucket,
    records: &[FileRecord],
) -> RestructureResponse {
    let profiles = build_folder_profiles(records);
    tracing::info!(bucket = %bucket, folders = profiles.len(), "profiled folders for restructure analysis");

    if profiles.len() < 2 {
        return RestructureResponse::empty(NOT_ENOUGH_FOLDERS_MESSAGE);
    }

    let request = SuggestionRequest { bucket, profiles };
    match provider.suggest(&request).await {
        Ok(response) => {
            tracing::info!(
                bucket = %bucket,
                suggestions = response.merge_suggestions.len(),
                "received folder merge suggestions"
            );
            response
        }
        Err(error) => {
            tracing::error!(bucket = %bucket, error = %error, "folder merge suggestion failed");
            RestructureResponse::empty(format!("폴더 구조 분석 중 오류가 발생했습니다: {}", error))
        }
    }
}
