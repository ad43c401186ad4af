use super::structured_output::RESTRUCTURE_SCHEMA;
use super::SuggestionRequest;

pub const SYSTEM_PROMPT: &str = "You are a file organization expert specializing in P.A.R.A. methodology folder structure optimization.

TASK: Analyze folder structures and suggest mergers to reduce redundancy and improve organization.

RULES:
1. Look for folders that have similar purposes or overlapping content
2. Consider folder names, file counts, and keywords to identify merge candidates
3. Suggest meaningful new names for merged folders
4. Only suggest merges that make logical sense
5. Provide clear rationale for each suggestion

OUTPUT: JSON response with merge suggestions following the schema.";

pub fn build_user_prompt(request: &SuggestionRequest) -> String {
    let mut prompt = format!("PARA Bucket: {}\n\n현재 폴더 구조 분석:\n\n", request.bucket);

    for (index, profile) in request.profiles.iter().enumerate() {
        prompt.push_str(&format!("{}. 폴더명: {}\n", index + 1, profile.folder_name));
        prompt.push_str(&format!(
            "   - 파일 수: {}개, 하위폴더 수: {}개\n",
            profile.file_count, profile.subfolder_count
        ));
        if !profile.sample_file_names.is_empty() {
            prompt.push_str(&format!("   - 대표 파일들: {}\n", profile.sample_file_names.join(", ")));
        }
        if !profile.common_keywords.is_empty() {
            prompt.push_str(&format!("   - 주요 키워드: {}\n", profile.common_keywords.join(", ")));
        }
        prompt.push_str(&format!("   - 용도: {}\n\n", profile.folder_purpose));
    }

    prompt.push_str("위 폴더들 중에서 유사한 용도나 중복되는 내용을 가진 폴더들을 찾아 통합 제안을 해주세요. ");
    prompt.push_str("각 제안에 대해 명확한 근거를 제시해주세요.");
    prompt
}

pub fn render_prompt(request: &SuggestionRequest) -> String {
    let schema = serde_json::to_string_pretty(&*RESTRUCTURE_SCHEMA).unwrap_or_default();
    format!(
        "{}\n\n{}\n\nRespond with a single JSON object matching this schema:\n{}\n",
        SYSTEM_PROMPT,
        build_user_prompt(request),
        schema
    )
}
