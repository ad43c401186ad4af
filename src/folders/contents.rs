use crate::models::{FileItem, FileRecord, FolderContents, FolderItem, ParaBucket};
use super::normalize::normalize_folder_path;
use std::collections::{BTreeMap, BTreeSet};

pub const MAX_COMMON_KEYWORDS: usize = 5;

pub fn folder_pattern(normalized_parent: &str, bucket: ParaBucket) -> String {
    if normalized_parent.is_empty() {
        return "(?i).*".to_string();
    }
    let bare = regex::escape(normalized_parent);
    let prefixed = regex::escape(&format!("{}/{}", bucket.key(), normalized_parent));
    format!("(?i)^(?:{}|{})(?:$|/.*)", bare, prefixed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    DirectFile,
    DirectSubfolder(String),
    Neither,
}

// The bucket root never holds direct files.
pub fn classify(item_folder: &str, parent: &str) -> Placement {
    if parent.is_empty() {
        if item_folder.is_empty() || item_folder.contains('/') {
            return Placement::Neither;
        }
        return Placement::DirectSubfolder(item_folder.to_string());
    }

    if item_folder == parent {
        return Placement::DirectFile;
    }

    match item_folder
        .strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        Some(rest) if !rest.is_empty() && !rest.contains('/') => {
            Placement::DirectSubfolder(rest.to_string())
        }
        _ => Placement::Neither,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubfolderStats {
    pub file_count: usize,
    pub subfolder_count: usize,
    pub last_modified: Option<String>,
    pub keywords: BTreeSet<String>,
}

impl SubfolderStats {
    pub fn add(&mut self, record: &FileRecord) {
        if record.is_directory {
            self.subfolder_count += 1;
            return;
        }
        self.file_count += 1;
        if let Some(modified_at) = record.modified_at.as_deref() {
            self.observe_modified(modified_at);
        }
        self.keywords.extend(
            record
                .keywords
                .iter()
                .map(|keyword| keyword.trim())
                .filter(|keyword| !keyword.is_empty())
                .map(ToString::to_string),
        );
    }

    #[cfg(test)]
    fn merge(&mut self, other: SubfolderStats) {
        self.file_count += other.file_count;
        self.subfolder_count += other.subfolder_count;
        if let Some(modified_at) = other.last_modified.as_deref() {
            self.observe_modified(modified_at);
        }
        self.keywords.extend(other.keywords);
    }

    fn observe_modified(&mut self, modified_at: &str) {
        let newer = self
            .last_modified
            .as_deref()
            .map(|current| modified_at > current)
            .unwrap_or(true);
        if newer {
            self.last_modified = Some(modified_at.to_string());
        }
    }

    pub fn common_keywords(&self) -> Vec<String> {
        self.keywords.iter().take(MAX_COMMON_KEYWORDS).cloned().collect()
    }
}

pub fn build_folder_contents(
    bucket: ParaBucket,
    normalized_parent: &str,
    records: &[FileRecord],
) -> FolderContents {
    let mut files = Vec::new();
    let mut stats: BTreeMap<String, SubfolderStats> = BTreeMap::new();

    for record in records {
        let item_folder = normalize_folder_path(record.folder().unwrap_or_default(), Some(bucket));
        match classify(&item_folder, normalized_parent) {
            Placement::DirectFile => files.push(FileItem::from(record)),
            Placement::DirectSubfolder(name) => stats.entry(name).or_default().add(record),
            Placement::Neither => {}
        }
    }

    let mut subfolders = stats
        .into_iter()
        .map(|(name, stats)| FolderItem {
            full_path: if normalized_parent.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", normalized_parent, name)
            },
            file_count: stats.file_count,
            subfolder_count: stats.subfolder_count,
            common_keywords: stats.common_keywords(),
            last_modified: stats.last_modified,
            folder_name: name,
        })
        .collect::<Vec<_>>();
    subfolders.sort_by(|left, right| {
        left.folder_name
            .to_lowercase()
            .cmp(&right.folder_name.to_lowercase())
            .then_with(|| left.folder_name.cmp(&right.folder_name))
    });

    FolderContents {
        folder_path: if normalized_parent.is_empty() {
            bucket.as_str().to_string()
        } else {
            format!("{}/{}", bucket.as_str(), normalized_parent)
        },
        para_bucket: bucket,
        para_folder: normalized_parent.to_string(),
        total_files: files.len(),
        total_subfolders: subfolders.len(),
        files,
        subfolders,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_folder_contents, classify, folder_pattern, Placement, SubfolderStats};
    use crate::folders::test_support::record;
    use crate::models::ParaBucket;
    use regex::Regex;

    #[test]
    fn pattern_accepts_folder_and_descendants_only() {
        let pattern = Regex::new(&folder_pattern("docs", ParaBucket::Resources)).expect("regex");
        assert!(pattern.is_match("docs"));
        assert!(pattern.is_match("docs/specs"));
        assert!(pattern.is_match("Resources/Docs/specs"));
        assert!(!pattern.is_match("docsets"));
        assert!(!pattern.is_match("old/docs"));

        let root = Regex::new(&folder_pattern("", ParaBucket::Resources)).expect("regex");
        assert!(root.is_match(""));
        assert!(root.is_match("anything/at/all"));
    }

    #[test]
    fn pattern_escapes_regex_metacharacters() {
        let pattern = Regex::new(&folder_pattern("c++ (old)", ParaBucket::Areas)).expect("regex");
        assert!(pattern.is_match("c++ (old)/notes"));
        assert!(!pattern.is_match("c (old)"));
    }

    #[test]
    fn root_has_no_direct_files() {
        assert_eq!(classify("", ""), Placement::Neither);
        assert_eq!(classify("docs", ""), Placement::DirectSubfolder("docs".to_string()));
        assert_eq!(classify("docs/specs", ""), Placement::Neither);
    }

    #[test]
    fn nested_folder_becomes_direct_subfolder_of_its_parent() {
        assert_eq!(classify("docs/specs", "docs"), Placement::DirectSubfolder("specs".to_string()));
        assert_eq!(classify("docs", "docs"), Placement::DirectFile);
        assert_eq!(classify("docs/specs/v1", "docs"), Placement::Neither);
        assert_eq!(classify("docsets", "docs"), Placement::Neither);
    }

    #[test]
    fn classification_partitions_every_record() {
        let records = vec![
            record(ParaBucket::Resources, Some("docs"), "a.md", false),
            record(ParaBucket::Resources, Some("docs/specs"), "b.md", false),
            record(ParaBucket::Resources, Some("docs/specs"), "specs", true),
            record(ParaBucket::Resources, Some("docs/specs/v1"), "c.md", false),
            record(ParaBucket::Resources, None, "d.md", false),
        ];
        for parent in ["", "docs", "docs/specs"] {
            let contents = build_folder_contents(ParaBucket::Resources, parent, &records);
            let in_subfolders: usize = contents
                .subfolders
                .iter()
                .map(|folder| folder.file_count + folder.subfolder_count)
                .sum();
            let neither = records
                .iter()
                .filter(|record| {
                    let folder = crate::folders::normalize::normalize_folder_path(
                        record.folder().unwrap_or_default(),
                        Some(ParaBucket::Resources),
                    );
                    classify(&folder, parent) == Placement::Neither
                })
                .count();
            assert_eq!(contents.files.len() + in_subfolders + neither, records.len(), "parent {}", parent);
        }
    }

    #[test]
    fn browsing_root_then_folder() {
        let records = vec![record(ParaBucket::Resources, Some("docs/specs"), "api.md", false)];

        let root = build_folder_contents(ParaBucket::Resources, "", &records);
        assert_eq!(root.total_files, 0);
        assert_eq!(root.total_subfolders, 0);
        assert_eq!(root.folder_path, "Resources");

        let docs = build_folder_contents(ParaBucket::Resources, "docs", &records);
        assert_eq!(docs.total_files, 0);
        assert_eq!(docs.subfolders.len(), 1);
        assert_eq!(docs.subfolders[0].folder_name, "specs");
        assert_eq!(docs.subfolders[0].full_path, "docs/specs");
        assert_eq!(docs.subfolders[0].file_count, 1);
        assert_eq!(docs.folder_path, "Resources/docs");
    }

    #[test]
    fn rollups_track_latest_modified_and_truncate_keywords() {
        let mut first = record(ParaBucket::Projects, Some("nebula/design"), "a.md", false);
        first.modified_at = Some("2024-03-01T10:00:00Z".to_string());
        first.keywords = vec!["ux".into(), "figma".into(), "color".into()];
        let mut second = record(ParaBucket::Projects, Some("nebula/design"), "b.md", false);
        second.modified_at = Some("2024-05-01T10:00:00Z".to_string());
        second.keywords = vec!["type".into(), "grid".into(), "ux".into(), "layout".into()];
        let mut directory = record(ParaBucket::Projects, Some("nebula/design"), "icons", true);
        directory.modified_at = Some("2025-01-01T00:00:00Z".to_string());

        let contents = build_folder_contents(ParaBucket::Projects, "nebula", &[first, second, directory]);
        let design = &contents.subfolders[0];
        assert_eq!(design.file_count, 2);
        assert_eq!(design.subfolder_count, 1);
        assert_eq!(design.last_modified.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(design.common_keywords, vec!["color", "figma", "grid", "layout", "type"]);
    }

    #[test]
    fn subfolder_stats_merge_matches_single_pass() {
        let mut records = Vec::new();
        for (index, keywords) in [vec!["a", "b"], vec!["c"], vec!["b", "d", "e", "f"], vec![]].iter().enumerate() {
            let mut entry = record(ParaBucket::Areas, Some("health"), &format!("f{}.md", index), index == 3);
            entry.keywords = keywords.iter().map(|keyword| keyword.to_string()).collect();
            entry.modified_at = Some(format!("2024-0{}-01", index + 1));
            records.push(entry);
        }

        let mut whole = SubfolderStats::default();
        records.iter().for_each(|record| whole.add(record));

        let (left, right) = records.split_at(2);
        let mut merged = SubfolderStats::default();
        left.iter().for_each(|record| merged.add(record));
        let mut other = SubfolderStats::default();
        right.iter().for_each(|record| other.add(record));
        merged.merge(other);

        assert_eq!(merged, whole);
        assert_eq!(merged.common_keywords(), whole.common_keywords());
    }

    #[test]
    fn subfolders_sorted_case_insensitively() {
        let records = vec![
            record(ParaBucket::Areas, Some("Zoo"), "a.md", false),
            record(ParaBucket::Areas, Some("apple"), "b.md", false),
            record(ParaBucket::Areas, Some("Mango"), "c.md", false),
        ];
        let names = build_folder_contents(ParaBucket::Areas, "", &records)
            .subfolders
            .into_iter()
            .map(|folder| folder.folder_name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["apple", "mango", "zoo"]);
    }
}
