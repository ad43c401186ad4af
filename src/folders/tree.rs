use super::normalize::title_case;
use super::virtual_path::VirtualPath;
use crate::models::{non_blank, FileRecord, FolderNode};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct NodeAccumulator {
    display_name: Option<(bool, String)>,
    has_children: bool,
    korean_display_name: Option<String>,
}

pub fn build_folder_tree(records: &[FileRecord], prefix: &[String]) -> Vec<FolderNode> {
    let depth = prefix.len();
    let mut children: BTreeMap<String, NodeAccumulator> = BTreeMap::new();

    for record in records {
        let path = VirtualPath::from_record(record);
        if path.len() <= depth || !path.starts_with(prefix) {
            continue;
        }

        let node = children.entry(path.keys()[depth].clone()).or_default();
        // An explicit-folder label beats a path-derived one; otherwise the
        // first one seen in fetch order stays.
        let candidate = &path.display()[depth];
        if !candidate.trim().is_empty() {
            let explicit = path.is_explicit(depth);
            let replace = match &node.display_name {
                None => true,
                Some((current_explicit, _)) => explicit && !current_explicit,
            };
            if replace {
                node.display_name = Some((explicit, candidate.clone()));
            }
        }

        if path.len() > depth + 1 {
            node.has_children = true;
        } else if record.is_directory && node.korean_display_name.is_none() {
            node.korean_display_name =
                non_blank(record.korean_file_name.as_deref()).map(ToString::to_string);
        }
    }

    let mut nodes = children
        .into_iter()
        .map(|(key, node)| {
            let display_name = node
                .display_name
                .map(|(_, name)| name)
                .unwrap_or_else(|| title_case(&key));
            let mut path_key = prefix.to_vec();
            path_key.push(key);
            FolderNode {
                display_name,
                path_key: path_key.join("/"),
                has_children: node.has_children,
                korean_display_name: node.korean_display_name,
            }
        })
        .collect::<Vec<_>>();

    nodes.sort_by(|left, right| {
        left.display_name
            .to_lowercase()
            .cmp(&right.display_name.to_lowercase())
            .then_with(|| left.path_key.cmp(&right.path_key))
    });
    nodes
}

#[cfg(test)]
mod tests {
    use super::build_folder_tree;
    use crate::folders::test_support::record;
    use crate::folders::virtual_path::VirtualPath;
    use crate::models::ParaBucket;

    #[test]
    fn root_lists_one_child_for_both_path_sources() {
        let records = vec![
            record(ParaBucket::Projects, Some("nebula"), "readme2.md", false),
            record(ParaBucket::Projects, None, "projects/nebula/readme.md", false),
        ];
        let nodes = build_folder_tree(&records, &[]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].display_name, "Nebula");
        assert_eq!(nodes[0].path_key, "nebula");
        assert!(!nodes[0].has_children);
    }

    #[test]
    fn explicit_folder_label_wins_regardless_of_order() {
        let records = vec![
            record(ParaBucket::Projects, None, "projects/nebula/readme.md", false),
            record(ParaBucket::Projects, Some("nebula"), "readme2.md", false),
            record(ParaBucket::Projects, None, "projects/Orion/a.md", false),
            record(ParaBucket::Projects, None, "projects/orion/b.md", false),
        ];
        let nodes = build_folder_tree(&records, &[]);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].display_name, "Nebula");
        assert_eq!(nodes[1].display_name, "Orion");
    }

    #[test]
    fn marks_children_and_takes_korean_name_from_directory_record() {
        let mut directory = record(ParaBucket::Projects, None, "projects/nebula", true);
        directory.korean_file_name = Some("네뷸라".to_string());
        let mut nested_dir = record(ParaBucket::Projects, None, "projects/nebula/assets", true);
        nested_dir.korean_file_name = Some("자산".to_string());
        let records = vec![
            directory,
            nested_dir,
            record(ParaBucket::Projects, None, "projects/nebula/assets/logo.png", false),
        ];

        let root = build_folder_tree(&records, &[]);
        assert_eq!(root.len(), 1);
        assert!(root[0].has_children);
        assert_eq!(root[0].korean_display_name.as_deref(), Some("네뷸라"));

        let level = build_folder_tree(&records, &["nebula".to_string()]);
        assert_eq!(level.len(), 1);
        assert_eq!(level[0].path_key, "nebula/assets");
        assert_eq!(level[0].korean_display_name.as_deref(), Some("자산"));
        assert!(!level[0].has_children);
    }

    #[test]
    fn file_records_never_set_korean_name() {
        let mut file = record(ParaBucket::Areas, Some("health"), "log.md", false);
        file.korean_file_name = Some("기록".to_string());
        let nodes = build_folder_tree(&[file], &[]);
        assert_eq!(nodes[0].korean_display_name, None);
    }

    #[test]
    fn children_sorted_case_insensitively() {
        let records = vec![
            record(ParaBucket::Resources, None, "resources/zeta/a.md", false),
            record(ParaBucket::Resources, None, "resources/Alpha/a.md", false),
            record(ParaBucket::Resources, Some("beta"), "b.md", false),
        ];
        let names = build_folder_tree(&records, &[])
            .into_iter()
            .map(|node| node.display_name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Alpha", "Beta", "zeta"]);
    }

    #[test]
    fn children_partition_matching_records() {
        let records = vec![
            record(ParaBucket::Projects, None, "projects/nebula/a.md", false),
            record(ParaBucket::Projects, None, "projects/nebula/docs/b.md", false),
            record(ParaBucket::Projects, Some("nebula"), "docs/c.md", false),
            record(ParaBucket::Projects, None, "projects/orion/docs/d.md", false),
            record(ParaBucket::Projects, None, "projects/nebula/site/e.md", false),
            record(ParaBucket::Projects, None, "projects/top.md", false),
        ];
        let prefix = vec!["nebula".to_string()];
        let nodes = build_folder_tree(&records, &prefix);

        let matching = records
            .iter()
            .map(VirtualPath::from_record)
            .filter(|path| path.len() > prefix.len() && path.starts_with(&prefix))
            .collect::<Vec<_>>();
        let mut covered = 0;
        for node in &nodes {
            let key = node.path_key.rsplit('/').next().unwrap_or_default();
            covered += matching
                .iter()
                .filter(|path| path.keys()[prefix.len()] == key)
                .count();
        }
        assert_eq!(covered, matching.len());
        assert_eq!(nodes.len(), 2);
    }
}
