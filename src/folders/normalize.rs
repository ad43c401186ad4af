use crate::models::ParaBucket;

pub fn normalize_segments(raw: &str, bucket: Option<ParaBucket>) -> Vec<String> {
    let mut segments = raw_segments(raw)
        .into_iter()
        .map(|segment| segment.to_lowercase())
        .collect::<Vec<_>>();
    if let Some(bucket) = bucket {
        let leading = segments
            .iter()
            .take_while(|segment| segment.as_str() == bucket.key())
            .count();
        segments.drain(..leading);
    }
    segments
}

pub fn normalize_folder_path(raw: &str, bucket: Option<ParaBucket>) -> String {
    normalize_segments(raw, bucket).join("/")
}

pub fn raw_segments(raw: &str) -> Vec<String> {
    raw.trim()
        .replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
