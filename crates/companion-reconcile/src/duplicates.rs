//! Duplicate manifest key detection over the raw manifest text.

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Manifest keys whose pattern occurs more than once, with every match.
///
/// Keys keep manifest order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport(Vec<(String, Vec<String>)>);

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, matches)| matches.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl Serialize for DuplicateReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

/// For each key, collect the matches of "one character, then the key" in
/// `raw` and report the key when there is more than one.
///
/// This is a substring count, not a structural lookup: a key that also
/// appears inside another entry's value is counted there too.
pub fn find_duplicates(entries: &Map<String, Value>, raw: &str) -> DuplicateReport {
    let mut report = Vec::new();
    for key in entries.keys() {
        if key.is_empty() {
            continue;
        }
        let matches = key_matches(key, raw);
        if matches.len() > 1 {
            tracing::debug!(key = %key, occurrences = matches.len(), "duplicate manifest key");
            report.push((key.clone(), matches));
        }
    }
    DuplicateReport(report)
}

fn key_matches(key: &str, raw: &str) -> Vec<String> {
    let pattern = format!(".{}", regex::escape(key));
    match Regex::new(&pattern) {
        Ok(re) => re.find_iter(raw).map(|m| m.as_str().to_string()).collect(),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "skipping manifest key that cannot be matched");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn key_seen_twice_is_duplicate() {
        let parsed = entries(json!({"a.1": {}}));
        let raw = r#"{"a.1":{},"a.1":{"p":1}}"#;
        let report = find_duplicates(&parsed, raw);
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.get("a.1"),
            Some(&["\"a.1".to_string(), "\"a.1".to_string()][..])
        );
    }

    #[test]
    fn single_occurrence_is_not_duplicate() {
        let parsed = entries(json!({"a.1": {}, "c.3": {}}));
        let report = find_duplicates(&parsed, r#"{"a.1":{},"c.3":{}}"#);
        assert!(report.is_empty());
    }

    #[test]
    fn key_inside_another_value_counts() {
        let parsed = entries(json!({"a.1": {}, "b.2": {}}));
        let raw = r#"{"a.1":{},"b.2":{"path":"/peers/a.1/x"}}"#;
        let report = find_duplicates(&parsed, raw);
        assert_eq!(report.get("a.1").map(<[String]>::len), Some(2));
        assert!(report.get("b.2").is_none());
    }

    #[test]
    fn key_metacharacters_are_literal() {
        let parsed = entries(json!({"a.1": {}}));
        let raw = r#"{"a.1":{},"x":"-ab1-"}"#;
        assert!(find_duplicates(&parsed, raw).is_empty());
    }

    #[test]
    fn empty_key_is_skipped() {
        let parsed = entries(json!({"": 1}));
        assert!(find_duplicates(&parsed, r#"{"":1}"#).is_empty());
    }

    #[test]
    fn report_keeps_manifest_key_order() {
        let raw = r#"{"z.9":{},"z.9":{},"a.1":{},"a.1":{}}"#;
        let parsed: Map<String, Value> = serde_json::from_str(raw).expect("manifest");
        let report = find_duplicates(&parsed, raw);
        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["z.9", "a.1"]);

        let rendered = serde_json::to_string(&report).expect("serialize");
        assert!(rendered.starts_with(r#"{"z.9":"#), "{rendered}");
    }

    #[test]
    fn detection_is_idempotent() {
        let parsed = entries(json!({"a.1": {}}));
        let raw = r#"{"a.1":{},"a.1":{}}"#;
        assert_eq!(find_duplicates(&parsed, raw), find_duplicates(&parsed, raw));
    }
}
