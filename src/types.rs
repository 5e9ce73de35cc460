use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Provider file category code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Category {
    Video,
    Audio,
    Image,
    Document,
    App,
    Other,
    Torrent,
    Unknown(i64),
}

impl From<i64> for Category {
    fn from(code: i64) -> Self {
        match code {
            1 => Category::Video,
            2 => Category::Audio,
            3 => Category::Image,
            4 => Category::Document,
            5 => Category::App,
            6 => Category::Other,
            7 => Category::Torrent,
            other => Category::Unknown(other),
        }
    }
}

impl From<Category> for i64 {
    fn from(category: Category) -> Self {
        match category {
            Category::Video => 1,
            Category::Audio => 2,
            Category::Image => 3,
            Category::Document => 4,
            Category::App => 5,
            Category::Other => 6,
            Category::Torrent => 7,
            Category::Unknown(code) => code,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Unknown(0)
    }
}

/// One child of a listed directory
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListEntry {
    pub fs_id: u64,
    pub path: String,
    pub server_filename: String,
    pub is_dir: bool,
    pub size: u64,
    pub category: Category,
    pub real_category: String,
    pub server_ctime: i64,
    pub server_mtime: i64,
    pub server_atime: i64,
    pub local_ctime: i64,
    pub local_mtime: i64,
    pub owner_id: i64,
    pub owner_type: i64,
    pub oper_id: i64,
    pub share: bool,
    pub unlist: bool,
    pub thumbs: BTreeMap<String, String>,
}

impl ListEntry {
    /// Decode one raw listing record
    ///
    /// Only `fs_id` and `path` are required; every other field falls back
    /// to its default when it is missing or has an unexpected type.
    pub fn from_value(value: &Value) -> Option<Self> {
        let record = value.as_object()?;
        let fs_id = record.get("fs_id").and_then(uint_of)?;
        let path = record.get("path").and_then(Value::as_str)?.to_string();

        let int = |key: &str| record.get(key).and_then(int_of).unwrap_or_default();
        let text = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_default()
        };

        let server_filename = match text("server_filename") {
            name if name.is_empty() => path.rsplit('/').next().unwrap_or_default().to_string(),
            name => name,
        };

        Some(Self {
            fs_id,
            server_filename,
            path,
            is_dir: int("isdir") > 0,
            size: record.get("size").and_then(uint_of).unwrap_or_default(),
            category: Category::from(int("category")),
            real_category: text("real_category"),
            server_ctime: int("server_ctime"),
            server_mtime: int("server_mtime"),
            server_atime: int("server_atime"),
            local_ctime: int("local_ctime"),
            local_mtime: int("local_mtime"),
            owner_id: int("owner_id"),
            owner_type: int("owner_type"),
            oper_id: int("oper_id"),
            share: int("share") > 0,
            unlist: int("unlist") > 0,
            thumbs: record
                .get("thumbs")
                .and_then(Value::as_object)
                .map(string_map)
                .unwrap_or_default(),
        })
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}

/// One page of a directory listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Entries that decoded successfully, in provider order
    pub entries: Vec<ListEntry>,
    /// Number of raw records the provider returned for this page
    pub fetched: usize,
}

/// Full metadata for a single file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(deserialize_with = "de_u64")]
    pub fs_id: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, deserialize_with = "de_u64")]
    pub size: u64,
    #[serde(default)]
    pub category: Category,
    #[serde(default, rename = "isdir", deserialize_with = "de_flag")]
    pub is_dir: bool,
    #[serde(default)]
    pub md5: String,
    #[serde(default)]
    pub dlink: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub server_ctime: i64,
    #[serde(default)]
    pub server_mtime: i64,
    #[serde(default)]
    pub oper_id: i64,
    /// Position assigned by the tree walker, never by the provider
    #[serde(skip_deserializing)]
    pub walk_index: Option<u64>,
}

/// Read an integer from a number or a numeric string
pub(crate) fn int_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok())),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Read an unsigned integer from a number or a numeric string
pub(crate) fn uint_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_map(map: &Map<String, Value>) -> BTreeMap<String, String> {
    map.iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}

fn de_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    uint_of(&value).ok_or_else(|| {
        serde::de::Error::custom(format!("expected unsigned integer, found {value}"))
    })
}

fn de_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    int_of(&value)
        .map(|n| n > 0)
        .ok_or_else(|| serde::de::Error::custom(format!("expected flag, found {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_entry_tolerates_bad_optional_fields() {
        let raw = json!({
            "fs_id": 1024,
            "path": "/movies/a.mp4",
            "server_filename": "a.mp4",
            "isdir": 0,
            "size": "not a number",
            "category": 1,
            "thumbs": {"url1": "https://thumb/1", "icon": 3}
        });

        let entry = ListEntry::from_value(&raw).unwrap();
        assert_eq!(entry.fs_id, 1024);
        assert_eq!(entry.size, 0);
        assert_eq!(entry.category, Category::Video);
        assert!(entry.is_file());
        assert_eq!(entry.thumbs.len(), 1);
    }

    #[test]
    fn test_list_entry_requires_id_and_path() {
        assert!(ListEntry::from_value(&json!({"path": "/a"})).is_none());
        assert!(ListEntry::from_value(&json!({"fs_id": 1})).is_none());
        assert!(ListEntry::from_value(&json!("oops")).is_none());
    }

    #[test]
    fn test_list_entry_name_falls_back_to_path() {
        let raw = json!({"fs_id": 7, "path": "/a/b/c.txt", "isdir": 1});
        let entry = ListEntry::from_value(&raw).unwrap();
        assert_eq!(entry.server_filename, "c.txt");
        assert!(entry.is_dir);
    }

    #[test]
    fn test_file_meta_keeps_large_ids() {
        let raw = r#"{"fs_id": 9007199254740993, "filename": "x.mkv", "category": 7,
                      "isdir": 0, "dlink": "https://d/x", "md5": "abc", "size": 12}"#;
        let meta: FileMeta = serde_json::from_str(raw).unwrap();
        assert_eq!(meta.fs_id, 9_007_199_254_740_993);
        assert_eq!(meta.category, Category::Torrent);
        assert_eq!(meta.walk_index, None);
        assert!(!meta.is_dir);
    }

    #[test]
    fn test_category_codes() {
        assert_eq!(Category::from(3), Category::Image);
        assert_eq!(Category::from(42), Category::Unknown(42));
        assert_eq!(i64::from(Category::Audio), 2);
    }
}
