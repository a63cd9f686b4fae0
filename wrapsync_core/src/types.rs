//! Shared data types

use serde::{Deserialize, Serialize};

/// One file of a wrapper tree
///
/// `path` is relative to the tree root and always uses `/` separators.
/// `content` may be empty: remote directory markers and empty files both
/// carry no bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: String,
    content: Vec<u8>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A named wrapper as listed by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperPin {
    pub name: String,
    pub cid: String,
}

/// One object reported by the store after a directory upload
///
/// The wrapping directory itself is reported with an empty path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedEntry {
    pub path: String,
    pub cid: String,
}

impl AddedEntry {
    pub fn new(path: impl Into<String>, cid: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cid: cid.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_accessors() {
        let entry = FileEntry::new("sub/b.txt", "hello");
        assert_eq!(entry.path(), "sub/b.txt");
        assert_eq!(entry.content(), b"hello");
        assert!(!entry.is_empty());
        assert!(FileEntry::new("sub", Vec::new()).is_empty());
    }

    #[test]
    fn test_wrapper_pin_deserializes_from_listing() {
        let pins: Vec<WrapperPin> =
            serde_json::from_str(r#"[{"name":"foo","cid":"bafy123","size":42}]"#).unwrap();
        assert_eq!(
            pins,
            vec![WrapperPin {
                name: "foo".to_string(),
                cid: "bafy123".to_string(),
            }]
        );
    }
}
