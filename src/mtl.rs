//! Parser for the Landsat MTL metadata format.
//!
//! An MTL file is a flat list of `KEY = VALUE` lines. `GROUP = NAME` opens a
//! nested group, `END_GROUP = NAME` closes the innermost one and a line reading
//! `END` terminates the document:
//!
//! ```text
//! GROUP = L1_METADATA_FILE
//!   GROUP = IMAGE_ATTRIBUTES
//!     CLOUD_COVER = 12.34
//!   END_GROUP = IMAGE_ATTRIBUTES
//! END_GROUP = L1_METADATA_FILE
//! END
//! ```
use crate::error::{LookupError, ParseError};
use std::collections::HashMap;

const GROUP: &str = "GROUP";
const END_GROUP: &str = "END_GROUP";
const END: &str = "END";

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Value(String),
    Group(MetadataTree),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTree {
    entries: HashMap<String, Entry>,
}

impl MetadataTree {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut root = MetadataTree::default();
        // Open groups, innermost last. A group is attached to its parent once closed.
        let mut open: Vec<(String, MetadataTree)> = vec![];

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line == END {
                break;
            }
            if line.is_empty() {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ParseError::MissingSeparator {
                line: idx + 1,
                content: line.to_string(),
            })?;
            let key = key.trim();
            let value = unquote(value.trim());

            match key {
                GROUP => open.push((value.to_string(), MetadataTree::default())),
                END_GROUP => {
                    let (name, group) = open.pop().ok_or_else(|| ParseError::UnmatchedEndGroup {
                        line: idx + 1,
                        name: value.to_string(),
                    })?;
                    let parent = match open.last_mut() {
                        Some((_, tree)) => tree,
                        None => &mut root,
                    };
                    parent.entries.insert(name, Entry::Group(group));
                }
                _ => {
                    let current = match open.last_mut() {
                        Some((_, tree)) => tree,
                        None => &mut root,
                    };
                    current
                        .entries
                        .insert(key.to_string(), Entry::Value(value.to_string()));
                }
            }
        }

        if let Some((name, _)) = open.pop() {
            return Err(ParseError::UnclosedGroup { name });
        }
        Ok(root)
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of nested group levels below this one.
    pub fn depth(&self) -> usize {
        self.entries
            .values()
            .filter_map(|entry| match entry {
                Entry::Group(group) => Some(1 + group.depth()),
                Entry::Value(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Follows `path` through nested groups and returns the entry at its end.
    pub fn lookup(&self, path: &[&str]) -> Result<&Entry, LookupError> {
        let mut tree = self;
        for (i, key) in path.iter().enumerate() {
            let entry = tree
                .get(key)
                .ok_or_else(|| LookupError::Missing(path[..=i].join(".")))?;
            if i + 1 == path.len() {
                return Ok(entry);
            }
            tree = match entry {
                Entry::Group(group) => group,
                Entry::Value(_) => return Err(LookupError::NotAGroup(path[..=i].join("."))),
            };
        }
        Err(LookupError::Missing(String::new()))
    }

    pub fn group(&self, path: &[&str]) -> Result<&MetadataTree, LookupError> {
        match self.lookup(path)? {
            Entry::Group(group) => Ok(group),
            Entry::Value(_) => Err(LookupError::NotAGroup(path.join("."))),
        }
    }

    pub fn value(&self, path: &[&str]) -> Result<&str, LookupError> {
        match self.lookup(path)? {
            Entry::Value(value) => Ok(value),
            Entry::Group(_) => Err(LookupError::NotAValue(path.join("."))),
        }
    }

    pub fn number(&self, path: &[&str]) -> Result<f64, LookupError> {
        let value = self.value(path)?;
        value.parse().map_err(|_| LookupError::NotANumber {
            key: path.join("."),
            value: value.to_string(),
        })
    }
}

/// String values are written in double quotes (`MAP_PROJECTION = "UTM"`), numbers and dates are not.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = "\
GROUP = L1_METADATA_FILE
  GROUP = METADATA_FILE_INFO
    ORIGIN = \"Image courtesy of the U.S. Geological Survey\"
    LANDSAT_SCENE_ID = \"LC81970222016121LGN00\"
  END_GROUP = METADATA_FILE_INFO
  GROUP = IMAGE_ATTRIBUTES
    CLOUD_COVER = 12.34
    GROUP = DEEPER
      LEVEL = 3
    END_GROUP = DEEPER
  END_GROUP = IMAGE_ATTRIBUTES
  SPACECRAFT_ID = \"LANDSAT_8\"
END_GROUP = L1_METADATA_FILE
END
";

    #[test]
    fn test_parse_nested_groups() {
        let tree = MetadataTree::parse(NESTED).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), 3);
        assert_eq!(
            tree.value(&["L1_METADATA_FILE", "SPACECRAFT_ID"]).unwrap(),
            "LANDSAT_8"
        );
        assert_eq!(
            tree.number(&["L1_METADATA_FILE", "IMAGE_ATTRIBUTES", "CLOUD_COVER"]).unwrap(),
            12.34
        );
        assert_eq!(
            tree.value(&["L1_METADATA_FILE", "IMAGE_ATTRIBUTES", "DEEPER", "LEVEL"]).unwrap(),
            "3"
        );
        // keys stay at the level they were declared at
        assert!(tree.get("CLOUD_COVER").is_none());
        assert!(tree
            .group(&["L1_METADATA_FILE"])
            .unwrap()
            .get("CLOUD_COVER")
            .is_none());
    }

    #[test]
    fn test_depth_matches_max_open_groups() {
        let text = "GROUP = A\nGROUP = B\nEND_GROUP = B\nGROUP = C\nGROUP = D\nX = 1\nEND_GROUP = D\nEND_GROUP = C\nEND_GROUP = A\nGROUP = E\nEND_GROUP = E\nEND\n";
        let tree = MetadataTree::parse(text).unwrap();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.value(&["A", "C", "D", "X"]).unwrap(), "1");
        assert!(tree.group(&["E"]).unwrap().is_empty());
    }

    #[test]
    fn test_flat_document_has_no_depth() {
        let tree = MetadataTree::parse("A = 1\nB = 2\nEND\n").unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_later_value_overwrites() {
        let tree = MetadataTree::parse("A = 1\nA = 2\nEND").unwrap();
        assert_eq!(tree.value(&["A"]).unwrap(), "2");
    }

    #[test]
    fn test_value_split_at_first_equals() {
        let tree = MetadataTree::parse("URL = http://host/?a=b\nEND").unwrap();
        assert_eq!(tree.value(&["URL"]).unwrap(), "http://host/?a=b");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let tree = MetadataTree::parse("GROUP = A\n\n   \n  X = 1\n\t\nEND_GROUP = A\n\nEND\n").unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.value(&["A", "X"]).unwrap(), "1");
    }

    #[test]
    fn test_stops_at_end() {
        let tree = MetadataTree::parse("A = 1\nEND\nthis line is garbage\nEND_GROUP = X\n").unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_missing_separator_fails() {
        let err = MetadataTree::parse("A = 1\nGARBAGE\nEND").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingSeparator {
                line: 2,
                content: "GARBAGE".to_string()
            }
        );
    }

    #[test]
    fn test_unmatched_end_group_fails() {
        let err = MetadataTree::parse("GROUP = A\nEND_GROUP = A\nEND_GROUP = B\nEND").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnmatchedEndGroup {
                line: 3,
                name: "B".to_string()
            }
        );
    }

    #[test]
    fn test_unclosed_group_fails() {
        let err = MetadataTree::parse("GROUP = A\nGROUP = B\nEND_GROUP = B\nEND").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnclosedGroup {
                name: "A".to_string()
            }
        );
    }

    #[test]
    fn test_lookup_errors() {
        let tree = MetadataTree::parse(NESTED).unwrap();
        assert_eq!(
            tree.value(&["L1_METADATA_FILE", "PRODUCT_METADATA", "DATE_ACQUIRED"]),
            Err(LookupError::Missing("L1_METADATA_FILE.PRODUCT_METADATA".to_string()))
        );
        assert_eq!(
            tree.value(&["L1_METADATA_FILE", "IMAGE_ATTRIBUTES"]),
            Err(LookupError::NotAValue("L1_METADATA_FILE.IMAGE_ATTRIBUTES".to_string()))
        );
        assert!(matches!(
            tree.number(&["L1_METADATA_FILE", "SPACECRAFT_ID"]),
            Err(LookupError::NotANumber { .. })
        ));
    }
}
