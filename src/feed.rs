//! Finding the newest published scene from the USGS acquisition feed.
use crate::error::{Error, TransportError};
use crate::provider::{Fetch, SceneProbe};
use crate::scene::SceneId;
use regex::Regex;
use roxmltree::Node;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl FeedEntry {
    pub fn scene_id(self: &Self) -> SceneId {
        SceneId::new(extract_scene_id(&self.description))
    }
}

/// Reads the `<item>` elements of an RSS document, in document order.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, Error> {
    let doc = roxmltree::Document::parse(xml)?;

    let entries = doc
        .descendants()
        .filter(|n| n.has_tag_name("item"))
        .map(|item| FeedEntry {
            title: child_text(item, "title"),
            link: child_text(item, "link"),
            description: child_text(item, "description"),
        })
        .collect();
    Ok(entries)
}

fn child_text(item: Node, tag: &str) -> String {
    item.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
        .unwrap_or_default()
        .to_string()
}

pub async fn fetch_feed(source: &impl Fetch, url: &str) -> Result<Vec<FeedEntry>, Error> {
    let xml = source.fetch_text(url).await?;
    let entries = parse_feed(&xml)?;
    info!(url, entries = entries.len(), "read feed");
    Ok(entries)
}

/// Value of the first `Scene ID: ...` line of a feed description, or an empty string.
pub fn extract_scene_id(description: &str) -> String {
    let re = Regex::new(r"(?mi)^Scene ID: (.*)$").expect("Regex pattern should always compile");
    re.captures(description)
        .and_then(|c| c.get(1))
        // `$` stops before `\n` only, CRLF descriptions leave a trailing `\r`
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Newest entry of a newest-first feed whose scene is already published.
///
/// Publication lags acquisition, so the feed splits into a run of unpublished scenes
/// followed by published ones. A binary search finds the boundary with at most
/// `ceil(log2(n)) + 1` probes. Entries without a scene id probe as unavailable.
pub async fn find_latest_scene(
    entries: &[FeedEntry],
    probe: &impl SceneProbe,
) -> Result<Option<SceneId>, TransportError> {
    let mut lo = 0;
    let mut hi = entries.len();

    while lo < hi {
        let mid = (lo + hi) / 2;
        let scene = entries[mid].scene_id();
        println!("Trying {} - Entry {}", scene, mid);
        if probe.is_available(&scene).await? {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    if let Some(entry) = entries.get(lo) {
        let scene = entry.scene_id();
        if probe.is_available(&scene).await? {
            debug!(%scene, index = lo, "latest available scene");
            return Ok(Some(scene));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    struct FakeProbe {
        available: HashSet<String>,
        calls: Cell<usize>,
    }

    impl FakeProbe {
        fn new(available: &[String]) -> Self {
            Self {
                available: available.iter().cloned().collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl SceneProbe for FakeProbe {
        async fn is_available(self: &Self, scene: &SceneId) -> Result<bool, TransportError> {
            self.calls.set(self.calls.get() + 1);
            Ok(!scene.is_empty() && self.available.contains(scene.as_str()))
        }
    }

    fn entry(id: &str) -> FeedEntry {
        FeedEntry {
            title: id.to_string(),
            link: String::new(),
            description: format!(
                "Acquisition Date: 2016-05-01\nScene ID: {id}\nPath: 197\nRow: 22\nCloud Cover: 12.3"
            ),
        }
    }

    fn entries_with(availability: &[bool]) -> (Vec<FeedEntry>, Vec<String>) {
        let ids: Vec<String> = (0..availability.len())
            .map(|i| format!("LC8197022201612{i}LGN00"))
            .collect();
        let available = ids
            .iter()
            .zip(availability)
            .filter(|(_, a)| **a)
            .map(|(id, _)| id.clone())
            .collect();
        (ids.iter().map(|id| entry(id)).collect(), available)
    }

    #[test]
    fn test_extract_scene_id() {
        assert_eq!(
            extract_scene_id("Path: 1\nscene id: LC81970222016121LGN00\nRow: 2"),
            "LC81970222016121LGN00"
        );
        assert_eq!(extract_scene_id("Scene ID: A\nScene ID: B"), "A");
        assert_eq!(extract_scene_id("Scene ID: LC81970222016121LGN00\r\nPath: 197"), "LC81970222016121LGN00");
        assert_eq!(extract_scene_id("no id here"), "");
        assert_eq!(extract_scene_id("Prefix Scene ID: X"), "");
    }

    #[tokio::test]
    async fn test_finds_boundary_within_probe_budget() {
        let (entries, available) = entries_with(&[false, false, false, false, true, true, true, true]);
        let probe = FakeProbe::new(&available);
        let found = find_latest_scene(&entries, &probe).await.unwrap();
        assert_eq!(found, Some(entries[4].scene_id()));
        assert!(probe.calls.get() <= 4);
    }

    #[tokio::test]
    async fn test_newest_entry_available() {
        let (entries, available) = entries_with(&[true; 5]);
        let probe = FakeProbe::new(&available);
        let found = find_latest_scene(&entries, &probe).await.unwrap();
        assert_eq!(found, Some(entries[0].scene_id()));
    }

    #[tokio::test]
    async fn test_nothing_available() {
        let (entries, available) = entries_with(&[false; 8]);
        let probe = FakeProbe::new(&available);
        assert_eq!(find_latest_scene(&entries, &probe).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_feed() {
        let probe = FakeProbe::new(&[]);
        assert_eq!(find_latest_scene(&[], &probe).await.unwrap(), None);
        assert_eq!(probe.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_entry_without_scene_id_is_unavailable() {
        let (mut entries, available) = entries_with(&[false, false, true, true]);
        entries[3].description = "maintenance notice".to_string();
        let probe = FakeProbe::new(&available);
        // the search lands on index 2 without consulting the id-less entry
        let found = find_latest_scene(&entries, &probe).await.unwrap();
        assert_eq!(found, Some(entries[2].scene_id()));
    }

    #[test]
    fn test_parse_feed() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Landsat 8 Scenes</title>
    <item>
      <title>LC81970222016121LGN00</title>
      <link>https://earthexplorer.usgs.gov/</link>
      <description>Acquisition Date: 2016-04-30
Scene ID: LC81970222016121LGN00
Path: 197</description>
    </item>
    <item>
      <title>LC81980222016120LGN00</title>
      <description>Scene ID: LC81980222016120LGN00</description>
    </item>
  </channel>
</rss>"#;
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].link, "https://earthexplorer.usgs.gov/");
        assert_eq!(entries[0].scene_id().as_str(), "LC81970222016121LGN00");
        assert_eq!(entries[1].link, "");
        assert_eq!(entries[1].scene_id().as_str(), "LC81980222016120LGN00");
    }

    #[test]
    fn test_parse_feed_rejects_broken_xml() {
        assert!(parse_feed("<rss><item></rss>").is_err());
    }
}
