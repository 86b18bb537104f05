//! YouTube video id extraction

use regex::Regex;
use std::sync::LazyLock;

/// watch?v=, youtu.be/, embed/, v/ and shorts/ links
static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    )
    .unwrap()
});

static RE_BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_-]{11})$").unwrap());

/// Extract the 11-character video id from a link or a bare id
///
/// Returns `None` when the input matches neither form.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    [&*RE_URL, &*RE_BARE_ID]
        .into_iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}

/// Split pasted text into individual links (newline or comma separated)
pub fn split_links(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validity of one link in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheck {
    pub link: String,
    pub video_id: Option<String>,
}

impl LinkCheck {
    pub fn is_valid(&self) -> bool {
        self.video_id.is_some()
    }
}

/// Classify links without touching any state
pub fn analyze_links(links: &[String]) -> Vec<LinkCheck> {
    links
        .iter()
        .map(|link| LinkCheck {
            link: link.clone(),
            video_id: extract_video_id(link),
        })
        .collect()
}
