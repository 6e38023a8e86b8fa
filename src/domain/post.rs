// ============================================================
// Layer 3 — LabeledPost Domain Type
// ============================================================
// One short free-text message together with its class:
//   1 = disaster-related, 0 = not disaster-related
//
// The `target` alias lets the loader read datasets that use
// the common "text,target" column naming directly.

use serde::{Deserialize, Serialize};

/// A labelled post used for training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledPost {
    /// Raw, un-normalised message text
    pub text: String,

    /// 1 if the post is disaster-related, 0 otherwise
    #[serde(alias = "target")]
    pub label: u8,
}

impl LabeledPost {
    pub fn new(text: impl Into<String>, label: u8) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }

    pub fn is_disaster(&self) -> bool {
        self.label == 1
    }
}

/// Split a slice of posts into parallel text and label vectors,
/// the shape the training procedure consumes.
pub fn unzip_posts(posts: &[LabeledPost]) -> (Vec<String>, Vec<u8>) {
    posts.iter().map(|p| (p.text.clone(), p.label)).unzip()
}
