use serde::{Deserialize, Serialize};

const PLACEHOLDER_ARTWORK: &str = "/placeholder-track.jpg";

/// A SoundCloud track (simplified).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    /// Milliseconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub playback_count: Option<u64>,
    #[serde(default)]
    pub favoritings_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub user: User,
}

#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct User {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
}

impl Track {
    /// Best artwork for a track card: 300x300 artwork, then the uploader's
    /// avatar, then a placeholder.
    pub fn display_artwork_url(&self) -> String {
        match (&self.artwork_url, &self.user.avatar_url) {
            (Some(art), _) => art.replace("large", "t300x300"),
            (None, Some(avatar)) => avatar.clone(),
            (None, None) => PLACEHOLDER_ARTWORK.into(),
        }
    }
}

/// One page of search results.
#[derive(Clone, Debug)]
pub struct SearchPage {
    pub tracks: Vec<Track>,
    pub has_next_page: bool,
}
