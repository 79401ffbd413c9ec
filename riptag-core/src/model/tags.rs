use serde::{Deserialize, Serialize};

/// User-confirmed metadata for one output file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagSet {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub date: String,
    pub track_number: String,
    pub album_artist: String,
    pub lyrics: Option<String>,
    pub duration_secs: u64,
}

impl TagSet {
    /// Copy of these tags with fetched lyrics attached. Blank text is
    /// treated as no lyrics.
    pub fn with_lyrics(&self, lyrics: Option<&str>) -> TagSet {
        TagSet {
            lyrics: lyrics
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string),
            ..self.clone()
        }
    }

    /// Key/value pairs written into the container, in a stable order.
    pub fn metadata(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("title".to_string(), self.title.clone()),
            ("artist".to_string(), self.artist.clone()),
            ("album_artist".to_string(), self.album_artist.clone()),
            ("album".to_string(), self.album.clone()),
            ("track".to_string(), self.track_number.clone()),
            ("date".to_string(), self.date.clone()),
        ];
        if let Some(lyrics) = &self.lyrics {
            pairs.push(("LYRICS".to_string(), lyrics.clone()));
        }
        pairs
    }

    /// `"<artist> - <title>.flac"`, before sanitizing.
    pub fn file_name(&self) -> String {
        format!("{} - {}.flac", self.artist, self.title)
    }
}
