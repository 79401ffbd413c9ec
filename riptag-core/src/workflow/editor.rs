use crate::{
    error::PayloadMismatch,
    model::{Candidate, TagSet},
};

/// The five editable fields, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TagField {
    Title,
    Artist,
    Album,
    Date,
    TrackNumber,
}

impl TagField {
    /// Every field in focus order.
    pub const ALL: [TagField; 5] = [
        TagField::Title,
        TagField::Artist,
        TagField::Album,
        TagField::Date,
        TagField::TrackNumber,
    ];

    /// Label shown next to the input.
    pub fn label(self) -> &'static str {
        match self {
            TagField::Title => "Title",
            TagField::Artist => "Artist",
            TagField::Album => "Album",
            TagField::Date => "Date",
            TagField::TrackNumber => "Track number",
        }
    }
}

const FIELD_COUNT: usize = TagField::ALL.len();

/// Result of pressing enter in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorStep {
    /// Focus moved to the next field.
    Advanced,
    /// The last field was confirmed.
    Finalized(TagSet),
}

/// Cyclic-focus form over the five tag fields.
///
/// Focus is a single index, so blurring the old field and focusing the new
/// one cannot be observed half done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEditor {
    values: [String; FIELD_COUNT],
    focus: usize,
    duration_secs: u64,
}

impl TagEditor {
    /// Pre-fill from the chosen release and track.
    pub fn prefill(
        release: &Candidate,
        track: &Candidate,
    ) -> Result<Self, PayloadMismatch> {
        let release = release.release_info()?;
        let track = track.track_info()?;
        Ok(Self {
            values: [
                track.title.clone(),
                track.artist.clone(),
                release.title.clone(),
                release.date.clone(),
                track.number.clone(),
            ],
            focus: 0,
            // Whole seconds; the remainder is dropped.
            duration_secs: track.length_ms.unwrap_or(0) / 1000,
        })
    }

    /// Index of the focused field.
    pub fn focus(&self) -> usize {
        self.focus
    }

    /// The field keystrokes go to.
    pub fn focused_field(&self) -> TagField {
        TagField::ALL[self.focus]
    }

    /// True when `field` has the focus.
    pub fn is_focused(&self, field: TagField) -> bool {
        self.focused_field() == field
    }

    /// Current text of `field`.
    pub fn value(&self, field: TagField) -> &str {
        &self.values[field as usize]
    }

    /// Every field with its current text, in focus order.
    pub fn fields(&self) -> impl Iterator<Item = (TagField, &str)> {
        TagField::ALL
            .into_iter()
            .map(|field| (field, self.value(field)))
    }

    /// Down: wraps from the last field to the first.
    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FIELD_COUNT;
    }

    /// Up: wraps from the first field to the last.
    pub fn focus_previous(&mut self) {
        self.focus = (self.focus + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    /// Append to the focused field.
    pub fn insert(&mut self, ch: char) {
        self.values[self.focus].push(ch);
    }

    /// Drop the last character of the focused field.
    pub fn backspace(&mut self) {
        self.values[self.focus].pop();
    }

    /// Enter: move on, or finalize when the last field is focused.
    pub fn submit(&mut self) -> EditorStep {
        if self.focus + 1 < FIELD_COUNT {
            self.focus += 1;
            EditorStep::Advanced
        } else {
            EditorStep::Finalized(self.finalize())
        }
    }

    fn finalize(&self) -> TagSet {
        let [title, artist, album, date, track_number] = self.values.clone();
        TagSet {
            album_artist: artist.clone(),
            title,
            artist,
            album,
            date,
            track_number,
            lyrics: None,
            duration_secs: self.duration_secs,
        }
    }
}
