/// Speakers and the registry that resolves `speaker:` tag values.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerId(pub String);

impl SpeakerId {
    pub fn new(id: impl Into<String>) -> Self {
        SpeakerId(id.into())
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A speaker record. `layout_slot` selects which dialogue layout the
/// presentation layer fills with this speaker's portrait and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: SpeakerId,
    pub display_name: String,
    #[serde(default)]
    pub layout_slot: usize,
    #[serde(default)]
    pub portrait: Option<String>,
}

/// Registry of all known speakers, keyed by the id used in script tags.
#[derive(Debug, Clone, Default)]
pub struct SpeakerRegistry {
    speakers: FxHashMap<SpeakerId, Speaker>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, speaker: Speaker) {
        self.speakers.insert(speaker.id.clone(), speaker);
    }

    pub fn get(&self, id: &str) -> Option<&Speaker> {
        self.speakers.get(&SpeakerId::new(id))
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    /// Load speakers from a RON file containing a list of `Speaker`s.
    pub fn load_from_ron(&mut self, path: &Path) -> Result<(), SpeakerError> {
        let contents = std::fs::read_to_string(path)?;
        self.parse_ron(&contents)
    }

    pub fn parse_ron(&mut self, input: &str) -> Result<(), SpeakerError> {
        let speakers: Vec<Speaker> = ron::from_str(input)?;
        for speaker in speakers {
            self.register(speaker);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpeakerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}
