//! Static mapping from OpenAI-style voice names to Edge neural voices

use crate::types::VoiceInfo;

/// Provider label reported for every voice in the table
pub const EDGE_TTS_PROVIDER: &str = "edge-tts";

/// External voice used when a request names no voice
pub const DEFAULT_VOICE_ID: &str = "alloy";

/// Provider voice used when a request names an unknown voice
pub const DEFAULT_PROVIDER_VOICE: &str = "en-US-AriaNeural";

const VOICE_TABLE: &[(&str, &str)] = &[
    ("alloy", "en-US-AriaNeural"),
    ("echo", "en-US-GuyNeural"),
    ("fable", "en-GB-SoniaNeural"),
    ("onyx", "en-US-ChristopherNeural"),
    ("nova", "en-US-JennyNeural"),
    ("shimmer", "en-AU-NatashaNeural"),
];

/// Lookup table resolving external voice names to provider voices
#[derive(Debug, Clone, Copy)]
pub struct VoiceSelector {
    entries: &'static [(&'static str, &'static str)],
    fallback: &'static str,
}

impl Default for VoiceSelector {
    fn default() -> Self {
        Self {
            entries: VOICE_TABLE,
            fallback: DEFAULT_PROVIDER_VOICE,
        }
    }
}

impl VoiceSelector {
    /// Create the standard six-voice table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an external voice name, falling back to the default voice
    #[must_use]
    pub fn resolve(&self, name: &str) -> &'static str {
        self.entries
            .iter()
            .find(|(id, _)| *id == name)
            .map_or(self.fallback, |(_, voice)| voice)
    }

    /// The table as voice descriptors, in table order
    #[must_use]
    pub fn voices(&self) -> Vec<VoiceInfo> {
        self.entries
            .iter()
            .map(|(id, voice)| VoiceInfo::new(*id, *voice, EDGE_TTS_PROVIDER))
            .collect()
    }

}
