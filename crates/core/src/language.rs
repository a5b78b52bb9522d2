//! Answer languages and their voice profiles
//!
//! The retrieval backend has no language parameter, so the answer language is
//! steered by an instruction prefixed to the question. The same table decides
//! which voice and locale the synthesizer uses.

use serde::{Deserialize, Serialize};

/// Languages an answer can be requested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Tamil,
    Telugu,
    Bengali,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Tamil => "ta",
            Self::Telugu => "te",
            Self::Bengali => "bn",
        }
    }

    /// English name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Tamil => "Tamil",
            Self::Telugu => "Telugu",
            Self::Bengali => "Bengali",
        }
    }

    /// Name of the language in its own script
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "हिंदी",
            Self::Tamil => "தமிழ்",
            Self::Telugu => "తెలుగు",
            Self::Bengali => "বাংলা",
        }
    }

    /// Parse from a code or name (case-insensitive)
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "en" | "eng" | "english" => Some(Self::English),
            "hi" | "hin" | "hindi" => Some(Self::Hindi),
            "ta" | "tam" | "tamil" => Some(Self::Tamil),
            "te" | "tel" | "telugu" => Some(Self::Telugu),
            "bn" | "ben" | "bengali" | "bangla" => Some(Self::Bengali),
            _ => None,
        }
    }

    /// All answer languages, English first
    pub fn all() -> &'static [Language] {
        &[
            Self::English,
            Self::Hindi,
            Self::Tamil,
            Self::Telugu,
            Self::Bengali,
        ]
    }

    /// Static profile for this language
    pub fn profile(&self) -> &'static LanguageProfile {
        match self {
            Self::English => &PROFILES[0],
            Self::Hindi => &PROFILES[1],
            Self::Tamil => &PROFILES[2],
            Self::Telugu => &PROFILES[3],
            Self::Bengali => &PROFILES[4],
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Everything needed to ask for, and voice, an answer in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageProfile {
    pub language: Language,
    /// Label shown in the language picker, e.g. `Hindi (हिंदी)`
    pub display_name: &'static str,
    /// BCP-47 locale passed to the speech backend
    pub locale_code: &'static str,
    /// Voice identity passed to the speech backend
    pub voice_id: &'static str,
    /// Prepended to the question; empty for English
    pub instruction_prefix: &'static str,
}

// Aditi is an Indian English voice that can read the Indic scripts well enough.
static PROFILES: [LanguageProfile; 5] = [
    LanguageProfile {
        language: Language::English,
        display_name: "English",
        locale_code: "en-IN",
        voice_id: "Aditi",
        instruction_prefix: "",
    },
    LanguageProfile {
        language: Language::Hindi,
        display_name: "Hindi (हिंदी)",
        locale_code: "hi-IN",
        voice_id: "Aditi",
        instruction_prefix: "Please respond in Hindi language (हिंदी में जवाब दें). ",
    },
    LanguageProfile {
        language: Language::Tamil,
        display_name: "Tamil (தமிழ்)",
        locale_code: "ta-IN",
        voice_id: "Aditi",
        instruction_prefix: "Please respond in Tamil language (தமிழில் பதிலளிக்கவும்). ",
    },
    LanguageProfile {
        language: Language::Telugu,
        display_name: "Telugu (తెలుగు)",
        locale_code: "te-IN",
        voice_id: "Aditi",
        instruction_prefix: "Please respond in Telugu language (తెలుగులో సమాధానం ఇవ్వండి). ",
    },
    LanguageProfile {
        language: Language::Bengali,
        display_name: "Bengali (বাংলা)",
        locale_code: "bn-IN",
        voice_id: "Aditi",
        instruction_prefix: "Please respond in Bengali language (বাংলায় উত্তর দিন). ",
    },
];

/// Maps a selected display language to its profile
///
/// Lookup never fails: anything unknown, or known but not enabled for this
/// deployment, resolves to the English profile.
#[derive(Debug, Clone)]
pub struct LanguageRouter {
    enabled: Vec<Language>,
}

impl Default for LanguageRouter {
    fn default() -> Self {
        Self {
            enabled: Language::all().to_vec(),
        }
    }
}

impl LanguageRouter {
    /// Router restricted to the given languages. English is always enabled.
    pub fn new(enabled: &[Language]) -> Self {
        let mut langs = vec![Language::English];
        for lang in enabled {
            if !langs.contains(lang) {
                langs.push(*lang);
            }
        }
        Self { enabled: langs }
    }

    /// Enabled languages, English first
    pub fn languages(&self) -> &[Language] {
        &self.enabled
    }

    /// Profiles of the enabled languages, in picker order
    pub fn profiles(&self) -> impl Iterator<Item = &'static LanguageProfile> + '_ {
        self.enabled.iter().map(|l| l.profile())
    }

    /// Resolve a display label (`Tamil (தமிழ்)`) or loose name (`ta`, `tamil`)
    pub fn resolve(&self, display_language: &str) -> &'static LanguageProfile {
        let wanted = display_language.trim();
        let language = PROFILES
            .iter()
            .find(|p| p.display_name == wanted)
            .map(|p| p.language)
            .or_else(|| Language::from_str_loose(wanted));

        match language {
            Some(lang) if self.enabled.contains(&lang) => lang.profile(),
            _ => Language::English.profile(),
        }
    }

    /// Prefix the question with the profile's answer-language instruction
    pub fn augment(&self, query_text: &str, profile: &LanguageProfile) -> String {
        let mut out = String::with_capacity(profile.instruction_prefix.len() + query_text.len());
        out.push_str(profile.instruction_prefix);
        out.push_str(query_text);
        out
    }
}
