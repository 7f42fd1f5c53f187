//! Library modes: which library manager and history section a run targets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which half of the media stack a run analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LibraryMode {
    /// TV series from Sonarr, matched against the Tautulli `show` section.
    #[value(alias = "sonarr")]
    Series,
    /// Movies from Radarr, matched against the Tautulli `movie` section.
    #[value(alias = "radarr")]
    Movies,
}

/// Section types reported by the history service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Show,
    Movie,
    /// Music, photo and anything else we never query.
    #[serde(other)]
    Other,
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionType::Show => "show",
            SectionType::Movie => "movie",
            SectionType::Other => "other",
        };
        f.write_str(name)
    }
}

impl LibraryMode {
    /// Name of the library manager backing this mode.
    pub fn service_name(&self) -> &'static str {
        match self {
            LibraryMode::Series => "sonarr",
            LibraryMode::Movies => "radarr",
        }
    }

    /// v3 API resource the library manager exposes items under.
    pub fn api_resource(&self) -> &'static str {
        match self {
            LibraryMode::Series => "series",
            LibraryMode::Movies => "movie",
        }
    }

    pub fn section_type(&self) -> SectionType {
        match self {
            LibraryMode::Series => SectionType::Show,
            LibraryMode::Movies => SectionType::Movie,
        }
    }

    /// Singular label used in prompts ("Delete this movie?").
    pub fn item_label(&self) -> &'static str {
        match self {
            LibraryMode::Series => "series",
            LibraryMode::Movies => "movie",
        }
    }

    /// Plural label used in summaries and reports.
    pub fn plural_label(&self) -> &'static str {
        match self {
            LibraryMode::Series => "series",
            LibraryMode::Movies => "movies",
        }
    }
}

impl fmt::Display for LibraryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}
