use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const RATIFIED: &str = "gara omologata";
pub const UNOFFICIAL: &str = "risultato ufficioso";
pub const TO_BE_PLAYED: &str = "Da disputare";

/// Status column of a fixture row. The federation export uses free-text Italian
/// literals; anything we don't recognise is kept verbatim in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    Ratified,
    Unofficial,
    #[default]
    ToBePlayed,
    Other(String),
}

impl MatchStatus {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(RATIFIED) {
            MatchStatus::Ratified
        } else if trimmed.eq_ignore_ascii_case(UNOFFICIAL) {
            MatchStatus::Unofficial
        } else if trimmed.eq_ignore_ascii_case(TO_BE_PLAYED) {
            MatchStatus::ToBePlayed
        } else {
            MatchStatus::Other(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MatchStatus::Ratified => RATIFIED,
            MatchStatus::Unofficial => UNOFFICIAL,
            MatchStatus::ToBePlayed => TO_BE_PLAYED,
            MatchStatus::Other(raw) => raw.as_str(),
        }
    }

    /// Both ratified and unofficial results count as a completed match.
    pub fn is_final(&self) -> bool {
        matches!(self, MatchStatus::Ratified | MatchStatus::Unofficial)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchStatus::Ratified => "Completata",
            MatchStatus::Unofficial => "Non ufficiale",
            MatchStatus::ToBePlayed | MatchStatus::Other(_) => "Da giocare",
        }
    }
}

impl Serialize for MatchStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MatchStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(MatchStatus::parse(&raw))
    }
}
