//! Status vocabulary: backend tokens, canonical statuses and display labels.
//!
//! The backend has spoken more than one dialect over time (a Spanish UI wrote
//! `pendiente`/`viendo`/..., other clients write `plan_to_watch`/`on_hold`).
//! Everything that reaches the rest of the crate goes through [`normalize`],
//! so callers only ever match on [`Status`] or an explicit
//! [`EntryStatus::Unknown`].

use serde::{Deserialize, Serialize};

/// Canonical watch status of a list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Plan,
    Watching,
    Completed,
    OnHold,
    Dropped,
}

impl Status {
    pub const ALL: &[Status] = &[
        Self::Plan,
        Self::Watching,
        Self::Completed,
        Self::OnHold,
        Self::Dropped,
    ];

    /// Wire token sent to the backend.
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Watching => "watching",
            Self::Completed => "completed",
            Self::OnHold => "on-hold",
            Self::Dropped => "dropped",
        }
    }

    /// Human-readable label, also used as the value of status pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Plan => "Plan to watch",
            Self::Watching => "Watching",
            Self::Completed => "Completed",
            Self::OnHold => "On-Hold",
            Self::Dropped => "Dropped",
        }
    }

    /// Inverse of [`Status::label`]. Exact match only.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.label() == label)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    /// Accepts a display label or any token [`normalize`] recognizes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(status) = Self::from_label(s) {
            return Ok(status);
        }
        match normalize(Some(s)) {
            EntryStatus::Known(status) if !s.trim().is_empty() => Ok(status),
            _ => Err(format!("unknown status: {s}")),
        }
    }
}

/// Status of a list entry after normalization.
///
/// `Unknown` keeps the raw token so it can be shown and reported instead of
/// being filed under some canonical status it doesn't belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Known(Status),
    Unknown(String),
}

impl EntryStatus {
    pub fn known(&self) -> Option<Status> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Unknown(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        label(self)
    }
}

impl From<Status> for EntryStatus {
    fn from(status: Status) -> Self {
        Self::Known(status)
    }
}

/// Label shown for statuses the vocabulary doesn't know.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Map a raw backend token to a status.
///
/// Missing or blank tokens mean the entry was never categorized, which the
/// backend treats as "plan". Matching is case-insensitive and ignores
/// surrounding whitespace.
pub fn normalize(raw: Option<&str>) -> EntryStatus {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return EntryStatus::Known(Status::Plan);
    };

    let status = match raw.to_lowercase().as_str() {
        "plan" | "pendiente" | "plan to watch" | "plan_to_watch" => Status::Plan,
        "watching" | "viendo" => Status::Watching,
        "completed" | "completado" => Status::Completed,
        "on-hold" | "onhold" | "on_hold" => Status::OnHold,
        "dropped" | "cancelado" => Status::Dropped,
        _ => return EntryStatus::Unknown(raw.to_string()),
    };
    EntryStatus::Known(status)
}

/// Display label for any normalized status. Total.
pub fn label(status: &EntryStatus) -> &'static str {
    match status {
        EntryStatus::Known(s) => s.label(),
        EntryStatus::Unknown(_) => UNKNOWN_LABEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_tokens() {
        let table = [
            ("pendiente", Status::Plan),
            ("viendo", Status::Watching),
            ("completado", Status::Completed),
            ("cancelado", Status::Dropped),
            ("onhold", Status::OnHold),
            ("on_hold", Status::OnHold),
            ("plan_to_watch", Status::Plan),
            ("Plan to watch", Status::Plan),
        ];
        for (raw, expected) in table {
            assert_eq!(normalize(Some(raw)), EntryStatus::Known(expected), "{raw}");
        }
    }

    #[test]
    fn test_canonical_tokens_map_to_themselves() {
        for status in Status::ALL {
            assert_eq!(
                normalize(Some(status.as_token())),
                EntryStatus::Known(*status)
            );
        }
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(normalize(Some("  VIENDO ")), Status::Watching.into());
        assert_eq!(normalize(Some("On-Hold")), Status::OnHold.into());
    }

    #[test]
    fn test_missing_or_blank_is_plan() {
        assert_eq!(normalize(None), Status::Plan.into());
        assert_eq!(normalize(Some("")), Status::Plan.into());
        assert_eq!(normalize(Some("   ")), Status::Plan.into());
    }

    #[test]
    fn test_unrecognized_is_unknown_not_plan() {
        let status = normalize(Some("rewatching"));
        assert_eq!(status, EntryStatus::Unknown("rewatching".into()));
        assert_eq!(status.known(), None);
        assert_eq!(label(&status), UNKNOWN_LABEL);
    }

    #[test]
    fn test_label_defined_for_plausible_inputs() {
        let inputs = [None, Some(""), Some("viendo"), Some("watching"), Some("???")];
        for raw in inputs {
            assert!(!label(&normalize(raw)).is_empty());
        }
    }

    #[test]
    fn test_label_roundtrip() {
        for status in Status::ALL {
            assert_eq!(Status::from_label(status.label()), Some(*status));
        }
        assert_eq!(Status::from_label("watching"), None);
        assert_eq!(Status::from_label(UNKNOWN_LABEL), None);
    }

    #[test]
    fn test_from_str_accepts_labels_and_tokens() {
        assert_eq!("On-Hold".parse::<Status>(), Ok(Status::OnHold));
        assert_eq!("viendo".parse::<Status>(), Ok(Status::Watching));
        assert!("".parse::<Status>().is_err());
        assert!("nope".parse::<Status>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_tokens() {
        let json = serde_json::to_string(&Status::OnHold).unwrap();
        assert_eq!(json, "\"on-hold\"");
        let back: Status = serde_json::from_str("\"plan\"").unwrap();
        assert_eq!(back, Status::Plan);
    }
}
