//! Enumerations and field types for dossiers.
//!
//! This module defines the structured values a dossier can carry: its priority,
//! its workflow status (which decides the board column) and the closed list of
//! case types used by the office.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority classification for a dossier.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    /// Label shown on cards and in the filter bar.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Basse",
            Priority::Medium => "Moyenne",
            Priority::High => "Haute",
            Priority::Urgent => "Urgent",
        }
    }
}

/// Workflow status of a dossier. Each status is one board column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Todo,
    #[value(alias = "in_progress")]
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    /// Column heading.
    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "À faire",
            Status::InProgress => "En cours",
            Status::Done => "Formalités postérieures",
        }
    }

    /// Stable identifier, as stored and as written in the config file.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed list of case categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    #[serde(alias = "Vente")]
    Vente,
    #[serde(alias = "Notoriété Acquisitive")]
    NotorieteAcquisitive,
    #[serde(alias = "Succession")]
    Succession,
    #[serde(alias = "Divorce")]
    Divorce,
    #[serde(alias = "Donation")]
    Donation,
    #[serde(alias = "Prêt")]
    Pret,
    #[serde(alias = "Authentification de signature")]
    AuthentificationSignature,
    #[serde(alias = "Autre")]
    Autre,
}

impl CaseType {
    pub const ALL: [CaseType; 8] = [
        CaseType::Vente,
        CaseType::NotorieteAcquisitive,
        CaseType::Succession,
        CaseType::Divorce,
        CaseType::Donation,
        CaseType::Pret,
        CaseType::AuthentificationSignature,
        CaseType::Autre,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CaseType::Vente => "Vente",
            CaseType::NotorieteAcquisitive => "Notoriété Acquisitive",
            CaseType::Succession => "Succession",
            CaseType::Divorce => "Divorce",
            CaseType::Donation => "Donation",
            CaseType::Pret => "Prêt",
            CaseType::AuthentificationSignature => "Authentification de signature",
            CaseType::Autre => "Autre",
        }
    }
}

/// Optional descriptive fields that the board configuration may mark as required.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Title,
    FileNumber,
    ClientName,
    Notaire,
    CaseType,
    Notes,
}

impl TaskField {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::FileNumber => "file_number",
            TaskField::ClientName => "client_name",
            TaskField::Notaire => "notaire",
            TaskField::CaseType => "case_type",
            TaskField::Notes => "notes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_type_accepts_display_labels() {
        let parsed: CaseType = serde_json::from_str("\"Notoriété Acquisitive\"").unwrap();
        assert_eq!(parsed, CaseType::NotorieteAcquisitive);
        let stored = serde_json::to_string(&CaseType::Pret).unwrap();
        assert_eq!(stored, "\"pret\"");
    }

    #[test]
    fn default_priority_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
