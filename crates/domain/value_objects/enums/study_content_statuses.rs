use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StudyContentStatus {
    #[default]
    Generating,
    Ready,
}

impl Display for StudyContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            StudyContentStatus::Generating => "Generating",
            StudyContentStatus::Ready => "Ready",
        };
        write!(f, "{}", status)
    }
}

impl StudyContentStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "Ready" => StudyContentStatus::Ready,
            _ => StudyContentStatus::Generating,
        }
    }
}
