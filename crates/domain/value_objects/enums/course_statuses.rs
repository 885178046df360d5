use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CourseStatus {
    #[default]
    Generating,
    Ready,
    Error,
}

impl Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            CourseStatus::Generating => "Generating",
            CourseStatus::Ready => "Ready",
            CourseStatus::Error => "Error",
        };
        write!(f, "{}", status)
    }
}

impl CourseStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "Generating" => CourseStatus::Generating,
            "Ready" => CourseStatus::Ready,
            _ => CourseStatus::Error,
        }
    }

    /// Terminal statuses are never re-entered by the generation pipeline.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CourseStatus::Generating)
    }
}
