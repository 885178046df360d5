use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StudyType {
    Flashcard,
    Quiz,
    #[serde(rename = "QA")]
    Qa,
}

impl StudyType {
    pub const ALL: [StudyType; 3] = [StudyType::Flashcard, StudyType::Quiz, StudyType::Qa];
}

impl Display for StudyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let study_type = match self {
            StudyType::Flashcard => "Flashcard",
            StudyType::Quiz => "Quiz",
            StudyType::Qa => "QA",
        };
        write!(f, "{}", study_type)
    }
}

impl TryFrom<&str> for StudyType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flashcard" | "flashcards" => Ok(StudyType::Flashcard),
            "quiz" => Ok(StudyType::Quiz),
            "qa" | "q&a" => Ok(StudyType::Qa),
            other => Err(format!("unsupported study type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitive_names() {
        assert_eq!(StudyType::try_from("Flashcard"), Ok(StudyType::Flashcard));
        assert_eq!(StudyType::try_from("flashcards"), Ok(StudyType::Flashcard));
        assert_eq!(StudyType::try_from(" QUIZ "), Ok(StudyType::Quiz));
        assert_eq!(StudyType::try_from("QA"), Ok(StudyType::Qa));
        assert!(StudyType::try_from("notes").is_err());
    }

    #[test]
    fn display_matches_stored_value() {
        for study_type in StudyType::ALL {
            assert_eq!(
                StudyType::try_from(study_type.to_string().as_str()),
                Ok(study_type)
            );
        }
    }
}
