use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::enums::study_types::StudyType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "RawQuizQuestion")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_answer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuizQuestion {
    question: String,
    options: Vec<String>,
    #[serde(alias = "correct_answer", alias = "answer")]
    correct_answer: AnswerRef,
}

// Models answer with either the option index or the option text.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerRef {
    Index(usize),
    Text(String),
}

impl TryFrom<RawQuizQuestion> for QuizQuestion {
    type Error = String;

    fn try_from(raw: RawQuizQuestion) -> Result<Self, Self::Error> {
        if raw.options.is_empty() {
            return Err(format!("quiz question has no options: {}", raw.question));
        }

        let correct_answer = match raw.correct_answer {
            AnswerRef::Index(index) => index,
            AnswerRef::Text(text) => raw
                .options
                .iter()
                .position(|option| option.trim() == text.trim())
                .ok_or_else(|| format!("correct answer is not one of the options: {text}"))?,
        };

        if correct_answer >= raw.options.len() {
            return Err(format!(
                "correct answer index {correct_answer} out of range for {} options",
                raw.options.len()
            ));
        }

        Ok(QuizQuestion {
            question: raw.question,
            options: raw.options,
            correct_answer,
        })
    }
}

/// Parsed study-type content; one variant per [`StudyType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StudyContent {
    Flashcards(Vec<Flashcard>),
    Quiz(Vec<QuizQuestion>),
    Qa(Vec<QaPair>),
}

impl StudyContent {
    pub fn study_type(&self) -> StudyType {
        match self {
            StudyContent::Flashcards(_) => StudyType::Flashcard,
            StudyContent::Quiz(_) => StudyType::Quiz,
            StudyContent::Qa(_) => StudyType::Qa,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StudyContent::Flashcards(items) => items.len(),
            StudyContent::Quiz(items) => items.len(),
            StudyContent::Qa(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
