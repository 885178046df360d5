//! Content generators over a [`GenerativeModel`].
//!
//! Notes are returned as opaque HTML. Layouts and study-type content are
//! parsed into typed values; a model answer that does not parse is a
//! [`GenerationError::Fatal`] and is never replaced with empty content.

pub mod prompts;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tracing::warn;

use crate::domain::{
    repositories::generative_model::GenerativeModel,
    value_objects::{
        course_layout::CourseLayout,
        enums::study_types::StudyType,
        generation::{GenerationError, ResponseFormat},
        study_content::StudyContent,
    },
};

pub type SharedModel = Arc<dyn GenerativeModel + Send + Sync>;

#[derive(Clone)]
pub struct ContentGenerators {
    notes_model: SharedModel,
    layout_model: SharedModel,
    study_models: HashMap<StudyType, SharedModel>,
}

impl ContentGenerators {
    /// One model behind every generator.
    pub fn uniform(model: SharedModel) -> Self {
        let study_models = StudyType::ALL
            .iter()
            .map(|study_type| (*study_type, Arc::clone(&model)))
            .collect();

        Self {
            notes_model: Arc::clone(&model),
            layout_model: model,
            study_models,
        }
    }

    pub fn with_notes_model(mut self, model: SharedModel) -> Self {
        self.notes_model = model;
        self
    }

    pub fn with_layout_model(mut self, model: SharedModel) -> Self {
        self.layout_model = model;
        self
    }

    pub fn with_study_model(mut self, study_type: StudyType, model: SharedModel) -> Self {
        self.study_models.insert(study_type, model);
        self
    }

    pub async fn generate_notes(&self, prompt: &str) -> Result<String, GenerationError> {
        self.notes_model.generate(prompt, ResponseFormat::Text).await
    }

    pub async fn generate_layout(&self, prompt: &str) -> Result<CourseLayout, GenerationError> {
        let raw = self.layout_model.generate(prompt, ResponseFormat::Json).await?;
        parse_course_layout(&raw)
    }

    pub async fn generate_study_content(
        &self,
        study_type: StudyType,
        prompt: &str,
    ) -> Result<StudyContent, GenerationError> {
        let model = self.study_models.get(&study_type).ok_or_else(|| {
            GenerationError::Fatal(format!("no generator registered for {study_type}"))
        })?;

        let raw = model.generate(prompt, ResponseFormat::Json).await?;
        parse_study_content(study_type, &raw)
    }
}

pub fn parse_course_layout(raw: &str) -> Result<CourseLayout, GenerationError> {
    let layout: CourseLayout = serde_json::from_str(strip_code_fence(raw)).map_err(|err| {
        warn!(error = %err, "generation: course layout did not parse");
        GenerationError::Fatal(format!("course layout is not valid JSON: {err}"))
    })?;

    if layout.chapters.is_empty() {
        return Err(GenerationError::Fatal(
            "course layout has no chapters".to_string(),
        ));
    }

    Ok(layout)
}

pub fn parse_study_content(study_type: StudyType, raw: &str) -> Result<StudyContent, GenerationError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).map_err(|err| {
        GenerationError::Fatal(format!("{study_type} content is not valid JSON: {err}"))
    })?;
    let items = unwrap_item_list(value);

    let content = match study_type {
        StudyType::Flashcard => StudyContent::Flashcards(parse_items(study_type, items)?),
        StudyType::Quiz => StudyContent::Quiz(parse_items(study_type, items)?),
        StudyType::Qa => StudyContent::Qa(parse_items(study_type, items)?),
    };

    if content.is_empty() {
        return Err(GenerationError::Fatal(format!(
            "{study_type} content has no items"
        )));
    }

    Ok(content)
}

fn parse_items<T: DeserializeOwned>(study_type: StudyType, items: Value) -> Result<Vec<T>, GenerationError> {
    serde_json::from_value(items).map_err(|err| {
        warn!(study_type = %study_type, error = %err, "generation: study content did not parse");
        GenerationError::Fatal(format!("{study_type} content has the wrong shape: {err}"))
    })
}

/// Models sometimes answer `{"flashcards": [...]}` instead of the bare list.
fn unwrap_item_list(value: Value) -> Value {
    if let Value::Object(map) = &value {
        let mut arrays = map.values().filter(|v| v.is_array());
        if let (Some(list), None) = (arrays.next(), arrays.next()) {
            return list.clone();
        }
    }
    value
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::generative_model::MockGenerativeModel;

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  [1] "), "[1]");
    }

    #[test]
    fn flashcards_parse_from_wrapper_object() {
        let content = parse_study_content(
            StudyType::Flashcard,
            r#"{"flashcards": [{"front": "Borrow?", "back": "A reference"}]}"#,
        )
        .unwrap();

        assert_eq!(content.study_type(), StudyType::Flashcard);
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn malformed_content_is_fatal_not_empty() {
        let err = parse_study_content(StudyType::Qa, "not json").unwrap_err();
        assert!(!err.is_retryable());

        let err = parse_study_content(StudyType::Qa, r#"[{"front": "x", "back": "y"}]"#).unwrap_err();
        assert!(!err.is_retryable());

        let err = parse_study_content(StudyType::Quiz, "[]").unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn layout_without_chapters_is_fatal() {
        let err = parse_course_layout(r#"{"courseTitle": "Rust", "chapters": []}"#).unwrap_err();
        assert_eq!(err, GenerationError::Fatal("course layout has no chapters".to_string()));
    }

    #[tokio::test]
    async fn quiz_is_dispatched_to_quiz_model() {
        let mut default_model = MockGenerativeModel::new();
        default_model.expect_generate().never();

        let mut quiz_model = MockGenerativeModel::new();
        quiz_model
            .expect_generate()
            .withf(|_, format| *format == ResponseFormat::Json)
            .times(1)
            .returning(|_, _| {
                Ok(r#"[{"question": "1+1?", "options": ["1", "2"], "correctAnswer": 1}]"#.to_string())
            });

        let generators = ContentGenerators::uniform(Arc::new(default_model))
            .with_study_model(StudyType::Quiz, Arc::new(quiz_model));

        let content = generators
            .generate_study_content(StudyType::Quiz, "quiz please")
            .await
            .unwrap();

        assert_eq!(content.study_type(), StudyType::Quiz);
    }

    #[tokio::test]
    async fn transient_model_errors_pass_through() {
        let mut model = MockGenerativeModel::new();
        model
            .expect_generate()
            .returning(|_, _| Err(GenerationError::Transient("429".to_string())));

        let generators = ContentGenerators::uniform(Arc::new(model));
        let err = generators.generate_notes("notes").await.unwrap_err();

        assert!(err.is_retryable());
    }
}
