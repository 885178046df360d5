use serde_json::Value;

use crate::domain::value_objects::enums::study_types::StudyType;

pub fn course_layout_prompt(topic: &str, course_type: &str, difficulty_level: &str) -> String {
    format!(
        "Generate a study material for {topic} for {course_type} and level of difficulty will be \
         {difficulty_level} with summary of course, list of chapters along with summary for each \
         chapter, topic list in each chapter. Respond in JSON with the shape \
         {{\"courseTitle\": string, \"summary\": string, \"chapters\": [{{\"chapterTitle\": string, \
         \"summary\": string, \"topics\": [string]}}]}}."
    )
}

/// `chapter` is embedded verbatim as JSON.
pub fn chapter_notes_prompt(chapter: &Value) -> String {
    format!(
        "Generate exam material detail content for each chapter. Make sure to include all topic \
         points in the content and give the content in HTML format (do not add html, head, body \
         or title tags). The chapter: {chapter}"
    )
}

pub fn study_content_prompt(study_type: StudyType, topic: &str, chapter_titles: &[String]) -> String {
    let chapters = chapter_titles.join(", ");

    match study_type {
        StudyType::Flashcard => format!(
            "Generate flashcards on the topic {topic} covering the chapters: {chapters}. Return a \
             JSON array of at most 15 items, each {{\"front\": string, \"back\": string}}."
        ),
        StudyType::Quiz => format!(
            "Generate a quiz on the topic {topic} covering the chapters: {chapters}. Return a JSON \
             array of questions, each {{\"question\": string, \"options\": [string], \
             \"correctAnswer\": number}} where correctAnswer is the zero-based index of the right \
             option."
        ),
        StudyType::Qa => format!(
            "Generate detailed questions and answers on the topic {topic} covering the chapters: \
             {chapters}. Return a JSON array of items, each {{\"question\": string, \"answer\": \
             string}}."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn notes_prompt_embeds_chapter_json() {
        let prompt = chapter_notes_prompt(&json!({"chapterTitle": "Ownership"}));
        assert!(prompt.contains(r#"{"chapterTitle":"Ownership"}"#));
    }

    #[test]
    fn study_prompt_embeds_topic_and_chapters() {
        let prompt = study_content_prompt(
            StudyType::Quiz,
            "Rust",
            &["Intro".to_string(), "Basics".to_string()],
        );
        assert!(prompt.contains("Rust"));
        assert!(prompt.contains("Intro, Basics"));
        assert!(prompt.contains("correctAnswer"));
    }
}
