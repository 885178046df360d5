use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured course outline produced by the layout generation call.
///
/// Field names follow what the model is asked to return (camelCase), with
/// aliases for the snake_case and short forms it sometimes answers with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseLayout {
    #[serde(default, alias = "course_title", alias = "title")]
    pub course_title: Option<String>,
    #[serde(default, alias = "courseSummary", alias = "course_summary")]
    pub summary: Option<String>,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(default, alias = "chapter_title", alias = "title")]
    pub chapter_title: Option<String>,
    #[serde(default, alias = "about", alias = "chapterSummary", alias = "chapter_summary")]
    pub summary: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl CourseLayout {
    pub fn chapter_titles(&self) -> Vec<String> {
        self.chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| {
                chapter
                    .chapter_title
                    .clone()
                    .unwrap_or_else(|| format!("Chapter {}", index + 1))
            })
            .collect()
    }
}

/// Returns the raw chapter list of a stored layout, or `None` when the layout
/// is absent or `chapters` is not a list.
pub fn chapters_of(layout: Option<&Value>) -> Option<&Vec<Value>> {
    layout?.get("chapters")?.as_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_short_chapter_titles() {
        let layout: CourseLayout = serde_json::from_value(json!({
            "courseTitle": "Rust",
            "chapters": [{"title": "Intro"}, {"chapterTitle": "Basics", "about": "x"}]
        }))
        .unwrap();

        assert_eq!(layout.chapter_titles(), vec!["Intro", "Basics"]);
        assert_eq!(layout.chapters[1].summary.as_deref(), Some("x"));
    }

    #[test]
    fn chapters_of_rejects_missing_or_non_list() {
        assert!(chapters_of(None).is_none());
        assert!(chapters_of(Some(&Value::Null)).is_none());
        assert!(chapters_of(Some(&json!({"chapters": "nope"}))).is_none());
        assert_eq!(
            chapters_of(Some(&json!({"chapters": [{"title": "Intro"}]})))
                .map(|c| c.len()),
            Some(1)
        );
    }
}
