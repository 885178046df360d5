pub mod generate_notes;
pub mod generate_study_type_content;
