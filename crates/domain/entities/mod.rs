pub mod chapter_notes;
pub mod job_steps;
pub mod jobs;
pub mod payment_records;
pub mod study_materials;
pub mod study_type_contents;
pub mod users;
pub mod youtube_recommendations;
