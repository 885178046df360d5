pub mod chapter_notes;
pub mod courses;
pub mod job;
pub mod marketplace;
pub mod payment_records;
pub mod study_type_contents;
pub mod users;
