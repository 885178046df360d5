pub mod course_statuses;
pub mod job_statuses;
pub mod marketplace_sorts;
pub mod study_content_statuses;
pub mod study_types;
