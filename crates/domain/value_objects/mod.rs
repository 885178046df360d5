pub mod billing;
pub mod course_layout;
pub mod courses;
pub mod entitlements;
pub mod enums;
pub mod generation;
pub mod jobs;
pub mod marketplace;
pub mod study_content;
pub mod users;
