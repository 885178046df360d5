pub mod courses;
pub mod credits;
pub mod marketplace;
pub mod payments;
pub mod study_content;
pub mod users;
