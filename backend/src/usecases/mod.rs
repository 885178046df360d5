pub mod billing_webhooks;
pub mod courses;
pub mod entitlements;
pub mod errors;
pub mod marketplace;
pub mod study_type_contents;
