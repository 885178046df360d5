pub mod domain;
pub mod generation;
pub mod infra;
pub mod observability;
pub mod payments;
pub mod workflow;
