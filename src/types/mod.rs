pub mod competitor;
pub mod gap;
pub mod plan;
pub mod query;
pub mod report;
