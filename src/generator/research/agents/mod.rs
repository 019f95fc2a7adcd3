pub mod competitor_extractor;
pub mod gap_analyzer;
pub mod planner;
pub mod response_curator;
pub mod web_searcher;
