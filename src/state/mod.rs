//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the orchestrator's state machine, from bootstrap through
//!   the per-page export loop to termination

mod phase;

pub use phase::CrawlPhase;
