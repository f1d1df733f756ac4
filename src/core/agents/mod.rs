//! Prompt-driven agents. Each one is a single model call plus reply parsing.

pub mod communicator;
pub mod planner;
pub mod reporter;
pub mod researcher;

pub use communicator::draft_emails;
pub use planner::create_plan;
pub use reporter::status_report;
pub use researcher::analyze_suppliers;
