mod engine;
mod types;

pub use engine::{MAX_HORIZON_YEARS, project, project_from, round2, summarize};
pub use types::{
    InputParameters, ProjectionError, ProjectionSummary, ScheduledExpense, YearlySnapshot,
};
