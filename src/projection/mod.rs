pub mod projector;
pub mod summary;
pub mod kpi;

pub use projector::TimeBucketProjector;
pub use summary::{PeriodSummary, RankedName, Selection, StatusCounts, SummaryAggregator, DEFAULT_TOP_N};
pub use kpi::KpiSnapshot;
