//! Pipeline entry points for takedown operations.
//!
//! - `accumulate`: paginated search accumulation per target
//! - `find`: full detection run across targets
//! - `merge`: cross-target store combination
//! - `dispatch`: takedown notification sends

pub mod accumulate;
pub mod dispatch;
pub mod find;
pub mod merge;

pub use accumulate::{
    AccumulateOutcome, Accumulation, AutoConfirm, ConfirmPolicy, DeclineReason, PageAccumulator,
};
pub use dispatch::{
    DispatchOutcome, EmailTransport, LogTransport, NotificationDispatcher, StatusFilter,
};
pub use find::{run_find, FindOutcome, TargetReport};
pub use merge::merge_stores;
