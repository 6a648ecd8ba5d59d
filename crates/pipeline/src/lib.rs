//! Stateful enhancement and planner workflows.
//!
//! - [`store::JobStore`]: job records and the selection behind one lock.
//! - [`processor::EnhanceProcessor`]: per-job processing and the
//!   single-flight sequential batch driver.
//! - [`export::ExportManager`]: download planning, compositing, archiving.
//! - [`planner::PlannerSession`]: the 12-slot grid with caption
//!   generation, persistence sync, and rasterization.

pub mod events;
pub mod export;
pub mod planner;
pub mod processor;
pub mod settings;
pub mod store;

pub use events::{for_each_event, JobEvent, JobEventBus};
pub use export::ExportManager;
pub use planner::{CaptionSuggestion, PlannerSession, PlannerView};
pub use processor::{BatchReport, BatchRun, DispatchedJob, EnhanceProcessor, JobOutcome};
pub use settings::SettingsHandle;
pub use store::{JobStore, StatusCounts};
