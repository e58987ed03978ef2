//! Planning and running JDK tool calls.
//!
//! A [`BuildPlan`] is produced by a [`PlanBuilder`] from a scanned project and
//! run phase by phase by the [`Executor`].

pub mod call;
pub mod events;
pub mod executor;
pub mod layout;
pub mod plan;
pub mod registry;
pub mod runner;
pub mod tweaks;

pub use call::{ModuleScope, ToolCall};
pub use events::{CallResult, Event, EventSink, JsonSink, RecordingSink, TracingSink};
pub use executor::{CallResults, ExecutionError, Executor};
pub use layout::WorkspaceLayout;
pub use plan::{BuildPlan, Phase, PhaseKind, PlanContext, PlanOptions, SpacePlanBuilder};
pub use registry::{BuilderRegistry, DefaultPlanBuilder, PlanBuilder};
pub use runner::{ProcessToolRunner, ToolOutput, ToolRunner};
pub use tweaks::Tweaks;
