//! # Declarative
//!
//! Feature execution for declarative environments.
//!
//! This crate turns a manifest diff into feature calls: it defines the
//! contract every feature type implements, maps diff states onto actions,
//! and runs those actions in declaration order while recording outcomes.
//!
//! ## Core Concepts
//!
//! - **Feature**: one kind of manageable thing, selected by a section's `formula`
//! - **FeatureRegistry**: formula tag to implementation; also the manifest's schema provider
//! - **ExecutionPlan**: ordered install / update / remove / skip steps built from a diff
//! - **Executor**: runs steps sequentially under an error policy and a cancellation token
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     CancellationToken, ErrorPolicy, ExecutionPlan, ExecutionScope, FeatureRegistry,
//!     NoProgress, PlanOptions, execute,
//! };
//! use manifest::Manifest;
//!
//! let registry = FeatureRegistry::new().with(MyFeature);
//! let installed = Manifest::parse(&old_text)?;
//! let target = Manifest::parse(&new_text)?;
//!
//! let plan = ExecutionPlan::from_diff(installed.diff(&target), &PlanOptions::default());
//! let scope = ExecutionScope::new("tools", "/home/me/.sprinter/tools/features");
//! let report = execute(
//!     &plan,
//!     &registry,
//!     &scope,
//!     ErrorPolicy::Abort,
//!     &CancellationToken::new(),
//!     &mut NoProgress,
//! );
//! ```
//!
//! ## Provider Traits
//!
//! - [`Feature`]: the install / update / remove contract
//! - [`ProgressCallback`]: receives progress updates
//!
//! The crate has no terminal or filesystem policy of its own; callers
//! decide where feature directories live and how progress is shown.

pub mod cancel;
pub mod context;
pub mod error;
pub mod executor;
pub mod feature;
pub mod planner;
pub mod registry;
pub mod types;

// Re-export main types at crate root
pub use cancel::CancellationToken;
pub use context::{ExecutionScope, FeatureContext, NoProgress, ProgressCallback};
pub use error::FeatureError;
pub use executor::execute;
pub use feature::{BoxedFeature, Feature, UpdatePath};
pub use planner::{ExecutionPlan, PlanOptions, PlannedStep};
pub use registry::FeatureRegistry;
pub use types::{
    Action, ErrorPolicy, FeatureOutcome, FeatureStatus, Halt, RunReport, RunSummary,
};
