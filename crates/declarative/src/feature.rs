//! Feature trait for declarative environment management
//!
//! A Feature is one kind of thing a manifest section can describe
//! (a shell command pair, a symlink, an environment variable). Each
//! section names its implementation through the `formula` key.

use crate::context::FeatureContext;
use anyhow::Result;
use manifest::{FeatureSchema, Section};
use std::fmt;

/// Result of asking a feature to update in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePath {
    /// The feature converged from the old config to the new one
    Applied,
    /// The feature has no in-place update; the runner removes then installs
    Unsupported,
}

/// Core trait for feature implementations
///
/// Implementations are stateless: everything they need arrives through
/// the section config and the [`FeatureContext`]. Every contract returns
/// `anyhow::Result` so implementations can attach context freely; the
/// runner turns failures into [`FeatureError`](crate::FeatureError).
///
/// # Example
///
/// ```ignore
/// use declarative::{Feature, FeatureContext};
/// use manifest::{FeatureSchema, Section};
///
/// #[derive(Debug)]
/// struct Marker;
///
/// impl Feature for Marker {
///     fn formula(&self) -> &'static str {
///         "marker"
///     }
///
///     fn description(&self) -> &'static str {
///         "Write a marker file into the feature directory"
///     }
///
///     fn schema(&self) -> FeatureSchema {
///         FeatureSchema::new(&["text"], &[])
///     }
///
///     fn install(&self, ctx: &FeatureContext, config: &Section) -> anyhow::Result<()> {
///         let dir = ctx.ensure_work_dir()?;
///         std::fs::write(dir.join("marker"), config.get("text").unwrap_or_default())?;
///         Ok(())
///     }
///
///     fn remove(&self, ctx: &FeatureContext, _config: &Section) -> anyhow::Result<()> {
///         let _ = std::fs::remove_file(ctx.work_dir.join("marker"));
///         Ok(())
///     }
/// }
/// ```
pub trait Feature: Send + Sync + fmt::Debug {
    /// Type tag matched against a section's `formula` key
    fn formula(&self) -> &'static str;

    /// Human-readable description of what this feature manages
    fn description(&self) -> &'static str;

    /// Keys this feature accepts
    fn schema(&self) -> FeatureSchema;

    /// Feature-specific checks beyond the schema
    ///
    /// Must not touch the system. Returns one message per problem.
    fn validate(&self, _config: &Section) -> Vec<String> {
        Vec::new()
    }

    /// Bring the feature into existence with `config`
    fn install(&self, ctx: &FeatureContext, config: &Section) -> Result<()>;

    /// Converge from `old` to `new`
    ///
    /// The default reports [`UpdatePath::Unsupported`], which makes the
    /// runner call [`remove`](Self::remove) with `old` and then
    /// [`install`](Self::install) with `new`.
    fn update(&self, _ctx: &FeatureContext, _old: &Section, _new: &Section) -> Result<UpdatePath> {
        Ok(UpdatePath::Unsupported)
    }

    /// Undo what [`install`](Self::install) did for `config`
    fn remove(&self, ctx: &FeatureContext, config: &Section) -> Result<()>;

    /// Called when the environment is activated
    fn activate(&self, _ctx: &FeatureContext, _config: &Section) -> Result<()> {
        Ok(())
    }

    /// Called when the environment is deactivated
    fn deactivate(&self, _ctx: &FeatureContext, _config: &Section) -> Result<()> {
        Ok(())
    }

    /// Shell lines this feature contributes to the activation script
    fn hooks(&self, _ctx: &FeatureContext, _config: &Section) -> Vec<String> {
        Vec::new()
    }
}

/// A boxed feature for type-erased storage
pub type BoxedFeature = Box<dyn Feature>;
