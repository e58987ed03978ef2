//! Plan builder registry.
//!
//! A project may register at most one custom plan builder. Without one, or
//! when `build.builder = "default"`, the built-in space plan builder is used.

use anyhow::{bail, Result};

use crate::builder::plan::{BuildPlan, PlanContext, SpacePlanBuilder};
use crate::core::errors::ModuleError;

/// Name of the built-in plan builder.
pub const DEFAULT_BUILDER: &str = "default";

/// Strategy turning a scanned project into a build plan.
pub trait PlanBuilder: Send + Sync {
    fn name(&self) -> &str;

    fn plan(&self, context: PlanContext<'_>) -> Result<BuildPlan, ModuleError>;
}

/// Plans main and test spaces with [`SpacePlanBuilder`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPlanBuilder;

impl PlanBuilder for DefaultPlanBuilder {
    fn name(&self) -> &str {
        DEFAULT_BUILDER
    }

    fn plan(&self, context: PlanContext<'_>) -> Result<BuildPlan, ModuleError> {
        SpacePlanBuilder::new(context).plan()
    }
}

pub struct BuilderRegistry {
    default: DefaultPlanBuilder,
    custom: Option<Box<dyn PlanBuilder>>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        BuilderRegistry {
            default: DefaultPlanBuilder,
            custom: None,
        }
    }

    /// Register the custom builder, replacing a previous one.
    pub fn register(&mut self, builder: Box<dyn PlanBuilder>) {
        if let Some(previous) = &self.custom {
            tracing::warn!(
                "plan builder `{}` replaces `{}`",
                builder.name(),
                previous.name()
            );
        }
        self.custom = Some(builder);
    }

    /// Names of all available builders.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(self.default.name())
            .chain(self.custom.as_deref().map(|b| b.name()))
            .collect()
    }

    /// Select a builder by name; `None` picks the custom builder if one is
    /// registered.
    pub fn get(&self, name: Option<&str>) -> Result<&dyn PlanBuilder> {
        match (name, self.custom.as_deref()) {
            (None, Some(custom)) => Ok(custom),
            (None, None) => Ok(&self.default),
            (Some(DEFAULT_BUILDER), _) => Ok(&self.default),
            (Some(name), Some(custom)) if custom.name() == name => Ok(custom),
            (Some(name), _) => bail!(
                "unknown plan builder `{}` (available: {})",
                name,
                self.names().join(", ")
            ),
        }
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
