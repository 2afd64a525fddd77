//! Aspect weavers
//!
//! A weaver is a pluggable transformation bound to one marker name and
//! one declaration category. The shared contract: validate everything,
//! then mutate; fail with a specific `TargetError` that leaves the target
//! untouched; never panic across the orchestrator boundary; and be
//! idempotent, so a pass over an already-woven module changes nothing.

mod auto_wire;
mod hook_once;
mod method_wrap;
mod scene_bound;

pub use auto_wire::DeclarativeFieldWeaver;
pub use hook_once::IdempotentHookWeaver;
pub use method_wrap::MethodWrapWeaver;
pub use scene_bound::StructuralTypeWeaver;

use weft_config::WeaveConfig;
use weft_model::{CompiledModule, Marker, TypeId};

use crate::error::TargetError;
use crate::resolver::ModuleResolver;

/// Declaration category a weaver is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaverCategory {
    Type,
    Field,
    Method,
}

impl WeaverCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            WeaverCategory::Type => "type",
            WeaverCategory::Field => "field",
            WeaverCategory::Method => "method",
        }
    }
}

/// One declaration paired with a marker during the scan, addressed by
/// stable indices into the module tree. Weaving only ever appends members,
/// so indices recorded at scan time stay valid for the whole pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaveTarget {
    Type { ty: TypeId },
    Field { ty: TypeId, field: usize },
    Method { ty: TypeId, method: usize },
}

impl WeaveTarget {
    pub fn category(&self) -> WeaverCategory {
        match self {
            WeaveTarget::Type { .. } => WeaverCategory::Type,
            WeaveTarget::Field { .. } => WeaverCategory::Field,
            WeaveTarget::Method { .. } => WeaverCategory::Method,
        }
    }

    /// Full identity of the target for error reports and logs.
    pub fn describe(&self, module: &CompiledModule) -> String {
        match self {
            WeaveTarget::Type { ty } => module.full_name(*ty),
            WeaveTarget::Field { ty, field } => {
                let name = module
                    .type_decl(*ty)
                    .fields
                    .get(*field)
                    .map(|f| f.name.as_str())
                    .unwrap_or("?");
                format!("{}::{}", module.full_name(*ty), name)
            }
            WeaveTarget::Method { ty, method } => {
                let name = module
                    .type_decl(*ty)
                    .methods
                    .get(*method)
                    .map(|m| m.name.as_str())
                    .unwrap_or("?");
                format!("{}::{}", module.full_name(*ty), name)
            }
        }
    }
}

/// Everything a weaver may touch while applying to one target.
pub struct WeaveContext<'a> {
    pub module: &'a mut CompiledModule,
    pub resolver: &'a mut ModuleResolver,
    pub config: &'a WeaveConfig,
}

/// A marker-driven transformation.
pub trait Weaver: Send + Sync {
    /// The marker name this weaver is bound to.
    fn marker_name(&self) -> &'static str;

    /// The declaration category this weaver applies to.
    fn category(&self) -> WeaverCategory;

    /// Apply the transformation to one target. Must validate before
    /// mutating: an `Err` return implies the target is untouched.
    fn apply(
        &self,
        cx: &mut WeaveContext<'_>,
        target: &WeaveTarget,
        marker: &Marker,
    ) -> Result<(), TargetError>;
}

/// Shape-check helper shared by the weavers: a marker whose arguments are
/// all optional strings, capped at `max_args`.
fn str_args(marker: &Marker, max_args: usize) -> Result<Vec<&str>, TargetError> {
    if marker.args.len() > max_args {
        return Err(TargetError::MarkerShape(format!(
            "{} takes at most {} argument(s), got {}",
            marker.name,
            max_args,
            marker.args.len()
        )));
    }
    marker
        .args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            arg.as_str().ok_or_else(|| {
                TargetError::MarkerShape(format!(
                    "{} argument {} must be a string, got {}",
                    marker.name, i, arg
                ))
            })
        })
        .collect()
}
