//! Conditional settings patch: export, edit one field, reload.

use tempfile::Builder;

use crate::{
    error::{OperandError, Result, SettingsStage},
    host::{Analysis, OperandArgs},
};

/// Selects one of the four operand arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSlot {
    Hx,
    Hy,
    Px,
    Py,
}

impl ArgSlot {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hx" | "1" => Some(Self::Hx),
            "hy" | "2" => Some(Self::Hy),
            "px" | "3" => Some(Self::Px),
            "py" | "4" => Some(Self::Py),
            _ => None,
        }
    }

    pub fn pick(self, args: &OperandArgs) -> f64 {
        match self {
            ArgSlot::Hx => args.hx,
            ArgSlot::Hy => args.hy,
            ArgSlot::Px => args.px,
            ArgSlot::Py => args.py,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPatch {
    pub key: String,
    pub value: String,
}

impl FieldPatch {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// Shortest decimal text that reads back as the same `f64`: `2.5`, `3`, `-0.125`.
pub fn canonical_decimal(value: f64) -> String {
    value.to_string()
}

pub const DEFAULT_PATCH_KEY: &str = "FOO_SURFACE";

/// Which field to patch and which arguments drive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPlan {
    pub key: String,
    /// The patch is applied only when this argument is strictly positive.
    pub guard: ArgSlot,
    pub value: ArgSlot,
}

impl Default for PatchPlan {
    fn default() -> Self {
        Self {
            key: DEFAULT_PATCH_KEY.to_string(),
            guard: ArgSlot::Hx,
            value: ArgSlot::Hx,
        }
    }
}

impl PatchPlan {
    /// The patch to apply for these arguments, or `None` when the guard is not
    /// positive (NaN included).
    pub fn resolve(&self, args: &OperandArgs) -> Option<FieldPatch> {
        if self.guard.pick(args) > 0.0 {
            Some(FieldPatch::new(
                self.key.clone(),
                canonical_decimal(self.value.pick(args)),
            ))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Skipped,
    Applied,
    /// The host did not recognise the key; settings were reloaded unchanged.
    UnknownKey,
}

/// Round-trip the analysis settings through a private temp file and set one
/// field. The temp file is removed on every path out of this function.
pub fn apply_patch<A: Analysis>(analysis: &mut A, patch: &FieldPatch) -> Result<PatchOutcome> {
    let blob = Builder::new()
        .prefix("operand-settings-")
        .suffix(".cfg")
        .tempfile()
        .map_err(|e| OperandError::Settings {
            stage: SettingsStage::Export,
            path: std::env::temp_dir(),
            message: e.to_string(),
        })?
        // Close our handle so the host can rewrite the file; deletion still
        // happens when `blob` drops.
        .into_temp_path();
    tracing::debug!(path = %blob.display(), "exporting analysis settings");

    analysis.save_settings(&blob)?;
    let known = analysis.modify_settings(&blob, &patch.key, &patch.value)?;
    analysis.load_settings(&blob)?;

    if known {
        tracing::info!(key = %patch.key, value = %patch.value, "patched analysis settings");
        Ok(PatchOutcome::Applied)
    } else {
        tracing::warn!(key = %patch.key, "host does not recognise settings key, left unchanged");
        Ok(PatchOutcome::UnknownKey)
    }
}

pub fn apply_conditional_patch<A: Analysis>(
    analysis: &mut A,
    plan: &PatchPlan,
    args: &OperandArgs,
) -> Result<PatchOutcome> {
    match plan.resolve(args) {
        Some(patch) => apply_patch(analysis, &patch),
        None => {
            tracing::debug!(guard = ?plan.guard, "guard not positive, settings untouched");
            Ok(PatchOutcome::Skipped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(hx: f64) -> OperandArgs {
        OperandArgs { hx, hy: -1.0, px: 0.5, py: 0.0 }
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(canonical_decimal(2.5), "2.5");
        assert_eq!(canonical_decimal(3.0), "3");
        assert_eq!(canonical_decimal(-0.125), "-0.125");
        assert_eq!(canonical_decimal(0.1), "0.1");
    }

    #[test]
    fn guard_must_be_strictly_positive() {
        let plan = PatchPlan::default();
        assert!(plan.resolve(&args(0.0)).is_none());
        assert!(plan.resolve(&args(-0.0)).is_none());
        assert!(plan.resolve(&args(-3.0)).is_none());
        assert!(plan.resolve(&args(f64::NAN)).is_none());
        assert_eq!(
            plan.resolve(&args(2.5)),
            Some(FieldPatch::new("FOO_SURFACE", "2.5"))
        );
    }

    #[test]
    fn guard_and_value_can_differ() {
        let plan = PatchPlan {
            key: "WAVE".into(),
            guard: ArgSlot::Px,
            value: ArgSlot::Hy,
        };
        assert_eq!(plan.resolve(&args(0.0)), Some(FieldPatch::new("WAVE", "-1")));
    }

    #[test]
    fn slot_names() {
        assert_eq!(ArgSlot::parse("HX"), Some(ArgSlot::Hx));
        assert_eq!(ArgSlot::parse("4"), Some(ArgSlot::Py));
        assert_eq!(ArgSlot::parse("pz"), None);
    }
}
