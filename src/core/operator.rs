//! The operator contract: declaration, parameter storage, and execution.
//!
//! An operator type declares an [`OperatorSpec`] once: its identity, its
//! named parameter specs in declaration order, and its capability settings.
//! Each instance holds a [`ParameterSet`] of current values against that
//! shared spec. The [`Operator::run`] entry point enforces the contract
//! uniformly for every implementation: capability checks first, parameter
//! validation second, operator-level invariants third, transformation last.

use std::sync::Arc;

use image::DynamicImage;
use indexmap::IndexMap;
use tracing::debug;

use crate::core::capability::Capability;
use crate::core::context::PipelineContext;
use crate::core::errors::{OpixError, OpixResult};
use crate::params::spec::{ParamValue, ParameterSpec};

/// Class-level declaration of an operator type.
///
/// Built once per operator type, immutable thereafter, and shared by all
/// instances through an `Arc`.
#[derive(Debug)]
pub struct OperatorSpec {
    name: String,
    params: IndexMap<String, ParameterSpec>,
    capabilities: Vec<Capability>,
}

impl OperatorSpec {
    /// Starts building a spec for the operator type named `name`.
    pub fn builder(name: impl Into<String>) -> OperatorSpecBuilder {
        OperatorSpecBuilder {
            name: name.into(),
            params: IndexMap::new(),
            capabilities: Vec::new(),
            error: None,
        }
    }

    /// Returns the operator type's identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter specs, keyed by name in declaration order.
    pub fn parameter_specs(&self) -> &IndexMap<String, ParameterSpec> {
        &self.params
    }

    /// Returns the capability settings declared for this operator type.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }
}

/// Builder for [`OperatorSpec`].
///
/// Accepts fallible parameter constructors directly; the first construction
/// error is reported by [`OperatorSpecBuilder::build`], so operator
/// definitions stay declarative.
pub struct OperatorSpecBuilder {
    name: String,
    params: IndexMap<String, ParameterSpec>,
    capabilities: Vec<Capability>,
    error: Option<OpixError>,
}

impl OperatorSpecBuilder {
    /// Declares a parameter. Order of calls is the declaration order.
    pub fn parameter(mut self, name: impl Into<String>, spec: OpixResult<ParameterSpec>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let name = name.into();
        match spec {
            Ok(spec) => {
                if self.params.insert(name.clone(), spec).is_some() {
                    self.error = Some(OpixError::config(format!(
                        "operator '{}' declares parameter '{name}' twice",
                        self.name
                    )));
                }
            }
            Err(err) => {
                self.error = Some(OpixError::config(format!(
                    "operator '{}', parameter '{name}': {err}",
                    self.name
                )));
            }
        }
        self
    }

    /// Declares a capability setting.
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Finishes the declaration.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error recorded while declaring
    /// parameters. A failed build leaves no usable spec behind.
    pub fn build(self) -> OpixResult<Arc<OperatorSpec>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Arc::new(OperatorSpec {
            name: self.name,
            params: self.params,
            capabilities: self.capabilities,
        }))
    }
}

/// Per-instance parameter values held against a shared [`OperatorSpec`].
///
/// Values are default-initialized from the specs and may be mutated freely;
/// the spec itself is immutable. Validation checks every current value
/// against its spec's domain and names the first offender.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    spec: Arc<OperatorSpec>,
    values: IndexMap<String, ParamValue>,
}

impl ParameterSet {
    /// Creates a set with every parameter at its spec default.
    pub fn new(spec: Arc<OperatorSpec>) -> Self {
        let values = spec
            .parameter_specs()
            .iter()
            .map(|(name, p)| (name.clone(), p.default_value()))
            .collect();
        Self { spec, values }
    }

    /// Returns the shared operator spec this set belongs to.
    pub fn spec(&self) -> &Arc<OperatorSpec> {
        &self.spec
    }

    /// Returns the current value of `name`, if declared.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Sets `name` to `value`.
    ///
    /// The value is stored as-is; domain checking happens at validation
    /// time, so a test can deliberately install an out-of-domain value.
    ///
    /// # Errors
    ///
    /// Returns a parameter validation error if `name` is not declared by
    /// the spec.
    pub fn set(&mut self, name: &str, value: ParamValue) -> OpixResult<()> {
        if !self.spec.parameter_specs().contains_key(name) {
            return Err(OpixError::parameter(
                name,
                format!("not declared by operator '{}'", self.spec.name()),
            ));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Checks every current value against its spec's domain.
    ///
    /// # Errors
    ///
    /// Returns a parameter validation error naming the first parameter, in
    /// declaration order, whose value falls outside its domain.
    pub fn validate(&self) -> OpixResult<()> {
        for (name, spec) in self.spec.parameter_specs() {
            let value = self.values.get(name).ok_or_else(|| {
                OpixError::parameter(name.clone(), "no value assigned".to_string())
            })?;
            spec.validate(value)
                .map_err(|message| OpixError::parameter(name.clone(), message))?;
        }
        Ok(())
    }

    /// Typed accessor for an integer parameter.
    pub fn integer(&self, name: &str) -> OpixResult<i64> {
        self.get(name)
            .and_then(ParamValue::as_integer)
            .ok_or_else(|| OpixError::parameter(name, "expected an integer value"))
    }

    /// Typed accessor for a double parameter.
    pub fn double(&self, name: &str) -> OpixResult<f64> {
        self.get(name)
            .and_then(ParamValue::as_double)
            .ok_or_else(|| OpixError::parameter(name, "expected a double value"))
    }

    /// Typed accessor for an enum parameter.
    pub fn choice(&self, name: &str) -> OpixResult<&str> {
        self.get(name)
            .and_then(ParamValue::as_enum)
            .ok_or_else(|| OpixError::parameter(name, "expected an enum value"))
    }

    /// Typed accessor for a boolean parameter.
    pub fn boolean(&self, name: &str) -> OpixResult<bool> {
        self.get(name)
            .and_then(ParamValue::as_boolean)
            .ok_or_else(|| OpixError::parameter(name, "expected a boolean value"))
    }
}

/// A single parameterized image transformation step.
///
/// Implementations declare their parameters and capabilities through an
/// [`OperatorSpec`] and put the transformation itself in
/// [`Operator::apply`]. Callers go through [`Operator::run`], which performs
/// the precondition and validation phases before the transformation and
/// guarantees their ordering.
pub trait Operator: Send + Sync {
    /// Returns the class-level declaration: stable across calls, parameter
    /// keys in declaration order.
    fn spec(&self) -> &Arc<OperatorSpec>;

    /// Returns the instance's current parameter values.
    fn params(&self) -> &ParameterSet;

    /// Returns the instance's parameter values for mutation.
    fn params_mut(&mut self) -> &mut ParameterSet;

    /// Checks operator-level invariants that go beyond per-parameter
    /// domains (cross-parameter constraints, parity requirements).
    ///
    /// Default: no extra invariants.
    fn check_invariants(&self) -> OpixResult<()> {
        Ok(())
    }

    /// The raw transformation. Called only after capabilities, parameter
    /// domains, and operator invariants have all been checked.
    fn apply(&self, image: &DynamicImage, ctx: &mut PipelineContext)
        -> OpixResult<DynamicImage>;

    /// Executes the operator under the full contract.
    ///
    /// Ordering is fixed and observable: capability checks, then parameter
    /// domain validation, then operator invariants, then the
    /// transformation. Failures in the first three phases occur before any
    /// context mutation.
    fn run(&self, image: &DynamicImage, ctx: &mut PipelineContext) -> OpixResult<DynamicImage> {
        let name = self.spec().name().to_string();
        let _span = tracing::debug_span!("operator_run", operator = %name).entered();

        for capability in self.spec().capabilities() {
            capability.check(image)?;
        }
        self.params().validate()?;
        self.check_invariants()?;

        debug!(operator = %name, "validation passed, applying transformation");
        self.apply(image, ctx)
    }
}

impl std::fmt::Debug for dyn Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.spec().name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ContextValue;
    use image::{GrayImage, RgbImage};
    use once_cell::sync::Lazy;

    /// Minimal gray-only operator that records whether `apply` ran.
    struct Probe {
        params: ParameterSet,
    }

    static PROBE_SPEC: Lazy<Arc<OperatorSpec>> = Lazy::new(|| {
        OperatorSpec::builder("Probe")
            .parameter("level", ParameterSpec::integer(0, 10, 5))
            .capability(Capability::grayscale_only())
            .build()
            .expect("probe spec is well-formed")
    });

    impl Probe {
        fn new() -> Self {
            Self {
                params: ParameterSet::new(PROBE_SPEC.clone()),
            }
        }
    }

    impl Operator for Probe {
        fn spec(&self) -> &Arc<OperatorSpec> {
            self.params.spec()
        }

        fn params(&self) -> &ParameterSet {
            &self.params
        }

        fn params_mut(&mut self) -> &mut ParameterSet {
            &mut self.params
        }

        fn apply(
            &self,
            image: &DynamicImage,
            ctx: &mut PipelineContext,
        ) -> OpixResult<DynamicImage> {
            ctx.add_info("ran", ContextValue::Bool(true));
            Ok(image.clone())
        }
    }

    fn gray() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::new(4, 4))
    }

    #[test]
    fn builder_rejects_duplicate_parameter_names() {
        let err = OperatorSpec::builder("Dup")
            .parameter("x", ParameterSpec::integer(0, 1, 0))
            .parameter("x", ParameterSpec::integer(0, 1, 0))
            .build()
            .unwrap_err();
        assert!(matches!(err, OpixError::Config { .. }));
    }

    #[test]
    fn builder_propagates_spec_construction_errors() {
        let err = OperatorSpec::builder("Bad")
            .parameter("x", ParameterSpec::integer(5, 0, 0))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("parameter 'x'"));
    }

    #[test]
    fn values_default_initialize_from_specs() {
        let probe = Probe::new();
        assert_eq!(probe.params().integer("level").unwrap(), 5);
        assert!(probe.params().validate().is_ok());
    }

    #[test]
    fn unknown_parameter_name_is_rejected_on_set() {
        let mut probe = Probe::new();
        let err = probe
            .params_mut()
            .set("missing", ParamValue::Integer(1))
            .unwrap_err();
        assert!(matches!(err, OpixError::ParameterValidation { .. }));
    }

    #[test]
    fn precondition_failure_happens_before_context_mutation() {
        let probe = Probe::new();
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mut ctx = PipelineContext::new(rgb.clone());
        let err = probe.run(&rgb, &mut ctx).unwrap_err();
        assert!(matches!(err, OpixError::Precondition { .. }));
        assert_eq!(ctx.entries().count(), 0);
    }

    #[test]
    fn out_of_domain_value_fails_before_apply() {
        let mut probe = Probe::new();
        probe
            .params_mut()
            .set("level", ParamValue::Integer(99))
            .unwrap();
        let mut ctx = PipelineContext::new(gray());
        let err = probe.run(&gray(), &mut ctx).unwrap_err();
        match err {
            OpixError::ParameterValidation { parameter, .. } => assert_eq!(parameter, "level"),
            other => panic!("expected ParameterValidation, got {other:?}"),
        }
        assert_eq!(ctx.entries().count(), 0);
    }

    #[test]
    fn run_applies_after_validation_passes() {
        let probe = Probe::new();
        let mut ctx = PipelineContext::new(gray());
        let out = probe.run(&gray(), &mut ctx).unwrap();
        assert_eq!(out.color().channel_count(), 1);
        assert_eq!(ctx.info("ran"), Some(&ContextValue::Bool(true)));
    }
}
