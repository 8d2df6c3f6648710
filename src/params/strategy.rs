//! Strategy derivation: from parameter specs to property-test generators.
//!
//! Every [`ParameterSpec`] maps to a proptest strategy sampling uniformly
//! over its validity domain, with no bias toward the default value.
//! [`derive_strategy`] composes the per-parameter strategies of a whole
//! operator into a strategy of complete [`ParameterAssignment`]s, so a test
//! can fuzz any operator without hand-written per-parameter generators.
//!
//! The mapping matches exhaustively over `ParameterSpec`; adding a new spec
//! kind without extending it is a compile error, which is the fail-fast
//! guarantee for unsupported kinds.

use indexmap::IndexMap;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;

use crate::core::errors::{OpixError, OpixResult};
use crate::core::operator::ParameterSet;
use crate::params::spec::{ParamValue, ParameterSpec};

/// One complete sampled assignment of values to parameter names, in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAssignment {
    values: Vec<(String, ParamValue)>,
}

impl ParameterAssignment {
    /// Builds an assignment from name/value pairs.
    pub fn from_pairs(values: Vec<(String, ParamValue)>) -> Self {
        Self { values }
    }

    /// Returns the sampled value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterates name/value pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Installs every sampled value into `params`.
    ///
    /// # Errors
    ///
    /// Returns a parameter validation error if a name is not declared by
    /// the target operator's spec.
    pub fn apply_to(&self, params: &mut ParameterSet) -> OpixResult<()> {
        for (name, value) in &self.values {
            params.set(name, value.clone())?;
        }
        Ok(())
    }
}

/// Derives a strategy sampling uniformly over one spec's domain.
///
/// - Integer: uniform over `[lower, upper]` inclusive.
/// - Double: uniform over `[lower, upper]` inclusive.
/// - Enum: uniform choice over the declared choices.
/// - Boolean: uniform over `{true, false}`.
///
/// The returned strategy is stateless and restartable: repeated sampling is
/// never biased by prior draws.
pub fn derive_value_strategy(spec: &ParameterSpec) -> BoxedStrategy<ParamValue> {
    match spec {
        ParameterSpec::Integer { lower, upper, .. } => {
            (*lower..=*upper).prop_map(ParamValue::Integer).boxed()
        }
        ParameterSpec::Double { lower, upper, .. } => {
            if lower == upper {
                Just(ParamValue::Double(*lower)).boxed()
            } else {
                (*lower..=*upper).prop_map(ParamValue::Double).boxed()
            }
        }
        ParameterSpec::Enum { choices, .. } => proptest::sample::select(choices.clone())
            .prop_map(ParamValue::Enum)
            .boxed(),
        ParameterSpec::Boolean { .. } => any::<bool>().prop_map(ParamValue::Boolean).boxed(),
    }
}

/// Derives a strategy producing complete, schema-valid parameter
/// assignments for the given specs.
///
/// Each sample draws every parameter independently; a consumer can request
/// arbitrarily many assignments.
pub fn derive_strategy(
    specs: &IndexMap<String, ParameterSpec>,
) -> BoxedStrategy<ParameterAssignment> {
    let mut assignment: BoxedStrategy<Vec<(String, ParamValue)>> = Just(Vec::new()).boxed();
    for (name, spec) in specs {
        let name = name.clone();
        let value = derive_value_strategy(spec);
        assignment = (assignment, value)
            .prop_map(move |(mut pairs, value)| {
                pairs.push((name.clone(), value));
                pairs
            })
            .boxed();
    }
    assignment.prop_map(ParameterAssignment::from_pairs).boxed()
}

/// Samples `count` independent values from `strategy` outside a `proptest!`
/// block, for tooling and soak checks.
///
/// # Errors
///
/// Returns a configuration error if the strategy rejects generation, which
/// derived strategies never do for well-formed specs.
pub fn sample_values(
    strategy: &BoxedStrategy<ParamValue>,
    count: usize,
) -> OpixResult<Vec<ParamValue>> {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    let mut runner = TestRunner::deterministic();
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let tree = strategy
            .new_tree(&mut runner)
            .map_err(|e| OpixError::config(format!("strategy failed to generate: {e}")))?;
        out.push(tree.current());
    }
    Ok(out)
}
