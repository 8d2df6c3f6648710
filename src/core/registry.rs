//! Process-wide operator registry.
//!
//! Operator types register themselves once under their spec name. The
//! registry maps identity to a factory that can produce fresh instances and
//! expose the type's class-level [`OperatorSpec`] without instantiation.
//!
//! A plain [`OperatorRegistry`] value is injectable anywhere (tests build
//! private ones); the process-wide instance lives behind a `Lazy<RwLock>`
//! and is the only global mutable state in the crate. It is initialized
//! empty, written at registration time, and never torn down.
//!
//! Collision policy: inserting any second factory under an existing
//! identity is a configuration error at registration time, including
//! re-registering the same type. Registration is expected once per type at
//! startup, so a duplicate always indicates a wiring mistake.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::core::errors::{OpixError, OpixResult};
use crate::core::operator::{Operator, OperatorSpec};

/// A registered operator type: its class-level spec plus a constructor for
/// fresh instances.
#[derive(Clone)]
pub struct OperatorFactory {
    spec: Arc<OperatorSpec>,
    make: Arc<dyn Fn() -> Box<dyn Operator> + Send + Sync>,
}

impl OperatorFactory {
    /// Creates a factory from a type's spec and instance constructor.
    pub fn new(
        spec: Arc<OperatorSpec>,
        make: impl Fn() -> Box<dyn Operator> + Send + Sync + 'static,
    ) -> Self {
        Self {
            spec,
            make: Arc::new(make),
        }
    }

    /// Returns the registered type's class-level spec.
    pub fn spec(&self) -> &Arc<OperatorSpec> {
        &self.spec
    }

    /// Constructs a fresh, default-initialized instance.
    pub fn create(&self) -> Box<dyn Operator> {
        (self.make)()
    }
}

impl std::fmt::Debug for OperatorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorFactory")
            .field("identity", &self.spec.name())
            .finish_non_exhaustive()
    }
}

/// Directory of operator identities to factories.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    entries: BTreeMap<String, OperatorFactory>,
}

impl OperatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under its spec's name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the identity is already taken; the
    /// existing entry is never overwritten.
    pub fn register(&mut self, factory: OperatorFactory) -> OpixResult<()> {
        let identity = factory.spec().name().to_string();
        if self.entries.contains_key(&identity) {
            return Err(OpixError::config(format!(
                "operator identity '{identity}' is already registered"
            )));
        }
        debug!(identity = %identity, "operator registered");
        self.entries.insert(identity, factory);
        Ok(())
    }

    /// Looks up the factory registered under `identity`.
    pub fn get(&self, identity: &str) -> Option<&OperatorFactory> {
        self.entries.get(identity)
    }

    /// Enumerates all registered identities, in sorted order.
    pub fn identities(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Constructs a fresh instance of the operator registered under
    /// `identity`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no operator is registered under
    /// that identity.
    pub fn create(&self, identity: &str) -> OpixResult<Box<dyn Operator>> {
        self.get(identity)
            .map(OperatorFactory::create)
            .ok_or_else(|| {
                OpixError::config(format!("no operator registered under '{identity}'"))
            })
    }

    /// Returns the number of registered operator types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static GLOBAL: Lazy<RwLock<OperatorRegistry>> = Lazy::new(|| RwLock::new(OperatorRegistry::new()));

/// Registers `factory` in the process-wide registry.
///
/// # Errors
///
/// Returns a configuration error on any duplicate identity.
pub fn register(factory: OperatorFactory) -> OpixResult<()> {
    let mut registry = GLOBAL
        .write()
        .map_err(|_| OpixError::config("operator registry lock poisoned"))?;
    registry.register(factory)
}

/// Runs `f` with read access to the process-wide registry.
pub fn with_global<T>(f: impl FnOnce(&OperatorRegistry) -> T) -> OpixResult<T> {
    let registry = GLOBAL
        .read()
        .map_err(|_| OpixError::config("operator registry lock poisoned"))?;
    Ok(f(&registry))
}

/// Enumerates the identities in the process-wide registry.
pub fn global_identities() -> OpixResult<Vec<String>> {
    with_global(OperatorRegistry::identities)
}

/// Constructs a fresh instance from the process-wide registry.
pub fn create_global(identity: &str) -> OpixResult<Box<dyn Operator>> {
    with_global(|r| r.create(identity))?
}
