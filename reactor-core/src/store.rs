//! Store façade.
//!
//! A [`Store`] owns the root of a state tree and a collection of named
//! getters. It is the only way to create state handles and the only place
//! where getters are registered and read.

use std::fmt;
use std::rc::Rc;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::reactive::{
    Field, Getter, GetterFn, GetterId, GetterState, Runtime, Subscriber, Subscription, Target,
};
use crate::value::Value;

/// A reactive state container.
///
/// # Example
///
/// ```rust
/// use reactor_core::Store;
/// use serde_json::json;
///
/// let store = Store::new(json!({ "count": 1 })).unwrap();
/// store.define_getter("double", |state, _| {
///     Ok((state.get("count").as_f64().unwrap_or_default() * 2.0).into())
/// }).unwrap();
///
/// assert_eq!(store.value("double").unwrap().as_f64(), Some(2.0));
///
/// store.state().as_object().unwrap().set("count", 5).unwrap();
/// assert_eq!(store.value("double").unwrap().as_f64(), Some(10.0));
/// ```
pub struct Store {
    runtime: Rc<Runtime>,
}

impl Store {
    /// Wrap `initial` (an object or array, arbitrarily nested) as the root.
    pub fn new(initial: impl Into<Value>) -> Result<Self> {
        Self::with_config(initial, StoreConfig::default())
    }

    pub fn with_config(initial: impl Into<Value>, config: StoreConfig) -> Result<Self> {
        let runtime = Runtime::with_root(config, initial.into())?;
        Ok(Self { runtime })
    }

    /// Handle to the root of the state tree.
    pub fn state(&self) -> Value {
        self.runtime.root()
    }

    pub fn config(&self) -> &StoreConfig {
        self.runtime.config()
    }

    /// Register a getter. Names are unique: redefining one is an error.
    pub fn define_getter<F>(&self, name: impl Into<String>, compute: F) -> Result<()>
    where
        F: Fn(&Value, &Getters) -> Result<Value> + 'static,
    {
        self.runtime.define_getter(name.into(), Rc::new(compute))
    }

    /// Register several getters; either all of them or none.
    ///
    /// ```rust
    /// use reactor_core::{getter_fn, Store};
    /// use serde_json::json;
    ///
    /// let store = Store::new(json!({ "a": 1, "b": 2 })).unwrap();
    /// store.define_getters([
    ///     ("a", getter_fn(|state, _| Ok(state.get("a")))),
    ///     ("b", getter_fn(|state, _| Ok(state.get("b")))),
    /// ]).unwrap();
    /// ```
    pub fn define_getters<I, N>(&self, getters: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, GetterFn)>,
        N: Into<String>,
    {
        let batch = getters
            .into_iter()
            .map(|(name, compute)| (name.into(), compute))
            .collect();
        self.runtime.define_getters(batch)
    }

    /// Current value of a getter, recomputed first if invalid.
    pub fn value(&self, name: &str) -> Result<Value> {
        self.runtime.run_getter(name)
    }

    /// Alias of [`value`](Self::value).
    pub fn run_getter(&self, name: &str) -> Result<Value> {
        self.value(name)
    }

    /// Accessor over every getter of this store.
    pub fn getters(&self) -> Getters {
        Getters::new(Rc::clone(&self.runtime))
    }

    /// Diagnostic view of one getter.
    pub fn getter(&self, name: &str) -> Result<GetterRef> {
        let getter = self.runtime.lookup(name)?;
        Ok(GetterRef {
            runtime: Rc::clone(&self.runtime),
            getter,
        })
    }

    /// Call `listener` with the root state after every top-level write.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.runtime.subscribe(Subscriber::new(listener))
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.runtime.teardown();
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("config", self.runtime.config())
            .field("getters", &self.runtime.getter_names())
            .finish()
    }
}

/// Read access to the getters of a store, by name.
///
/// Getter functions receive one of these; reading another getter through it
/// makes the caller depend on that getter's value.
#[derive(Clone)]
pub struct Getters {
    runtime: Rc<Runtime>,
}

impl Getters {
    pub(crate) fn new(runtime: Rc<Runtime>) -> Self {
        Self { runtime }
    }

    /// Current value of the named getter.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.runtime.run_getter(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.runtime.lookup(name).is_ok()
    }

    /// Registered getter names, in definition order.
    pub fn names(&self) -> Vec<String> {
        self.runtime.getter_names()
    }
}

impl fmt::Debug for Getters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Diagnostic handle on a single getter.
pub struct GetterRef {
    runtime: Rc<Runtime>,
    getter: Rc<Getter>,
}

impl GetterRef {
    pub fn name(&self) -> &str {
        self.getter.name()
    }

    pub fn id(&self) -> GetterId {
        self.getter.id()
    }

    /// Dependency target for this getter's value slot.
    pub fn target(&self) -> Target {
        Target::Getter(self.getter.id())
    }

    pub fn state(&self) -> GetterState {
        self.getter.state()
    }

    pub fn is_valid(&self) -> bool {
        self.getter.is_valid()
    }

    /// Cached value without recomputing; fails with
    /// [`NotComputed`](crate::StoreError::NotComputed) while invalid.
    pub fn value(&self) -> Result<Value> {
        self.getter.value()
    }

    /// Fields recorded by the last computation.
    pub fn dependency_keys(&self) -> Vec<Field> {
        self.getter.registry().keys().cloned().collect()
    }

    pub fn depends_on(&self, target: Target, field: &Field) -> bool {
        self.getter.depends_on(target, field)
    }

    /// Drop the cached value and invalidate every getter that read it.
    pub fn invalidate(&self) {
        self.runtime.invalidate_getter(&self.getter);
    }
}

impl fmt::Debug for GetterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.getter, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use serde_json::json;

    #[test]
    fn duplicate_getter_is_rejected() {
        let store = Store::new(json!({})).unwrap();
        store.define_getter("g", |_, _| Ok(Value::Null)).unwrap();

        assert_eq!(
            store.define_getter("g", |_, _| Ok(Value::Null)),
            Err(StoreError::DuplicateName { name: "g".into() })
        );
    }

    #[test]
    fn run_getter_is_an_alias() {
        let store = Store::new(json!({ "n": 3 })).unwrap();
        store.define_getter("n", |state, _| Ok(state.get("n"))).unwrap();

        assert_eq!(store.run_getter("n"), store.value("n"));
    }

    #[test]
    fn getters_accessor_lists_names() {
        let store = Store::new(json!([])).unwrap();
        store.define_getter("b", |_, _| Ok(Value::Null)).unwrap();
        store.define_getter("a", |_, _| Ok(Value::Null)).unwrap();

        let getters = store.getters();
        assert_eq!(getters.names(), vec!["b", "a"]);
        assert!(getters.contains("a"));
        assert!(!getters.contains("c"));
    }

    #[test]
    fn getter_ref_reports_validity() {
        let store = Store::new(json!({ "n": 1 })).unwrap();
        store.define_getter("n", |state, _| Ok(state.get("n"))).unwrap();
        let getter = store.getter("n").unwrap();

        assert_eq!(getter.state(), GetterState::Invalid);
        assert!(matches!(getter.value(), Err(StoreError::NotComputed { .. })));

        store.value("n").unwrap();
        assert_eq!(getter.value(), Ok(Value::Number(1.0)));

        getter.invalidate();
        assert!(!getter.is_valid());
    }

    #[test]
    fn missing_getter_ref_is_not_found() {
        let store = Store::new(json!({})).unwrap();
        assert!(matches!(store.getter("x"), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn scalar_initial_state_is_rejected() {
        assert!(matches!(
            Store::new("just a string"),
            Err(StoreError::InvalidRoot { kind: "string" })
        ));
        assert!(matches!(
            Store::new(Value::frozen(json!({}))),
            Err(StoreError::InvalidRoot { kind: "frozen" })
        ));
    }
}
