//! Integration Tests for the Reactive Store
//!
//! These tests verify that state handles, getters and invalidation work
//! together correctly.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use reactor_core::{getter_fn, Field, Store, StoreConfig, StoreError, Value};
use serde_json::json;

fn counter() -> (Arc<AtomicI32>, Arc<AtomicI32>) {
    let count = Arc::new(AtomicI32::new(0));
    (count.clone(), count)
}

fn sum_values(state: &Value) -> f64 {
    state
        .get("entities")
        .as_array()
        .map(|entities| {
            entities
                .iter()
                .filter_map(|entity| entity.get("value").as_f64())
                .sum()
        })
        .unwrap_or_default()
}

/// Reading twice computes once; a write to the dependency recomputes once.
#[test]
fn getter_is_memoized_until_its_field_changes() {
    let store = Store::new(json!({ "count": 1 })).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    let log_clone = log.clone();

    store
        .define_getter("getCount", move |state, _| {
            let count = state.get("count");
            log_clone
                .borrow_mut()
                .push(format!("ask for getCount {}", count.as_i64().unwrap_or_default()));
            Ok(count)
        })
        .unwrap();

    assert!(log.borrow().is_empty());
    assert_eq!(store.value("getCount"), Ok(Value::Number(1.0)));
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(store.value("getCount"), Ok(Value::Number(1.0)));
    assert_eq!(log.borrow().len(), 1);

    store.state().as_object().unwrap().set("count", 2).unwrap();

    assert_eq!(store.value("getCount"), Ok(Value::Number(2.0)));
    assert_eq!(
        *log.borrow(),
        vec!["ask for getCount 1", "ask for getCount 2"]
    );
}

/// Two-level state read through nested handles.
#[test]
fn nested_field_is_tracked() {
    let store = Store::new(json!({ "entity": { "name": "alpha" } })).unwrap();
    store
        .define_getter("getName", |state, _| Ok(state.get("entity").get("name")))
        .unwrap();

    assert_eq!(store.run_getter("getName"), Ok(Value::from("alpha")));

    let entity = store.state().get("entity");
    entity.as_object().unwrap().set("name", "beta").unwrap();

    assert_eq!(store.run_getter("getName"), Ok(Value::from("beta")));
}

/// A getter reading `entities.length` records both keys.
#[test]
fn length_getter_records_field_and_length() {
    let store = Store::new(json!({ "entities": [] })).unwrap();
    store
        .define_getter("getCount", |state, _| Ok(state.get("entities").len().into()))
        .unwrap();

    assert_eq!(store.value("getCount"), Ok(Value::Number(0.0)));

    let keys = store.getter("getCount").unwrap().dependency_keys();
    assert!(keys.contains(&Field::named("entities")));
    assert!(keys.contains(&Field::Length));
}

/// Sum over an array recomputes on each push, and only when read.
#[test]
fn sum_follows_pushes() {
    let store = Store::new(json!({ "entities": [] })).unwrap();
    let (calls, calls_clone) = counter();
    store
        .define_getter("getSumValue", move |state, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(sum_values(state).into())
        })
        .unwrap();

    let entities = store.state().get("entities");
    let entities = entities.as_array().unwrap();

    assert_eq!(store.value("getSumValue"), Ok(Value::Number(0.0)));

    entities.set(0, json!({ "value": 10 })).unwrap();
    assert_eq!(entities.get(0).get("value"), Value::Number(10.0));
    assert_eq!(store.value("getSumValue"), Ok(Value::Number(10.0)));

    entities.push(json!({ "value": 6 })).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.value("getSumValue"), Ok(Value::Number(16.0)));

    entities.push(json!({ "value": 4 })).unwrap();
    assert_eq!(store.value("getSumValue"), Ok(Value::Number(20.0)));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

/// Same sum, with every entity appended through `push`.
#[test]
fn sum_follows_push_only() {
    let store = Store::new(json!({ "entities": [] })).unwrap();
    let (calls, calls_clone) = counter();
    store
        .define_getter("getSum", move |state, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(sum_values(state).into())
        })
        .unwrap();
    let entities = store.state().get("entities");
    let entities = entities.as_array().unwrap();

    assert_eq!(store.value("getSum"), Ok(Value::Number(0.0)));

    for (value, sum) in [(10, 10.0), (6, 16.0), (4, 20.0)] {
        entities.push(json!({ "value": value })).unwrap();
        assert!(!store.getter("getSum").unwrap().is_valid());
        assert_eq!(store.value("getSum"), Ok(Value::Number(sum)));
        assert_eq!(store.value("getSum"), Ok(Value::Number(sum)));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

/// Mutating an element's own array (not reassigning it) invalidates a
/// filter over all elements exactly once.
#[test]
fn admins_follow_role_push() {
    let store = Store::new(json!({
        "entities": [
            { "name": "alice", "roles": ["admin"] },
            { "name": "bob", "roles": ["user"] },
            { "name": "carol", "roles": ["user", "admin"] },
            { "name": "dave", "roles": [] },
            { "name": "erin", "roles": ["guest"] },
        ]
    }))
    .unwrap();
    let (calls, calls_clone) = counter();
    store
        .define_getter("getAdmins", move |state, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            let admins: Vec<Value> = state
                .get("entities")
                .as_array()
                .map(|entities| {
                    entities
                        .iter()
                        .filter(|entity| {
                            entity.get("roles").as_array().is_some_and(|roles| {
                                roles.iter().any(|role| role.as_str() == Some("admin"))
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(admins.into())
        })
        .unwrap();

    let names = |value: Value| -> Vec<String> {
        match value {
            Value::List(items) => items
                .iter()
                .filter_map(|item| item.get("name").as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    };

    for _ in 0..3 {
        assert_eq!(names(store.value("getAdmins").unwrap()), vec!["alice", "carol"]);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let erin_roles = store.state().get("entities").at(4).get("roles");
    erin_roles.as_array().unwrap().push("admin").unwrap();

    assert_eq!(
        names(store.value("getAdmins").unwrap()),
        vec!["alice", "carol", "erin"]
    );
    assert_eq!(names(store.value("getAdmins").unwrap()).len(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Writing `a.y` leaves a getter that only read `a.x` untouched.
#[test]
fn invalidation_is_precise() {
    let store = Store::new(json!({ "a": { "x": 1, "y": 2 } })).unwrap();
    store
        .define_getter("x", |state, _| Ok(state.get("a").get("x")))
        .unwrap();
    store.value("x").unwrap();

    let a = store.state().get("a");
    a.as_object().unwrap().set("y", 3).unwrap();
    assert!(store.getter("x").unwrap().is_valid());

    a.as_object().unwrap().set("x", 4).unwrap();
    assert!(!store.getter("x").unwrap().is_valid());
}

/// Structurally equal objects are distinct dependencies.
#[test]
fn dependencies_are_by_identity() {
    let store = Store::new(json!({ "left": { "v": 1 }, "right": { "v": 1 } })).unwrap();
    store
        .define_getter("left", |state, _| Ok(state.get("left").get("v")))
        .unwrap();
    store.value("left").unwrap();

    let right = store.state().get("right");
    right.as_object().unwrap().set("v", 9).unwrap();

    assert!(store.getter("left").unwrap().is_valid());
}

/// A getter reading another getter is invalidated with it and sees the
/// fresh value.
#[test]
fn invalidation_is_transitive() {
    let store = Store::new(json!({ "price": 10, "qty": 2 })).unwrap();
    let (total_calls, total_clone) = counter();
    store
        .define_getters([
            (
                "total",
                getter_fn(move |state, _| {
                    total_clone.fetch_add(1, Ordering::SeqCst);
                    let price = state.get("price").as_f64().unwrap_or_default();
                    let qty = state.get("qty").as_f64().unwrap_or_default();
                    Ok((price * qty).into())
                }),
            ),
            (
                "label",
                getter_fn(|_, getters| {
                    let total = getters.get("total")?.as_f64().unwrap_or_default();
                    Ok(format!("total: {total}").into())
                }),
            ),
        ])
        .unwrap();

    assert_eq!(store.value("label"), Ok(Value::from("total: 20")));
    assert_eq!(store.value("total"), Ok(Value::Number(20.0)));
    assert_eq!(total_calls.load(Ordering::SeqCst), 1);

    let label = store.getter("label").unwrap();
    let total = store.getter("total").unwrap();
    assert!(label.depends_on(total.target(), &Field::Value));

    store.state().as_object().unwrap().set("qty", 3).unwrap();
    assert!(!total.is_valid());
    assert!(!label.is_valid());

    assert_eq!(store.value("label"), Ok(Value::from("total: 30")));
    assert_eq!(total_calls.load(Ordering::SeqCst), 2);
}

/// The caller's registry also holds what its callee read.
#[test]
fn caller_records_callee_reads() {
    let store = Store::new(json!({ "n": 1 })).unwrap();
    store.define_getter("inner", |state, _| Ok(state.get("n"))).unwrap();
    store
        .define_getter("outer", |_, getters| getters.get("inner"))
        .unwrap();

    store.value("outer").unwrap();

    let root = store.state();
    let root = root.as_object().unwrap();
    let outer = store.getter("outer").unwrap();
    assert!(outer.depends_on(root.target(), &Field::named("n")));
}

/// Explicit invalidation cascades to dependents.
#[test]
fn explicit_invalidation_cascades() {
    let store = Store::new(json!({})).unwrap();
    store.define_getter("base", |_, _| Ok(1.into())).unwrap();
    store
        .define_getter("derived", |_, getters| getters.get("base"))
        .unwrap();
    store.value("derived").unwrap();

    store.getter("base").unwrap().invalidate();

    assert!(!store.getter("derived").unwrap().is_valid());
}

/// A branch no longer taken stops being a dependency.
#[test]
fn registry_is_rebuilt_on_each_computation() {
    let store = Store::new(json!({ "useX": true, "x": 1, "y": 2 })).unwrap();
    let (calls, calls_clone) = counter();
    store
        .define_getter("pick", move |state, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if state.get("useX").as_bool() == Some(true) {
                Ok(state.get("x"))
            } else {
                Ok(state.get("y"))
            }
        })
        .unwrap();

    let root = store.state();
    let root = root.as_object().unwrap();

    assert_eq!(store.value("pick"), Ok(Value::Number(1.0)));
    root.set("useX", false).unwrap();
    assert_eq!(store.value("pick"), Ok(Value::Number(2.0)));

    root.set("x", 100).unwrap();
    assert!(store.getter("pick").unwrap().is_valid());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Deleting a field always fails and leaves state unchanged.
#[test]
fn deletion_is_rejected() {
    let store = Store::new(json!({ "a": 1.0, "list": [1.0] })).unwrap();
    let root = store.state();

    assert!(matches!(
        root.as_object().unwrap().remove("a"),
        Err(StoreError::UnsupportedOperation { .. })
    ));
    assert!(matches!(
        root.get("list").as_array().unwrap().remove(0),
        Err(StoreError::UnsupportedOperation { .. })
    ));
    assert_eq!(root.to_json(), json!({ "a": 1.0, "list": [1.0] }));
}

#[test]
fn unknown_getter_is_not_found() {
    let store = Store::new(json!({})).unwrap();
    assert_eq!(
        store.value("nope"),
        Err(StoreError::NotFound { name: "nope".into() })
    );
}

#[test]
fn duplicate_batch_registers_nothing() {
    let store = Store::new(json!({})).unwrap();
    store.define_getter("taken", |_, _| Ok(Value::Null)).unwrap();

    let result = store.define_getters([
        ("fresh", getter_fn(|_, _| Ok(Value::Null))),
        ("taken", getter_fn(|_, _| Ok(Value::Null))),
    ]);

    assert_eq!(result, Err(StoreError::DuplicateName { name: "taken".into() }));
    assert!(!store.getters().contains("fresh"));
}

/// A getter that reads itself through another getter is reported, and the
/// stack is left clean.
#[test]
fn cycles_are_detected() {
    let store = Store::new(json!({})).unwrap();
    store.define_getter("a", |_, getters| getters.get("b")).unwrap();
    store.define_getter("b", |_, getters| getters.get("a")).unwrap();

    assert_eq!(
        store.value("a"),
        Err(StoreError::CyclicDependency {
            chain: vec!["a".into(), "b".into(), "a".into()],
        })
    );
    assert!(!store.getter("a").unwrap().is_valid());
    assert!(!store.getter("b").unwrap().is_valid());
}

/// A failing getter stays invalid and retries on the next read.
#[test]
fn failing_getter_retries() {
    let store = Store::new(json!({ "ready": false })).unwrap();
    store
        .define_getter("checked", |state, _| match state.get("ready").as_bool() {
            Some(true) => Ok("ok".into()),
            _ => Err(StoreError::computation("not ready")),
        })
        .unwrap();

    assert_eq!(
        store.value("checked"),
        Err(StoreError::Computation("not ready".into()))
    );
    assert!(!store.getter("checked").unwrap().is_valid());

    store.state().as_object().unwrap().set("ready", true).unwrap();
    assert_eq!(store.value("checked"), Ok(Value::from("ok")));
}

/// A caller that recovers from a callee's failure is refreshed once the
/// callee succeeds.
#[test]
fn recovered_failure_refreshes_caller() {
    let config = StoreConfig {
        max_depth: 1,
        ..StoreConfig::default()
    };
    let store = Store::with_config(json!({}), config).unwrap();
    store
        .define_getter("a", |_, getters| Ok(getters.get("b").unwrap_or(Value::Null)))
        .unwrap();
    store.define_getter("b", |_, _| Ok(5.into())).unwrap();

    assert_eq!(store.value("a"), Ok(Value::Null));
    assert_eq!(store.value("b"), Ok(Value::Number(5.0)));

    assert!(!store.getter("a").unwrap().is_valid());
    assert_eq!(store.value("a"), Ok(Value::Number(5.0)));
}

/// A recovered failure is also refreshed when the callee is invalidated by
/// a write before it is retried.
#[test]
fn recovered_failure_follows_callee_writes() {
    let store = Store::new(json!({ "ready": false, "other": 0 })).unwrap();
    let (calls, calls_clone) = counter();
    store
        .define_getter("checked", |state, _| match state.get("ready").as_bool() {
            Some(true) => Ok("ok".into()),
            _ => Err(StoreError::computation("not ready")),
        })
        .unwrap();
    store
        .define_getter("status", move |_, getters| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(getters.get("checked").unwrap_or_else(|_| "pending".into()))
        })
        .unwrap();

    assert_eq!(store.value("status"), Ok(Value::from("pending")));
    assert_eq!(store.value("status"), Ok(Value::from("pending")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let root = store.state();
    let root = root.as_object().unwrap();
    root.set("other", 1).unwrap();
    assert!(store.getter("status").unwrap().is_valid());

    root.set("ready", true).unwrap();
    assert_eq!(store.value("status"), Ok(Value::from("ok")));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Invalidating a long chain of getters does not grow the native stack.
#[test]
fn long_getter_chain_invalidates_iteratively() {
    const CHAIN: usize = 5_000;

    let store = Store::new(json!({ "n": 1 })).unwrap();
    store.define_getter("g0", |state, _| Ok(state.get("n"))).unwrap();
    for index in 1..CHAIN {
        let previous = format!("g{}", index - 1);
        store
            .define_getter(format!("g{index}"), move |_, getters| getters.get(&previous))
            .unwrap();
    }

    // Computed one link at a time, so no run nests deeper than two frames.
    for index in 0..CHAIN {
        assert_eq!(store.value(&format!("g{index}")), Ok(Value::Number(1.0)));
    }

    store.state().as_object().unwrap().set("n", 2).unwrap();

    let last = format!("g{}", CHAIN - 1);
    assert!(!store.getter(&last).unwrap().is_valid());
    for index in 0..CHAIN {
        assert_eq!(store.value(&format!("g{index}")), Ok(Value::Number(2.0)));
    }
}

/// A panic inside a getter does not leave a frame that swallows later reads.
#[test]
fn panicking_getter_pops_its_frame() {
    let store = Store::new(json!({ "n": 1 })).unwrap();
    store
        .define_getter("panics", |_, _| panic!("getter blew up"))
        .unwrap();
    store.define_getter("n", |state, _| Ok(state.get("n"))).unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| store.value("panics")));
    assert!(result.is_err());

    store.value("n").unwrap();
    let panics = store.getter("panics").unwrap();
    assert!(!panics.is_valid());
    assert!(panics.dependency_keys().is_empty());
}

/// Reading a cached value directly requires a valid getter.
#[test]
fn cached_value_requires_computation() {
    let store = Store::new(json!({ "n": 1 })).unwrap();
    store.define_getter("n", |state, _| Ok(state.get("n"))).unwrap();
    let getter = store.getter("n").unwrap();

    assert_eq!(getter.value(), Err(StoreError::NotComputed { name: "n".into() }));
    store.value("n").unwrap();
    assert_eq!(getter.value(), Ok(Value::Number(1.0)));
}

/// Adding a key invalidates getters that enumerate keys.
#[test]
fn key_enumeration_sees_new_fields() {
    let store = Store::new(json!({ "flags": { "a": true } })).unwrap();
    store
        .define_getter("flagCount", |state, _| Ok(state.get("flags").len().into()))
        .unwrap();
    assert_eq!(store.value("flagCount"), Ok(Value::Number(1.0)));

    let flags = store.state().get("flags");
    flags.as_object().unwrap().set("a", false).unwrap();
    assert!(store.getter("flagCount").unwrap().is_valid());

    flags.as_object().unwrap().set("b", true).unwrap();
    assert_eq!(store.value("flagCount"), Ok(Value::Number(2.0)));
}

/// A node attached in two places is one dependency.
#[test]
fn shared_nodes_reconverge() {
    let store = Store::new(json!({ "primary": { "v": 1 } })).unwrap();
    let root = store.state();
    let root = root.as_object().unwrap();
    root.set("alias", root.get("primary")).unwrap();

    store
        .define_getter("viaAlias", |state, _| Ok(state.get("alias").get("v")))
        .unwrap();
    assert_eq!(store.value("viaAlias"), Ok(Value::Number(1.0)));

    root.get("primary").as_object().unwrap().set("v", 2).unwrap();
    assert_eq!(store.value("viaAlias"), Ok(Value::Number(2.0)));
}

/// Frozen data is stored as is and reads inside it are not tracked.
#[test]
fn frozen_values_are_not_reactive() {
    let store = Store::new(json!({})).unwrap();
    let root = store.state();
    let root = root.as_object().unwrap();
    root.set("config", Value::frozen(json!({ "level": 3 }))).unwrap();

    store
        .define_getter("level", |state, _| Ok(state.get("config").get("level")))
        .unwrap();
    assert_eq!(store.value("level"), Ok(Value::Number(3.0)));

    let keys = store.getter("level").unwrap().dependency_keys();
    assert_eq!(keys, vec![Field::named("config")]);
}

/// Handles from another store cannot be attached.
#[test]
fn foreign_handles_are_rejected() {
    let first = Store::new(json!({ "child": {} })).unwrap();
    let second = Store::new(json!({})).unwrap();

    let result = second
        .state()
        .as_object()
        .unwrap()
        .set("stolen", first.state().get("child"));

    assert_eq!(result, Err(StoreError::ForeignNode));
    assert_eq!(second.state().to_json(), json!({}));
}

/// Listeners hear each top-level write once, until unsubscribed.
#[test]
fn subscribers_are_notified_per_write() {
    let store = Store::new(json!({ "list": [] })).unwrap();
    let (notified, notified_clone) = counter();
    let subscription = store.subscribe(move |_| {
        notified_clone.fetch_add(1, Ordering::SeqCst);
    });

    let list = store.state().get("list");
    let list = list.as_array().unwrap();
    list.extend([1, 2, 3]).unwrap();
    assert_eq!(notified.load(Ordering::SeqCst), 1);

    store.state().as_object().unwrap().set("other", 1).unwrap();
    assert_eq!(notified.load(Ordering::SeqCst), 2);

    subscription.unsubscribe();
    list.push(4).unwrap();
    assert_eq!(notified.load(Ordering::SeqCst), 2);
}

/// Getter recomputation does not notify listeners.
#[test]
fn getter_reads_do_not_notify() {
    let store = Store::new(json!({ "n": 1 })).unwrap();
    let (notified, notified_clone) = counter();
    let _subscription = store.subscribe(move |_| {
        notified_clone.fetch_add(1, Ordering::SeqCst);
    });
    store.define_getter("n", |state, _| Ok(state.get("n"))).unwrap();

    store.value("n").unwrap();
    store.value("n").unwrap();

    assert_eq!(notified.load(Ordering::SeqCst), 0);
}

/// Deep getter chains stop at the configured depth.
#[test]
fn depth_limit_applies_to_chains() {
    let config = StoreConfig {
        max_depth: 2,
        ..StoreConfig::default()
    };
    let store = Store::with_config(json!({}), config).unwrap();
    store.define_getter("g0", |_, _| Ok(0.into())).unwrap();
    store.define_getter("g1", |_, g| g.get("g0")).unwrap();
    store.define_getter("g2", |_, g| g.get("g1")).unwrap();

    assert_eq!(
        store.value("g2"),
        Err(StoreError::DepthExceeded { name: "g0".into(), max_depth: 2 })
    );
    assert_eq!(store.value("g1"), Ok(Value::Number(0.0)));
    assert_eq!(store.value("g2"), Ok(Value::Number(0.0)));
}

/// Array roots are supported.
#[test]
fn array_root() {
    let store = Store::new(json!([1, 2, 3])).unwrap();
    store
        .define_getter("count", |state, _| Ok(state.len().into()))
        .unwrap();

    assert_eq!(store.value("count"), Ok(Value::Number(3.0)));
    store.state().as_array().unwrap().push(4).unwrap();
    assert_eq!(store.value("count"), Ok(Value::Number(4.0)));
}
