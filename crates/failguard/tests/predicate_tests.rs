//! Primitive predicate behavior and log accounting.

use failguard::caller;
use failguard_test_utils::{logging_engine, EventCounter};
use proptest::prelude::*;

#[test]
fn is_true_only_for_some_true() {
    let counter = EventCounter::new();
    let engine = logging_engine(&counter);
    let ops = engine.when().unwrap();

    assert!(ops.is_true(Some(true)));
    assert!(!ops.is_true(Some(false)));
    assert!(!ops.is_true(None));
}

#[test]
fn is_not_true_counts_absent_as_not_true() {
    let counter = EventCounter::new();
    let engine = logging_engine(&counter);
    let ops = engine.when().unwrap();

    assert!(ops.is_not_true(Some(false)));
    assert!(ops.is_not_true(None));
    assert!(!ops.is_not_true(Some(true)));
}

#[test]
fn nullables_are_exact_complements() {
    let counter = EventCounter::new();
    let engine = logging_engine(&counter);
    let ops = engine.when().unwrap();

    let present = Some("payload");
    let absent: Option<&str> = None;

    assert!(!ops.is_null(&present));
    assert!(ops.is_not_null(&present));
    assert!(ops.is_null(&absent));
    assert!(!ops.is_not_null(&absent));
}

#[test]
fn boolean_log_hits_are_exactly_two_of_four() {
    let counter = EventCounter::new();
    let engine = logging_engine(&counter);
    let ops = engine.when().unwrap();

    ops.is_true(Some(true));
    ops.is_true(Some(false));
    ops.is_not_true(Some(true));
    ops.is_not_true(Some(false));

    assert_eq!(counter.count(), 2);
}

#[test]
fn nullable_log_hits_fire_only_on_true_results() {
    let counter = EventCounter::new();
    let engine = logging_engine(&counter);
    let ops = engine.when().unwrap();

    let present = Some(42_u32);
    let absent: Option<u32> = None;

    ops.is_null(&present);
    ops.is_null(&absent);
    ops.is_not_null(&present);
    ops.is_not_null(&absent);

    assert_eq!(counter.count(), 2);
}

#[test]
fn caller_macro_names_the_enclosing_function() {
    let name = caller!();
    assert!(
        name.ends_with("caller_macro_names_the_enclosing_function"),
        "unexpected caller name: {name}"
    );
}

proptest! {
    #[test]
    fn tri_state_predicates_are_complements(test in proptest::option::of(any::<bool>())) {
        let counter = EventCounter::new();
        let engine = logging_engine(&counter);
        let ops = engine.when().unwrap();

        prop_assert_eq!(ops.is_true(test), test == Some(true));
        prop_assert_ne!(ops.is_true(test), ops.is_not_true(test));
    }

    #[test]
    fn presence_predicates_are_complements(value in proptest::option::of(any::<u64>())) {
        let counter = EventCounter::new();
        let engine = logging_engine(&counter);
        let ops = engine.when().unwrap();

        prop_assert_ne!(ops.is_null(&value), ops.is_not_null(&value));
    }
}
