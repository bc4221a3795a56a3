//! Proptest strategies for status predicates and stages.

use ingest_core::state_machine::{Stage, StatusPredicate};
use proptest::prelude::*;

/// Status values around the registered code blocks, including the reset sentinel
pub fn status_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![
        -10_000..11_000i32,
        Just(-9999),
        Just(0),
        (0..10i32).prop_map(|block| block * 100),
        (1..10i32).prop_map(|block| block * 100 - 10),
    ]
}

pub fn stage_strategy() -> impl Strategy<Value = Stage> {
    prop::sample::select(Stage::ALL.to_vec())
}

/// Single-clause predicate
pub fn clause_strategy() -> impl Strategy<Value = StatusPredicate> {
    let value = -1_000..11_000i32;
    prop_oneof![
        value.clone().prop_map(StatusPredicate::Equals),
        value.clone().prop_map(StatusPredicate::NotEquals),
        value.clone().prop_map(StatusPredicate::GreaterOrEqual),
        value.clone().prop_map(StatusPredicate::LessThan),
        (value.clone(), value).prop_map(|(a, b)| StatusPredicate::range(a.min(b), a.max(b))),
    ]
}

/// Conjunctions of up to four clauses
pub fn predicate_strategy() -> impl Strategy<Value = StatusPredicate> {
    prop::collection::vec(clause_strategy(), 1..=4).prop_map(|clauses| {
        let mut clauses = clauses.into_iter();
        let first = clauses
            .next()
            .unwrap_or(StatusPredicate::NotEquals(-9999));
        clauses.fold(first, StatusPredicate::and)
    })
}
