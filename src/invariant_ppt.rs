//! Checked invariants that tests can audit.
//!
//! `assert_invariant!` panics when its condition is false and, either way,
//! notes the invariant's message in a per-thread set. A test that drove a
//! code path then calls [`contract_test`] with the messages that path must
//! have checked; a missing one fails the test even if nothing panicked.

use std::cell::RefCell;
use std::collections::HashSet;

thread_local! {
    static CHECKED: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// `assert_invariant!(cond, "message")` or `assert_invariant!(cond, "message", "where")`.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariant_ppt::check_invariant($condition, $message, None)
    };
    ($condition:expr, $message:expr, $location:expr) => {
        $crate::invariant_ppt::check_invariant($condition, $message, Some($location))
    };
}

#[doc(hidden)]
pub fn check_invariant(holds: bool, message: &str, location: Option<&str>) {
    CHECKED.with(|checked| {
        let mut checked = checked.borrow_mut();
        if !checked.contains(message) {
            checked.insert(message.to_string());
        }
    });

    if !holds {
        panic!(
            "invariant violated in {}: {}",
            location.unwrap_or("<unknown>"),
            message
        );
    }
}

/// Fail `name` unless each of `expected` was checked on this thread since the
/// last [`clear_invariant_log`].
pub fn contract_test(name: &str, expected: &[&str]) {
    let unchecked: Vec<&str> = CHECKED.with(|checked| {
        let checked = checked.borrow();
        expected
            .iter()
            .copied()
            .filter(|message| !checked.contains(*message))
            .collect()
    });

    if !unchecked.is_empty() {
        panic!(
            "contract '{}' never checked: {}",
            name,
            unchecked.join(", ")
        );
    }
}

pub fn clear_invariant_log() {
    CHECKED.with(|checked| checked.borrow_mut().clear());
}
