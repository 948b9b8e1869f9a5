//! Proptest strategies for parameter values and SQL fragments.

use proptest::prelude::*;

/// Identifier usable as a bind marker name
pub fn marker_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,15}"
}

/// Free text that is not blank
pub fn non_blank_text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 %_]{0,12}[a-zA-Z0-9][a-zA-Z0-9 ]{0,12}"
}

/// Text made only of whitespace, possibly empty
pub fn blank_text_strategy() -> impl Strategy<Value = String> {
    "[ \t]{0,6}"
}

/// Column name used in ORDER BY clauses
pub fn column_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,10}"
}
