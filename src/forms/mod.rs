//! Form field validation.
//!
//! Rule sets are declared as data per field and evaluated in a fixed
//! pipeline; field errors are computed continuously but only surfaced
//! once a field has been touched (blurred at least once).

mod rules;
mod state;

pub use rules::{FieldRules, FieldValues};
pub use state::FormState;
