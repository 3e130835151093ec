//! Bindings: named values available to later test steps.
//!
//! - `table`: the persistent [`BindingTable`] and its lazily evaluable [`BindingValue`]s
//! - `names`: author-facing name validation
//! - `resolve`: indirection, declaration resolution and registration
//!
//! Data flow:
//! ```text
//! Binding { name, value }
//!        │
//!        ├─ name  ── resolve_indirection ── validate_binding_name
//!        └─ value ── template evaluation (every `(expr)` inside the value)
//!        ↓
//! (name, value) ── register_binding ──► new BindingTable snapshot (`$name`)
//! ```

mod names;
mod resolve;
mod table;

pub use names::validate_binding_name;
pub use resolve::{register_binding, register_bindings, resolve_binding, resolve_indirection, resolve_string};
pub use table::{BINDING_SIGIL, BindingError, BindingTable, BindingValue};
