//! Cell editing, nested sub-rows and validation

mod controller;
mod subrow;
mod validation;

pub use controller::{
    CellAddress, CellEdit, CellEditController, NestedAddress, apply_edit, apply_nested_edit,
    clear_dependents, dependents_of,
};
pub use subrow::{DerivedField, ParentAggregate, SubRowConfig};
pub use validation::{CustomValidator, FormValidator};
