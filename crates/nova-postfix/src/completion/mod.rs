//! Completion-list helpers that ship with the postfix templates.

mod length_count;
mod type_parameter;

pub use length_count::add_length_count_alias;
pub use type_parameter::{accept_type_parameter, type_parameter_item, TYPE_PARAMETER_TEMPLATE};
