//! Giftpack
//!
//! Giftpack picks the set of purchases that spends as much of a fixed budget
//! as possible, such as a gift card balance. Each purchase carries its own tax
//! and shipping fee, and a flat surcharge applies whenever the free-shipping
//! eligible items fall short of a minimum.

pub mod catalog;
pub mod combination;
pub mod evaluation;
pub mod fixtures;
pub mod prelude;
pub mod purchases;
pub mod receipt;
pub mod rules;
pub mod search;
pub mod utils;
pub mod validation;

pub use search::search;
pub use validation::{validate, warnings};
