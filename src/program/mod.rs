//! Statement-level model of the program under repair.
//!
//! The program is parsed once into a [`StatementIndex`] that gives every
//! statement a stable positional [`StatementId`] and a [`StatementKind`]
//! tag. Re-parsing identical text yields identical ids, which is what lets
//! patches refer to statements across independent parses.

mod index;
mod statement;

pub use index::{Removal, StatementIndex, StatementNode};
pub use statement::{StatementId, StatementKind};
