//! # Domain Models
//!
//! These structs represent the core entities of the school desk.
//! Wire names are camelCase to match the existing web and mobile clients.

pub mod bilingual;
pub mod class;
pub mod content;
pub mod principal;
pub mod student;

pub use bilingual::*;
pub use class::*;
pub use content::*;
pub use principal::*;
pub use student::*;
