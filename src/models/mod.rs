pub mod catalog_entry;
pub mod filter;
pub mod selectors;

pub use catalog_entry::CatalogEntry;
pub use filter::{FilterField, FilterRange};
pub use selectors::{ElementSelector, Selectors};
