//! API request handlers

mod catalogs;
mod entities;
mod events;
mod system;

pub use catalogs::*;
pub use entities::*;
pub use events::*;
pub use system::*;
