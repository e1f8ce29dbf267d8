pub mod entry;
pub mod filters;
pub mod principal;
pub mod role;

pub use entry::*;
pub use filters::*;
pub use principal::*;
pub use role::*;
