//! Request handlers.

pub mod delivery;
pub mod health;
pub mod pages;
pub mod status;
pub mod upload;

pub use delivery::*;
pub use health::*;
pub use pages::*;
pub use status::*;
pub use upload::*;
