pub mod enums;
pub mod filters;
pub mod incident;
pub mod patient;
pub mod stats;
pub mod user;

pub use enums::*;
pub use filters::*;
pub use incident::*;
pub use patient::*;
pub use stats::*;
pub use user::*;
