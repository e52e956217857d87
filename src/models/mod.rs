pub mod document;
pub mod enums;
pub mod frequency;
pub mod monitoring;
pub mod patient;

pub use document::*;
pub use enums::*;
pub use frequency::*;
pub use monitoring::*;
pub use patient::*;
