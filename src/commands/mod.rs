pub mod inspect;
pub mod inventory;
pub mod merge;
pub mod pipeline;
