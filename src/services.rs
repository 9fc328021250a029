pub mod catalog;
pub mod clock;
