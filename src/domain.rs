pub mod authorization;
pub mod booking;
pub mod commands;
pub mod events;
pub mod fields;
pub mod pricing;
pub mod refund;
pub mod status;
