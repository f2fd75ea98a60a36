pub mod application;
pub mod interview;
