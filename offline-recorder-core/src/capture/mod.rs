pub mod acquirer;
pub mod catalog;
