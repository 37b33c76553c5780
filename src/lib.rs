pub mod api;
pub mod collector;
pub mod diff;
pub mod models;
pub mod table;
