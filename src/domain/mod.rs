pub mod errors;
pub mod events;
pub mod models;
pub mod repositories;
pub mod schedule;
pub mod window;
