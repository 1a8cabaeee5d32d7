pub mod handlers;
pub mod runner;
pub mod sink;
pub mod upload;
