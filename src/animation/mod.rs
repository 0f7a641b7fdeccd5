pub mod clock;
pub mod config;
pub mod flight;
pub mod render;
pub mod scheduler;
