pub mod planner;
pub mod service;
