pub mod executors;
pub mod providers;
pub mod scene;
