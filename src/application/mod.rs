pub mod persistence;
pub mod preferences;
pub mod task_store;

mod task_store_tests;
