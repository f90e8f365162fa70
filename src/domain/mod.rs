pub mod category;
pub mod clock;
pub mod storage;
pub mod store;
pub mod theme;
pub mod todo;
