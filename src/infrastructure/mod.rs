pub mod classifier;
pub mod database;
pub mod seed;
pub mod storage;
