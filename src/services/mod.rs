pub mod classifier;
pub mod credential_store;
pub mod diagnosis;
pub mod report;
pub mod storage;
