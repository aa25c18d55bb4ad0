/// Raw record shapes exchanged with storage backends.
pub mod models;
/// Score store abstraction and its backends.
pub mod score_store;
/// Storage abstraction layer for database operations.
pub mod storage;
