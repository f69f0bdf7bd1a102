pub mod blocking;
pub mod compression;
pub mod records;
pub mod storage;
pub mod transfer;
