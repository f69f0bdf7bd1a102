pub use super::transfer_records::Entity as TransferRecords;
