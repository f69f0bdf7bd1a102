pub mod prelude;

pub mod transfer_records;
