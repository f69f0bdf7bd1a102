use crate::entities::{prelude::*, *};
use crate::models::TransferRecord;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

/// Destination for transfer metadata. Called once per successful upload.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn persist(&self, record: &TransferRecord) -> Result<()>;
}

/// Writes records to the `transfer_records` table.
#[derive(Clone)]
pub struct DatabaseRecordSink {
    db: DatabaseConnection,
}

impl DatabaseRecordSink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_key(&self, key: &str) -> Result<Vec<TransferRecord>> {
        let rows = TransferRecords::find()
            .filter(transfer_records::Column::Key.eq(key))
            .order_by_asc(transfer_records::Column::CreatedAt)
            .all(&self.db)
            .await?;

        rows.into_iter().map(Self::to_record).collect()
    }

    fn to_record(row: transfer_records::Model) -> Result<TransferRecord> {
        Ok(TransferRecord {
            file_name: row.file_name,
            file_type: row.file_type,
            original_file_size: u64::try_from(row.original_file_size)?,
            compressed_file_size: u64::try_from(row.compressed_file_size)?,
            file_compression_type: row
                .file_compression_type
                .parse()
                .map_err(|e| anyhow!("Stored record has {}", e))?,
            key: row.key,
            file_url: row.file_url,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl RecordSink for DatabaseRecordSink {
    async fn persist(&self, record: &TransferRecord) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let row = transfer_records::ActiveModel {
            id: Set(id.clone()),
            file_name: Set(record.file_name.clone()),
            file_type: Set(record.file_type.clone()),
            original_file_size: Set(i64::try_from(record.original_file_size)?),
            compressed_file_size: Set(i64::try_from(record.compressed_file_size)?),
            file_compression_type: Set(record.file_compression_type.to_string()),
            key: Set(record.key.clone()),
            file_url: Set(record.file_url.clone()),
            created_at: Set(record.created_at),
        };

        row.insert(&self.db).await?;

        info!(
            target: "transfer_records",
            record_id = %id,
            key = %record.key,
            original_size = record.original_file_size,
            compressed_size = record.compressed_file_size,
            "Transfer record saved"
        );

        Ok(())
    }
}
