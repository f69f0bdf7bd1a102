use crate::error::{TransferError, TransferResult};
use crate::utils::keys;

use super::TransferService;

impl TransferService {
    /// Keys under `prefix`, which is treated as a folder (`data` and `data/`
    /// list the same objects). An empty bucket or prefix is `Ok(vec![])`;
    /// a failed listing is an error.
    pub async fn list_objects(&self, prefix: &str) -> TransferResult<Vec<String>> {
        let prefix = keys::normalize_prefix(prefix);

        match self.store.list(&prefix).await {
            Ok(objects) => {
                tracing::debug!("Listed {} objects under '{}'", objects.len(), prefix);
                Ok(objects)
            }
            Err(e) => {
                let err = TransferError::remote("list", &prefix, e);
                tracing::error!(error_kind = err.kind(), "❌ Listing objects failed: {}", err);
                Err(err)
            }
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        self.store.object_url(key)
    }
}
