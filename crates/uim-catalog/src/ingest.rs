//! Manifest ingestion.

use crate::error::CatalogError;
use crate::store::CatalogStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uim_core::{IntentUid, Manifest, Service};

/// Outcome of ingesting one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub service: Service,
    /// Intent uids written, in manifest order.
    pub intent_uids: Vec<String>,
    /// Tag links created across all intents.
    pub tag_links: usize,
    /// Previously stored intents of this service the manifest dropped.
    pub removed: usize,
}

/// Writes manifests into a catalog store.
///
/// Writes for the same service name are serialized in-process; the store's
/// upserts keep concurrent writers from other processes convergent. A
/// service's lock is dropped from the map once no ingestion holds it.
pub struct Ingestor {
    store: Arc<dyn CatalogStore>,
    service_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            service_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Validate and apply a manifest as one transaction.
    pub async fn ingest(&self, manifest: &Manifest) -> Result<IngestReport, CatalogError> {
        validate(manifest)?;

        let name = manifest.service_info.name.clone();
        let lock = {
            let mut locks = self.service_locks.lock().await;
            locks.entry(name.clone()).or_default().clone()
        };
        let result = {
            let _guard = lock.lock().await;
            self.store.apply_manifest(manifest).await
        };
        self.release_lock(&name, lock).await;

        match result {
            Ok(report) => {
                info!(
                    service = %name,
                    service_id = report.service.id,
                    intents = report.intent_uids.len(),
                    removed = report.removed,
                    "ingested manifest"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(service = %name, error = %e, "manifest ingestion rolled back");
                Err(e)
            }
        }
    }

    /// Forget `name`'s lock unless another ingestion still holds a clone.
    /// Clones are only taken under the map lock, so the count is stable here.
    async fn release_lock(&self, name: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.service_locks.lock().await;
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(name);
        }
    }
}

fn validate(manifest: &Manifest) -> Result<(), CatalogError> {
    let info = &manifest.service_info;
    if info.name.trim().is_empty() {
        return Err(CatalogError::InvalidManifest(
            "service-info.name is empty".to_string(),
        ));
    }
    if info.service_url.trim().is_empty() {
        return Err(CatalogError::InvalidManifest(format!(
            "service {} has no service_url",
            info.name
        )));
    }

    for intent in &manifest.intents {
        let uid = IntentUid::parse(&intent.intent_uid)
            .map_err(|e| CatalogError::InvalidManifest(e.to_string()))?;
        if uid.domain != info.name {
            return Err(CatalogError::InvalidManifest(format!(
                "intent {} is outside service {}",
                intent.intent_uid, info.name
            )));
        }
        if intent.intent_name.trim().is_empty() {
            return Err(CatalogError::InvalidManifest(format!(
                "intent {} has no name",
                intent.intent_uid
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteCatalog;
    use serde_json::json;

    fn manifest(service: &str, uid: &str) -> Manifest {
        serde_json::from_value(json!({
            "service-info": {"name": service, "service_url": format!("https://{service}")},
            "intents": [{"intent_uid": uid, "intent_name": "Search"}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_service_locks_released_after_ingest() {
        let ingestor = Ingestor::new(Arc::new(SqliteCatalog::in_memory().await.unwrap()));
        for i in 0..5 {
            let service = format!("s{i}.example");
            ingestor
                .ingest(&manifest(&service, &format!("{service}:Search:v1")))
                .await
                .unwrap();
        }
        assert!(ingestor.service_locks.lock().await.is_empty());
    }

    #[test]
    fn test_uid_must_belong_to_service() {
        assert!(validate(&manifest("a.example", "a.example:Search:v1")).is_ok());
        let err = validate(&manifest("evil.example", "a.example:Search:v1")).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidManifest(_)));
    }
}
