//! Concurrent batch execution
//!
//! Every request in a batch runs in its own task and writes its outcome into
//! a shared map. The caller joins all tasks before reading, so the result set
//! always covers the request set, even if a task panics.

use crate::{FhirClient, FhirRequest, FhirResult};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

impl FhirClient {
    /// Execute independent requests concurrently, one result per id
    pub async fn execute_batch(
        &self,
        requests: HashMap<String, FhirRequest>,
    ) -> HashMap<String, FhirResult> {
        if requests.is_empty() {
            return HashMap::new();
        }

        let count = requests.len();
        debug!(count, "Executing batch");

        let results: Arc<DashMap<String, FhirResult>> = Arc::new(DashMap::with_capacity(count));
        let mut handles = Vec::with_capacity(count);

        for (id, request) in requests {
            let client = self.clone();
            let permits = self.permits();
            let results = Arc::clone(&results);
            let task_id = id.clone();

            let handle = tokio::spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => client.send(&task_id, request).await,
                    Err(e) => FhirResult::failed(&task_id, e.to_string()),
                };
                results.insert(task_id, result);
            });
            handles.push((id, handle));
        }

        for (id, handle) in handles {
            if let Err(e) = handle.await {
                warn!(id = %id, error = %e, "Batch task failed");
                results.insert(id.clone(), FhirResult::failed(id, format!("task failed: {e}")));
            }
        }

        let results = Arc::try_unwrap(results).unwrap_or_else(|shared| (*shared).clone());
        let results: HashMap<_, _> = results.into_iter().collect();

        let failed = results.values().filter(|r| !r.is_success()).count();
        debug!(count, failed, "Batch complete");
        results
    }
}
