//! Bundle pagination
//!
//! Crawls run in synchronous rounds: each round submits one batch holding
//! the next-page request of every id still in flight. An id leaves the crawl
//! when its chain ends or a page fails, and never comes back.

use crate::{Bundle, FhirClient, FhirRequest, FhirResult};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Accumulated result of crawling one id's bundle chain
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CrawlOutcome {
    /// Embedded resources across all pages, in page order
    pub entries: Vec<Value>,
    /// Why the chain stopped early, if it did
    pub partial: Option<String>,
    /// Number of pages requested for this id
    pub rounds: usize,
}

impl CrawlOutcome {
    /// Check if the chain was cut short
    pub fn is_partial(&self) -> bool {
        self.partial.is_some()
    }
}

impl FhirClient {
    /// Follow every id's bundle chain to completion
    pub async fn crawl(
        &self,
        requests: HashMap<String, FhirRequest>,
    ) -> HashMap<String, CrawlOutcome> {
        let mut outcomes: HashMap<String, CrawlOutcome> = requests
            .keys()
            .map(|id| (id.clone(), CrawlOutcome::default()))
            .collect();
        let max_rounds = self.config().max_pagination_rounds;

        let mut pending = requests;
        let mut round = 0usize;
        while !pending.is_empty() {
            if max_rounds.is_some_and(|max| round >= max) {
                for id in pending.keys() {
                    warn!(id = %id, round, "Pagination round limit reached");
                    if let Some(outcome) = outcomes.get_mut(id) {
                        outcome.partial = Some(format!("stopped after {round} pages"));
                    }
                }
                break;
            }
            round += 1;
            debug!(round, ids = pending.len(), "Crawling bundle page");

            let results = self.execute_batch(std::mem::take(&mut pending)).await;
            for (id, result) in results {
                let outcome = outcomes.entry(id.clone()).or_default();
                outcome.rounds += 1;

                match self.next_page(result, &mut outcome.entries) {
                    Ok(Some(request)) => {
                        pending.insert(id, request);
                    }
                    Ok(None) => {}
                    Err(reason) => {
                        warn!(id = %id, round, reason = %reason, "Bundle chain cut short");
                        outcome.partial = Some(reason);
                    }
                }
            }
        }

        outcomes
    }

    /// Consume one page, returning the request for the following one
    fn next_page(
        &self,
        result: FhirResult,
        entries: &mut Vec<Value>,
    ) -> Result<Option<FhirRequest>, String> {
        let payload = result.into_payload().map_err(|e| e.to_string())?;
        let bundle = Bundle::parse(&payload).map_err(|e| e.to_string())?;

        let next = match bundle.next_link() {
            Some(link) => Some(
                self.resolve(link)
                    .map(FhirRequest::get)
                    .map_err(|e| format!("unusable next link '{link}': {e}"))?,
            ),
            None => None,
        };
        entries.extend(bundle.into_resources());
        Ok(next)
    }
}
