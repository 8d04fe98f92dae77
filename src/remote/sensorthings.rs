//! SensorThings API store
//!
//! Reads and deletes observations over the OGC SensorThings REST interface.

use super::types::{Filter, ObservationSink, ObservationSource, Query};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::model::{Observation, StreamRef};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

/// Collection response body
#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(default)]
    value: Vec<Observation>,
}

/// Observation store backed by a SensorThings server
#[derive(Debug)]
pub struct SensorThingsClient {
    http: HttpClient,
}

impl SensorThingsClient {
    /// Create a store over an HTTP client rooted at the service URL
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    fn query_params(query: &Query) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        if let Some(ref filter) = query.filter {
            params.push(("$filter", filter.to_string()));
        }
        params.push(("$orderby", query.order.as_order_by()));
        params.push(("$top", query.top.to_string()));
        if query.skip > 0 {
            params.push(("$skip", query.skip.to_string()));
        }
        params
    }
}

#[async_trait]
impl ObservationSource for SensorThingsClient {
    async fn query(&self, stream: &StreamRef, query: &Query) -> Result<Vec<Observation>> {
        let url = self
            .http
            .url(&stream.observations_path(), &Self::query_params(query))?;

        let collection: Collection = self.http.get_json(url).await?;
        if collection.value.len() > query.top {
            return Err(Error::remote(format!(
                "server returned {} observations for $top={}",
                collection.value.len(),
                query.top
            )));
        }

        debug!(
            stream = %stream,
            filter = ?query.filter.as_ref().map(ToString::to_string),
            fetched = collection.value.len(),
            "Queried observations"
        );

        Ok(collection
            .value
            .into_iter()
            .map(|observation| observation.with_stream(stream))
            .collect())
    }

    async fn first_match(
        &self,
        stream: &StreamRef,
        filter: &Filter,
    ) -> Result<Option<Observation>> {
        let query = Query::new(1).filter(filter.clone());
        Ok(self.query(stream, &query).await?.into_iter().next())
    }
}

#[async_trait]
impl ObservationSink for SensorThingsClient {
    async fn delete(&self, observations: &[Observation], batch_size: usize) -> Result<usize> {
        let targets: Vec<(String, String)> = observations
            .iter()
            .filter_map(|obs| {
                let id = obs.id.as_ref()?;
                Some((obs.label(), format!("Observations({})", id.to_key_segment())))
            })
            .collect();
        let mut deleted = 0;

        for batch in targets.chunks(batch_size.max(1)) {
            let requests = batch.iter().map(|(label, path)| async move {
                let result = match self.http.url(path, &[]) {
                    Ok(url) => self.http.delete(url).await,
                    Err(e) => Err(e),
                };
                (label, result)
            });

            for (label, result) in join_all(requests).await {
                match result {
                    Ok(()) => deleted += 1,
                    Err(e) => warn!(
                        observation = %label,
                        error = %e,
                        "Failed to delete duplicate observation"
                    ),
                }
            }
        }

        Ok(deleted)
    }
}
