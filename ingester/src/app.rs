use crate::ingest::ContractsFinderSource;
use crate::pipeline::{Pipeline, RunSummary};
use crate::store::RestStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tenders_core::config::HttpConfig;
use tenders_core::{Config, Result};
use tracing::{info, instrument};

pub struct App {
    pipeline: Pipeline,
}

impl App {
    #[instrument(skip(config))]
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing application");

        let client = http_client(&config.http)?;

        let store = RestStore::new(client.clone(), &config.store)?;
        let source = ContractsFinderSource::new(client, config.source.base_url.clone());

        let pipeline = Pipeline::new(Arc::new(source), Arc::new(store), config);

        Ok(Self { pipeline })
    }

    pub async fn run_once(&self) -> Result<RunSummary> {
        self.pipeline.run(Utc::now()).await
    }
}

/// One client for both ends; no timeout unless configured.
fn http_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}
