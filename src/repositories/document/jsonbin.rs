use anyhow::bail;
use reqwest;

use crate::models::document::Document;

/// Client for the hosted JSON bin holding the application document. Reads
/// target the latest-version path, writes replace the whole bin.
#[derive(Clone)]
pub struct JsonBinApi {
    master_key: String,
    url: String,
    client: reqwest::Client,
}

impl JsonBinApi {
    pub fn new(master_key: String, url: String) -> Self {
        Self {
            master_key,
            url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn read_latest(&self) -> Result<Document, anyhow::Error> {
        let response = self
            .client
            .get(format!("{}/latest", self.url))
            .header("X-Master-Key", &self.master_key)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("JsonBin: read failed with status {}.", response.status());
        }

        let body = response.text().await?;
        let response_json: serde_json::Value = serde_json::from_str(&body)?;
        match response_json.get("record") {
            Some(r) => {
                let document: Document = serde_json::from_value(r.clone())?;
                Ok(document)
            }
            None => bail!("JsonBin: bad response format."),
        }
    }

    pub async fn update(&self, document: &Document) -> Result<(), anyhow::Error> {
        let response = self
            .client
            .put(&self.url)
            .header("X-Master-Key", &self.master_key)
            .json(document)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("JsonBin: update failed with status {}.", response.status());
        }

        Ok(())
    }

    /// Initialization write. Versioning is disabled so the seed write does
    /// not pile up bin versions.
    pub async fn create(&self, document: &Document) -> Result<(), anyhow::Error> {
        let response = self
            .client
            .put(&self.url)
            .header("X-Master-Key", &self.master_key)
            .header("X-Bin-Versioning", "false")
            .json(document)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("JsonBin: create failed with status {}.", response.status());
        }

        Ok(())
    }
}
