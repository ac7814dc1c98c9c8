use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Config,
    error::{Error, Result},
    model::{
        CarbonFootprintParams, EnergyCostParams, EnergyUsageParams, MeterCarbonFootprintResponse,
        MeterEnergyCostResponse, MeterEnergyUsageResponse, PricingParams, PricingResponse,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.pstryk.pl";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const CARBON_FOOTPRINT_PATH: &str = "/integrations/meter-data/carbon-footprint/";
pub const ENERGY_COST_PATH: &str = "/integrations/meter-data/energy-cost/";
pub const ENERGY_USAGE_PATH: &str = "/integrations/meter-data/energy-usage/";
pub const PRICING_PATH: &str = "/integrations/pricing/";
pub const PROSUMER_PRICING_PATH: &str = "/integrations/prosumer-pricing/";

/// The five read-only queries of the Pstryk integrations API.
///
/// Each call is a single GET. Nothing is retried, cached or logged; a failed
/// request comes back as [`Error::Http`] carrying the original status code.
#[async_trait]
pub trait PstrykApi: Send + Sync + Debug {
    async fn carbon_footprint(
        &self,
        params: &CarbonFootprintParams,
    ) -> Result<MeterCarbonFootprintResponse>;

    async fn energy_cost(&self, params: &EnergyCostParams) -> Result<MeterEnergyCostResponse>;

    async fn energy_usage(&self, params: &EnergyUsageParams) -> Result<MeterEnergyUsageResponse>;

    async fn pricing(&self, params: &PricingParams) -> Result<PricingResponse>;

    async fn prosumer_pricing(&self, params: &PricingParams) -> Result<PricingResponse>;
}

/// HTTP gateway to the API. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct PstrykClient {
    base_url: String,
    http: Client,
}

impl PstrykClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        Self::build(api_key, base_url, REQUEST_TIMEOUT)
    }

    fn build(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        let parsed = Url::parse(base_url).map_err(|e| Error::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let mut authorization =
            HeaderValue::from_str(&format!("sk-{api_key}")).map_err(|_| Error::InvalidApiKey)?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, authorization);

        let http = Client::builder().timeout(timeout).default_headers(headers).build()?;

        Ok(Self { base_url: parsed.as_str().trim_end_matches('/').to_string(), http })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<P, T>(&self, path: &str, params: &P) -> Result<T>
    where
        P: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response =
            self.http.get(self.endpoint(path)).query(params).send().await?.error_for_status()?;

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PstrykApi for PstrykClient {
    async fn carbon_footprint(
        &self,
        params: &CarbonFootprintParams,
    ) -> Result<MeterCarbonFootprintResponse> {
        self.get(CARBON_FOOTPRINT_PATH, params).await
    }

    async fn energy_cost(&self, params: &EnergyCostParams) -> Result<MeterEnergyCostResponse> {
        self.get(ENERGY_COST_PATH, params).await
    }

    async fn energy_usage(&self, params: &EnergyUsageParams) -> Result<MeterEnergyUsageResponse> {
        self.get(ENERGY_USAGE_PATH, params).await
    }

    async fn pricing(&self, params: &PricingParams) -> Result<PricingResponse> {
        self.get(PRICING_PATH, params).await
    }

    async fn prosumer_pricing(&self, params: &PricingParams) -> Result<PricingResponse> {
        self.get(PROSUMER_PRICING_PATH, params).await
    }
}

/// Construct a client from the stored configuration.
pub fn client_from_config(config: &Config) -> anyhow::Result<Box<dyn PstrykApi>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
             Hint: run `pstryk configure` and enter your API key."
        )
    })?;

    let client = PstrykClient::with_base_url(api_key, config.base_url())?;

    Ok(Box::new(client))
}
