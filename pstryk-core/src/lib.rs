//! Core library for the `pstryk` CLI.
//!
//! This crate defines:
//! - A typed client for the Pstryk integrations API (energy usage, cost,
//!   carbon footprint and pricing)
//! - Per-endpoint query parameters and response frames
//! - Configuration & credentials handling
//!
//! It is used by `pstryk-cli`, but can also be reused by other binaries or services.
//!
//! ```no_run
//! use pstryk_core::{PstrykApi, PstrykClient, UsageResolution, EnergyUsageParams};
//!
//! # async fn run() -> pstryk_core::Result<()> {
//! let client = PstrykClient::new("my-api-key")?;
//! let params = EnergyUsageParams::new(UsageResolution::Day, "2024-01-01T00:00:00Z")
//!     .window_end("2024-02-01T00:00:00Z");
//! let usage = client.energy_usage(&params).await?;
//! println!("{} frames, {:?} kWh bought", usage.frames.len(), usage.fae_total_usage);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;

pub use client::{DEFAULT_BASE_URL, PstrykApi, PstrykClient, REQUEST_TIMEOUT, client_from_config};
pub use config::Config;
pub use error::{Error, Result};
pub use model::{
    CarbonFootprintFrame, CarbonFootprintParams, EnergyCostFrame, EnergyCostParams,
    EnergyUsageFrame, EnergyUsageParams, MeterCarbonFootprintResponse, MeterEnergyCostResponse,
    MeterEnergyUsageResponse, MeterResolution, ParseResolutionError, PricingFrame, PricingParams,
    PricingResolution, PricingResponse, QueryParams, UsageResolution, format_timestamp, metric,
};
