use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Returned when a resolution string is not accepted by the target endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resolution '{value}', expected one of: {}", .allowed.join(", "))]
pub struct ParseResolutionError {
    pub value: String,
    pub allowed: &'static [&'static str],
}

macro_rules! resolution {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub const fn all() -> &'static [$name] {
                &[$($name::$variant),+]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseResolutionError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let lower = value.trim().to_lowercase();

                $name::all()
                    .iter()
                    .copied()
                    .find(|r| r.as_str() == lower)
                    .ok_or_else(|| ParseResolutionError {
                        value: value.to_string(),
                        allowed: &[$($wire),+],
                    })
            }
        }
    };
}

resolution! {
    /// Aggregation granularity accepted by the carbon-footprint and energy-cost endpoints.
    MeterResolution {
        Hour => "hour",
        Day => "day",
        Week => "week",
        Month => "month",
    }
}

resolution! {
    /// Aggregation granularity accepted by the energy-usage endpoint.
    UsageResolution {
        Hour => "hour",
        Day => "day",
        Week => "week",
        Month => "month",
        Year => "year",
    }
}

resolution! {
    /// Aggregation granularity accepted by the pricing endpoints. There is no `week`.
    PricingResolution {
        Hour => "hour",
        Day => "day",
        Month => "month",
        Year => "year",
    }
}

/// Query string of every endpoint.
///
/// Timestamps are sent exactly as given; use [`format_timestamp`] to build them
/// from a `DateTime<Utc>`. `window_end` is an exclusive bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParams<R> {
    pub resolution: R,
    pub window_start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_tz: Option<String>,
}

impl<R> QueryParams<R> {
    pub fn new(resolution: R, window_start: impl Into<String>) -> Self {
        Self { resolution, window_start: window_start.into(), window_end: None, for_tz: None }
    }

    pub fn window_end(mut self, window_end: impl Into<String>) -> Self {
        self.window_end = Some(window_end.into());
        self
    }

    /// IANA timezone name, e.g. `Europe/Warsaw`.
    pub fn for_tz(mut self, tz: impl Into<String>) -> Self {
        self.for_tz = Some(tz.into());
        self
    }
}

pub type CarbonFootprintParams = QueryParams<MeterResolution>;
pub type EnergyCostParams = QueryParams<MeterResolution>;
pub type EnergyUsageParams = QueryParams<UsageResolution>;
/// Shared by the pricing and prosumer-pricing endpoints.
pub type PricingParams = QueryParams<PricingResolution>;

/// ISO-8601 UTC with second precision, the form the API documents.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Numeric value of a metric, `None` while the interval is incomplete.
pub fn metric(value: &Option<Number>) -> Option<f64> {
    value.as_ref().and_then(Number::as_f64)
}

// Frame timestamps stay as the server wrote them and metrics keep their
// integer or float form, so a decoded response serializes back unchanged.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonFootprintFrame {
    pub start: String,
    pub end: String,
    /// Grams of CO2.
    pub carbon_footprint: Option<Number>,
    pub is_live: bool,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterCarbonFootprintResponse {
    pub resolution: MeterResolution,
    pub frames: Vec<CarbonFootprintFrame>,
    pub total_carbon_footprint: Option<Number>,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyCostFrame {
    pub start: String,
    pub end: String,
    /// Cost of energy purchased from the grid.
    pub fae_cost: Option<Number>,
    pub var_dist_cost_net: Option<Number>,
    pub fix_dist_cost_net: Option<Number>,
    pub energy_cost_net: Option<Number>,
    pub service_cost_net: Option<Number>,
    pub excise: Option<Number>,
    pub vat: Option<Number>,
    /// Value of energy returned to the grid.
    pub energy_sold_value: Option<Number>,
    pub energy_balance_value: Option<Number>,
    pub is_live: bool,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterEnergyCostResponse {
    pub resolution: MeterResolution,
    pub frames: Vec<EnergyCostFrame>,
    pub fae_total_cost: Option<Number>,
    pub total_energy_sold_value: Option<Number>,
    pub total_energy_balance_value: Option<Number>,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyUsageFrame {
    pub start: String,
    pub end: String,
    /// kWh purchased from the grid.
    pub fae_usage: Option<Number>,
    /// kWh returned to the grid.
    pub rae: Option<Number>,
    pub energy_balance: Option<Number>,
    pub is_live: bool,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterEnergyUsageResponse {
    pub resolution: UsageResolution,
    pub frames: Vec<EnergyUsageFrame>,
    pub fae_total_usage: Option<Number>,
    pub rae_total: Option<Number>,
    pub energy_balance: Option<Number>,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingFrame {
    pub start: String,
    pub end: String,
    pub price_net: Option<Number>,
    pub price_gross: Option<Number>,
    pub is_cheap: Option<bool>,
    pub is_expensive: Option<bool>,
    pub is_live: bool,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Returned by both the pricing and prosumer-pricing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResponse {
    pub resolution: PricingResolution,
    pub frames: Vec<PricingFrame>,
    pub price_net_avg: Option<Number>,
    pub price_gross_avg: Option<Number>,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}
