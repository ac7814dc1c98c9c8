use std::{
    future::Future,
    io::{self, Write},
};

use anyhow::Context;
use chrono::{DateTime, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use pstryk_core::{
    Config, MeterResolution, PricingResolution, PstrykApi, PstrykClient, QueryParams,
    UsageResolution, client_from_config, format_timestamp,
};
use tracing::{debug, info};

use crate::{
    logging::{LogFormat, LogLevel},
    render::{self, OutputFormat, Report},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "pstryk", version, about = "Pstryk energy data CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// API key; overrides the stored configuration.
    #[arg(long, global = true, env = "PSTRYK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API base URL; overrides the stored configuration.
    #[arg(long, global = true, env = "PSTRYK_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true, env = "PSTRYK_LOG", value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key (and optionally a custom base URL).
    Configure,

    #[command(flatten)]
    Query(QueryCommand),
}

#[derive(Debug, Subcommand)]
pub enum QueryCommand {
    /// Carbon footprint of the metered energy.
    Carbon {
        /// hour, day, week or month.
        #[arg(short, long, default_value = "day")]
        resolution: MeterResolution,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Cost of bought energy and value of sold energy.
    Cost {
        /// hour, day, week or month.
        #[arg(short, long, default_value = "day")]
        resolution: MeterResolution,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Energy bought from and returned to the grid.
    Usage {
        /// hour, day, week, month or year.
        #[arg(short, long, default_value = "day")]
        resolution: UsageResolution,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Energy purchase prices.
    Pricing {
        /// hour, day, month or year.
        #[arg(short, long, default_value = "hour")]
        resolution: PricingResolution,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Prices for energy returned to the grid by prosumers.
    ProsumerPricing {
        /// hour, day, month or year.
        #[arg(short, long, default_value = "hour")]
        resolution: PricingResolution,

        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Window start, ISO-8601 UTC. Defaults to today 00:00 UTC.
    #[arg(long)]
    pub start: Option<String>,

    /// Window end (exclusive), ISO-8601 UTC.
    #[arg(long)]
    pub end: Option<String>,

    /// IANA timezone for frame boundaries, e.g. Europe/Warsaw.
    #[arg(long)]
    pub tz: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

impl QueryArgs {
    pub fn params<R>(&self, resolution: R, now: DateTime<Utc>) -> QueryParams<R> {
        let start = self.start.clone().unwrap_or_else(|| start_of_day(now));

        let mut params = QueryParams::new(resolution, start);
        params.window_end = self.end.clone();
        params.for_tz = self.tz.clone();
        params
    }
}

fn start_of_day(now: DateTime<Utc>) -> String {
    format_timestamp(now.date_naive().and_time(NaiveTime::MIN).and_utc())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli { command, api_key, base_url, .. } = self;

        let config = Config::load()?;
        debug!(
            path = ?Config::config_file_path().ok(),
            configured = config.is_configured(),
            "loaded config"
        );

        match command {
            Command::Configure => configure(config),
            Command::Query(query) => {
                let config = config.with_overrides(api_key, base_url);
                let api = client_from_config(&config)?;
                query.run(api.as_ref(), Utc::now(), &mut io::stdout()).await
            }
        }
    }
}

impl QueryCommand {
    pub async fn run<W: Write>(
        self,
        api: &dyn PstrykApi,
        now: DateTime<Utc>,
        out: &mut W,
    ) -> anyhow::Result<()> {
        match self {
            QueryCommand::Carbon { resolution, query } => {
                let params = query.params(resolution, now);
                emit("carbon-footprint", query.output, api.carbon_footprint(&params), out).await
            }
            QueryCommand::Cost { resolution, query } => {
                let params = query.params(resolution, now);
                emit("energy-cost", query.output, api.energy_cost(&params), out).await
            }
            QueryCommand::Usage { resolution, query } => {
                let params = query.params(resolution, now);
                emit("energy-usage", query.output, api.energy_usage(&params), out).await
            }
            QueryCommand::Pricing { resolution, query } => {
                let params = query.params(resolution, now);
                emit("pricing", query.output, api.pricing(&params), out).await
            }
            QueryCommand::ProsumerPricing { resolution, query } => {
                let params = query.params(resolution, now);
                emit("prosumer-pricing", query.output, api.prosumer_pricing(&params), out).await
            }
        }
    }
}

async fn emit<R, F, W>(
    endpoint: &str,
    output: OutputFormat,
    request: F,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: Report,
    F: Future<Output = pstryk_core::Result<R>>,
    W: Write,
{
    info!(endpoint, "sending request");

    let response = request.await.with_context(|| format!("{endpoint} request failed"))?;

    info!(endpoint, "received response");

    render::write(out, &response, output)
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("Pstryk API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let base_url = Text::new("API base URL:")
        .with_default(config.base_url())
        .prompt()
        .context("Failed to read base URL")?;

    // Validates both values without touching the network.
    PstrykClient::with_base_url(&api_key, &base_url)?;

    config.set_api_key(api_key);
    config.set_base_url(base_url);
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).expect("arguments should parse")
    }

    fn query(args: &[&str]) -> QueryCommand {
        match parse(args).command {
            Command::Query(query) => query,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn configure_takes_no_arguments() {
        assert!(matches!(parse(&["pstryk", "configure"]).command, Command::Configure));
    }

    #[test]
    fn pricing_defaults_to_hourly_table() {
        match query(&["pstryk", "pricing"]) {
            QueryCommand::Pricing { resolution, query } => {
                assert_eq!(resolution, PricingResolution::Hour);
                assert_eq!(query.output, OutputFormat::Table);
                assert_eq!(query.start, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn usage_accepts_year_resolution_and_window() {
        let cmd = query(&[
            "pstryk",
            "usage",
            "--resolution",
            "year",
            "--start",
            "2023-01-01T00:00:00Z",
            "--end",
            "2024-01-01T00:00:00Z",
            "--tz",
            "Europe/Warsaw",
            "-o",
            "json",
        ]);

        match cmd {
            QueryCommand::Usage { resolution, query } => {
                assert_eq!(resolution, UsageResolution::Year);
                assert_eq!(query.end.as_deref(), Some("2024-01-01T00:00:00Z"));
                assert_eq!(query.tz.as_deref(), Some("Europe/Warsaw"));
                assert_eq!(query.output, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cost_rejects_year_resolution() {
        let err = Cli::try_parse_from(["pstryk", "cost", "--resolution", "year"]).unwrap_err();
        assert!(err.to_string().contains("invalid resolution 'year'"));
    }

    #[test]
    fn prosumer_pricing_rejects_week_resolution() {
        assert!(Cli::try_parse_from(["pstryk", "prosumer-pricing", "-r", "week"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&[
            "pstryk",
            "carbon",
            "--api-key",
            "KEY",
            "--base-url",
            "http://localhost:1234",
            "--log-level",
            "debug",
        ]);

        assert_eq!(cli.api_key.as_deref(), Some("KEY"));
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:1234"));
        assert_eq!(cli.log_level, LogLevel::Debug);
    }

    #[test]
    fn params_default_start_to_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 17, 42, 5).unwrap();

        match query(&["pstryk", "carbon", "--end", "2024-03-10T00:00:00Z"]) {
            QueryCommand::Carbon { resolution, query } => {
                let params = query.params(resolution, now);
                assert_eq!(params.resolution, MeterResolution::Day);
                assert_eq!(params.window_start, "2024-03-09T00:00:00Z");
                assert_eq!(params.window_end.as_deref(), Some("2024-03-10T00:00:00Z"));
                assert_eq!(params.for_tz, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn explicit_start_is_passed_through_unchanged() {
        match query(&["pstryk", "usage", "--start", "2024-01-01T00:00:00+01:00"]) {
            QueryCommand::Usage { resolution, query } => {
                let params = query.params(resolution, Utc::now());
                assert_eq!(params.window_start, "2024-01-01T00:00:00+01:00");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn pricing_command_prints_json_response() {
        let server = MockServer::start().await;
        let body = json!({
            "resolution": "hour",
            "frames": [{
                "start": "2024-03-09T00:00:00Z",
                "end": "2024-03-09T01:00:00Z",
                "price_net": 0.25,
                "price_gross": 0.5,
                "is_cheap": true,
                "is_expensive": false,
                "is_live": false
            }],
            "price_net_avg": 0.25,
            "price_gross_avg": 0.5
        });

        Mock::given(method("GET"))
            .and(path("/integrations/pricing/"))
            .and(query_param("window_start", "2024-03-09T00:00:00Z"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let api = PstrykClient::with_base_url("KEY", &server.uri()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let mut out = Vec::new();

        query(&["pstryk", "pricing", "-o", "json"]).run(&api, now, &mut out).await.unwrap();

        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed, body);
    }

    #[tokio::test]
    async fn failed_request_names_endpoint_and_status() {
        let server = MockServer::start().await;

        Mock::given(path("/integrations/meter-data/energy-cost/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let api = PstrykClient::with_base_url("KEY", &server.uri()).unwrap();
        let mut out = Vec::new();

        let err = query(&["pstryk", "cost"]).run(&api, Utc::now(), &mut out).await.unwrap_err();

        assert!(err.to_string().contains("energy-cost request failed"));
        let status = err.downcast_ref::<pstryk_core::Error>().and_then(|e| e.status());
        assert_eq!(status.map(|s| s.as_u16()), Some(401));
        assert!(out.is_empty());
    }
}
