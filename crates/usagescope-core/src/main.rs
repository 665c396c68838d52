//! UsageScope CLI
//!
//! Command-line interface for the UsageScope usage-aggregation client.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use usagescope::client::{AggregationClient, FixtureProvider, LiveProvider, UsageDataProvider};
use usagescope::models::{group_usage, AggregationType, EntityType, FilterCriteria};
use usagescope::Config;

/// UsageScope - terminal client for metered-usage billing aggregation
#[derive(Parser)]
#[command(name = "usagescope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "USAGESCOPE_CONFIG")]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum EntityTypeArg {
    #[default]
    Entitlement,
    Account,
}

impl From<EntityTypeArg> for EntityType {
    fn from(value: EntityTypeArg) -> Self {
        match value {
            EntityTypeArg::Entitlement => Self::Entitlement,
            EntityTypeArg::Account => Self::Account,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum AggregationArg {
    #[default]
    RequestGroup,
    Sku,
}

impl From<AggregationArg> for AggregationType {
    fn from(value: AggregationArg) -> Self {
        match value {
            AggregationArg::RequestGroup => Self::RequestGroup,
            AggregationArg::Sku => Self::Sku,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive query form
    Tui {
        /// Refresh rate in milliseconds
        #[arg(long)]
        refresh: Option<u64>,

        /// Use canned fixture data instead of the live backend
        #[arg(long)]
        fixture: bool,
    },

    /// Run a single aggregation query and print the grouped rows
    Query {
        /// Request group id
        #[arg(long)]
        request_group: String,

        /// Entitlement or account id
        #[arg(long)]
        entity: String,

        /// What the entity id refers to
        #[arg(long, value_enum, default_value = "entitlement")]
        entity_type: EntityTypeArg,

        /// Optional SKU filter
        #[arg(long)]
        sku: Option<String>,

        /// Grouping strategy
        #[arg(long, value_enum, default_value = "request-group")]
        aggregation: AggregationArg,

        /// Use canned fixture data instead of the live backend
        #[arg(long)]
        fixture: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Tui { refresh, fixture } => run_tui(config, refresh, fixture).await,
        Commands::Query {
            request_group,
            entity,
            entity_type,
            sku,
            aggregation,
            fixture,
        } => {
            let criteria = FilterCriteria {
                request_group_id: request_group,
                entity_id: entity,
                entity_type: entity_type.into(),
                sku_id: sku.unwrap_or_default(),
                aggregation_type: aggregation.into(),
            };
            run_query(config, criteria, fixture, cli.format).await
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_provider(config: &Config, fixture: bool) -> anyhow::Result<Arc<dyn UsageDataProvider>> {
    if fixture {
        info!("using fixture usage data provider");
        Ok(Arc::new(FixtureProvider))
    } else {
        let client = AggregationClient::new(&config.api)?;
        Ok(Arc::new(LiveProvider::new(client)))
    }
}

async fn run_tui(config: Config, refresh: Option<u64>, fixture: bool) -> anyhow::Result<()> {
    let refresh = refresh.unwrap_or(config.tui.refresh_rate_ms);
    info!(refresh_ms = refresh, "starting TUI");

    let provider = build_provider(&config, fixture)?;
    let mut app = usagescope::tui::App::new(provider).with_refresh_rate(refresh);
    app.run().await?;
    Ok(())
}

async fn run_query(
    config: Config,
    criteria: FilterCriteria,
    fixture: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    criteria
        .validate()
        .map_err(|e| usagescope::Error::validation(e.message))?;

    let provider = build_provider(&config, fixture)?;
    let records = provider.fetch_usage(&criteria).await?;
    let rows = group_usage(&records, criteria.aggregation_type);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            let show_sku = criteria.aggregation_type == AggregationType::Sku
                || criteria.has_sku_filter();

            print!("{:<20} {:<20} ", "Request Group Id", criteria.entity_type.id_label());
            if show_sku {
                print!("{:<12} ", "SKU");
            }
            println!("{:>16}", "Aggregated Total");

            for row in &rows {
                print!("{:<20} {:<20} ", row.request_group_id, row.entity_id);
                if show_sku {
                    print!("{:<12} ", row.sku_id.as_deref().unwrap_or("-"));
                }
                println!("{:>16.2}", row.aggregated_total);
            }

            if rows.is_empty() {
                println!("(no usage found)");
            }
        }
    }

    Ok(())
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "usagescope", &mut io::stdout());
}
