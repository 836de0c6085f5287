use rail_booking::{
    config::{
        self,
        database::{create_connection, create_tables, get_database_url},
    },
    core::{
        journey::{JourneyFilter, list_journeys},
        seed::seed_reference_data,
    },
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Connect and make sure the schema exists
    let database_url = get_database_url(app_config.database_url.as_deref());
    let db = create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed reference data from the config
    seed_reference_data(&db, &app_config.seed)
        .await
        .inspect_err(|e| error!("Failed to seed reference data: {}", e))?;

    // 6. Report what is on sale
    let journeys = list_journeys(&db, &JourneyFilter::default()).await?;
    info!("{} journeys scheduled", journeys.len());
    for journey in &journeys {
        info!(
            "Journey {} {} ({}) departs {}: {} seats available",
            journey.summary.id,
            journey.summary.route,
            journey.summary.train,
            journey.summary.departure_time,
            journey.tickets_available
        );
    }

    Ok(())
}
