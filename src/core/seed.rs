//! Idempotent seeding of reference data from configuration.
//!
//! Records are matched by name. Anything already present is skipped, so running
//! the seed on every startup is safe.

use crate::{
    config::settings::SeedData,
    core::{
        crew::{NewCrew, create_crew},
        station::{NewStation, create_station, get_station_by_name},
        train::{NewTrain, create_train, create_train_type, get_train_by_name},
    },
    entities::{Crew, TrainType, crew, train_type},
    errors::Result,
};
use sea_orm::{DatabaseConnection, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Number of records created by a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Stations created
    pub stations: usize,
    /// Train types created
    pub train_types: usize,
    /// Trains created
    pub trains: usize,
    /// Crew members created
    pub crew: usize,
}

async fn ensure_train_type<C>(
    db: &C,
    name: &str,
    known: &mut HashMap<String, i64>,
    summary: &mut SeedSummary,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    if let Some(id) = known.get(name) {
        return Ok(*id);
    }
    let existing = TrainType::find()
        .filter(train_type::Column::Name.eq(name))
        .one(db)
        .await?;
    let id = match existing {
        Some(train_type) => train_type.id,
        None => {
            summary.train_types += 1;
            create_train_type(db, name).await?.id
        }
    };
    known.insert(name.to_string(), id);
    Ok(id)
}

async fn insert_seed<C>(txn: &C, seed: &SeedData) -> Result<SeedSummary>
where
    C: ConnectionTrait,
{
    let mut summary = SeedSummary::default();

    for station in &seed.stations {
        if get_station_by_name(txn, station.name.trim()).await?.is_some() {
            debug!("Station '{}' already exists. Skipping.", station.name);
            continue;
        }
        create_station(
            txn,
            NewStation {
                name: station.name.clone(),
                latitude: station.latitude,
                longitude: station.longitude,
            },
        )
        .await?;
        summary.stations += 1;
    }

    let mut train_types = HashMap::new();
    for name in &seed.train_types {
        ensure_train_type(txn, name.trim(), &mut train_types, &mut summary).await?;
    }

    for train in &seed.trains {
        if get_train_by_name(txn, train.name.trim()).await?.is_some() {
            debug!("Train '{}' already exists. Skipping.", train.name);
            continue;
        }
        let train_type_id =
            ensure_train_type(txn, train.train_type.trim(), &mut train_types, &mut summary)
                .await?;
        create_train(
            txn,
            NewTrain {
                name: train.name.clone(),
                cargo_num: train.cargo_num,
                place_in_cargo: train.place_in_cargo,
                train_type_id,
            },
        )
        .await?;
        summary.trains += 1;
    }

    for member in &seed.crew {
        let existing = Crew::find()
            .filter(crew::Column::FirstName.eq(member.first_name.trim()))
            .filter(crew::Column::LastName.eq(member.last_name.trim()))
            .one(txn)
            .await?;
        if existing.is_some() {
            continue;
        }
        create_crew(
            txn,
            NewCrew {
                first_name: member.first_name.clone(),
                last_name: member.last_name.clone(),
            },
        )
        .await?;
        summary.crew += 1;
    }

    Ok(summary)
}

/// Creates the configured reference data that does not exist yet, in one transaction.
#[instrument(skip(db, seed))]
pub async fn seed_reference_data(db: &DatabaseConnection, seed: &SeedData) -> Result<SeedSummary> {
    let txn = db.begin().await?;
    match insert_seed(&txn, seed).await {
        Ok(summary) => {
            txn.commit().await?;
            info!(
                "Seeded {} stations, {} train types, {} trains, {} crew",
                summary.stations, summary.train_types, summary.trains, summary.crew
            );
            Ok(summary)
        }
        Err(e) => {
            txn.rollback().await?;
            warn!("Seeding rolled back: {}", e);
            Err(e)
        }
    }
}
