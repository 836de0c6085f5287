//! Train and train type business logic.
//!
//! Train names are unique and every train has a positive car count and a positive
//! number of seats per car. Train types are free-text labels.

use crate::{
    core::views::TrainListItem,
    entities::{Journey, Train, TrainType, journey, train, train_type},
    errors::{Error, Result, is_unique_violation},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, warn};

/// Fields of a train write
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTrain {
    /// Train name, trimmed before storing
    pub name: String,
    /// Number of cars
    pub cargo_num: i32,
    /// Seats per car
    pub place_in_cargo: i32,
    /// Classification
    pub train_type_id: i64,
}

/// Creates a train type.
pub async fn create_train_type<C>(db: &C, name: &str) -> Result<train_type::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidValue {
            field: "name",
            message: "train type name cannot be empty".to_string(),
        });
    }

    let model = train_type::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    let train_type = model.insert(db).await?;
    info!("Created train type {} '{}'", train_type.id, train_type.name);
    Ok(train_type)
}

/// Finds a train type by id.
pub async fn get_train_type_by_id<C>(db: &C, train_type_id: i64) -> Result<train_type::Model>
where
    C: ConnectionTrait,
{
    TrainType::find_by_id(train_type_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "train type",
            id: train_type_id,
        })
}

/// Lists train types ordered by name.
pub async fn list_train_types(db: &DatabaseConnection) -> Result<Vec<train_type::Model>> {
    TrainType::find()
        .order_by_asc(train_type::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Renames a train type.
pub async fn update_train_type(
    db: &DatabaseConnection,
    train_type_id: i64,
    name: &str,
) -> Result<train_type::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidValue {
            field: "name",
            message: "train type name cannot be empty".to_string(),
        });
    }
    let existing = get_train_type_by_id(db, train_type_id).await?;
    let mut model: train_type::ActiveModel = existing.into();
    model.name = Set(name.to_string());
    model.update(db).await.map_err(Into::into)
}

/// Deletes a train type that no train uses.
pub async fn delete_train_type(db: &DatabaseConnection, train_type_id: i64) -> Result<()> {
    get_train_type_by_id(db, train_type_id).await?;

    let trains = Train::find()
        .filter(train::Column::TrainTypeId.eq(train_type_id))
        .count(db)
        .await?;
    if trains > 0 {
        warn!(
            "Refusing to delete train type {}: used by {} trains",
            train_type_id, trains
        );
        return Err(Error::InUse {
            entity: "train type",
            id: train_type_id,
            referenced_by: "trains",
        });
    }

    TrainType::delete_by_id(train_type_id).exec(db).await?;
    info!("Deleted train type {}", train_type_id);
    Ok(())
}

fn validate(new: &NewTrain) -> Result<String> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidValue {
            field: "name",
            message: "train name cannot be empty".to_string(),
        });
    }
    if new.cargo_num <= 0 {
        return Err(Error::InvalidValue {
            field: "cargo_num",
            message: format!("must be a positive integer, got {}", new.cargo_num),
        });
    }
    if new.place_in_cargo <= 0 {
        return Err(Error::InvalidValue {
            field: "place_in_cargo",
            message: format!("must be a positive integer, got {}", new.place_in_cargo),
        });
    }
    Ok(name.to_string())
}

async fn ensure_name_free<C>(db: &C, name: &str, except_id: Option<i64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut query = Train::find().filter(train::Column::Name.eq(name));
    if let Some(id) = except_id {
        query = query.filter(train::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(Error::DuplicateKey {
            entity: "train",
            key: name.to_string(),
        });
    }
    Ok(())
}

fn duplicate_or_db(err: DbErr, name: String) -> Error {
    if is_unique_violation(&err) {
        Error::DuplicateKey {
            entity: "train",
            key: name,
        }
    } else {
        err.into()
    }
}

/// Creates a train after checking its layout, type and name.
pub async fn create_train<C>(db: &C, new: NewTrain) -> Result<train::Model>
where
    C: ConnectionTrait,
{
    let name = validate(&new)?;
    get_train_type_by_id(db, new.train_type_id).await?;
    ensure_name_free(db, &name, None).await?;

    let model = train::ActiveModel {
        name: Set(name.clone()),
        cargo_num: Set(new.cargo_num),
        place_in_cargo: Set(new.place_in_cargo),
        train_type_id: Set(new.train_type_id),
        ..Default::default()
    };
    let train = model
        .insert(db)
        .await
        .map_err(|e| duplicate_or_db(e, name))?;

    info!(
        "Created train {} '{}' ({} cars x {} seats)",
        train.id, train.name, train.cargo_num, train.place_in_cargo
    );
    Ok(train)
}

/// Finds a train by id.
pub async fn get_train_by_id<C>(db: &C, train_id: i64) -> Result<train::Model>
where
    C: ConnectionTrait,
{
    Train::find_by_id(train_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "train",
            id: train_id,
        })
}

/// Finds a train by exact name.
pub async fn get_train_by_name<C>(db: &C, name: &str) -> Result<Option<train::Model>>
where
    C: ConnectionTrait,
{
    Train::find()
        .filter(train::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists trains ordered by name, with the train type shown by name.
pub async fn list_trains(db: &DatabaseConnection) -> Result<Vec<TrainListItem>> {
    let rows = Train::find()
        .find_also_related(TrainType)
        .order_by_asc(train::Column::Name)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(train, train_type)| TrainListItem {
            id: train.id,
            name: train.name,
            cargo_num: train.cargo_num,
            place_in_cargo: train.place_in_cargo,
            train_type: train_type.map(|t| t.name).unwrap_or_default(),
        })
        .collect())
}

/// Replaces the fields of an existing train.
pub async fn update_train(
    db: &DatabaseConnection,
    train_id: i64,
    new: NewTrain,
) -> Result<train::Model> {
    let name = validate(&new)?;
    let existing = get_train_by_id(db, train_id).await?;
    get_train_type_by_id(db, new.train_type_id).await?;
    ensure_name_free(db, &name, Some(train_id)).await?;

    let mut model: train::ActiveModel = existing.into();
    model.name = Set(name.clone());
    model.cargo_num = Set(new.cargo_num);
    model.place_in_cargo = Set(new.place_in_cargo);
    model.train_type_id = Set(new.train_type_id);
    let train = model
        .update(db)
        .await
        .map_err(|e| duplicate_or_db(e, name))?;

    info!("Updated train {} '{}'", train.id, train.name);
    Ok(train)
}

/// Deletes a train that runs no journeys.
pub async fn delete_train(db: &DatabaseConnection, train_id: i64) -> Result<()> {
    get_train_by_id(db, train_id).await?;

    let journeys = Journey::find()
        .filter(journey::Column::TrainId.eq(train_id))
        .count(db)
        .await?;
    if journeys > 0 {
        warn!(
            "Refusing to delete train {}: scheduled on {} journeys",
            train_id, journeys
        );
        return Err(Error::InUse {
            entity: "train",
            id: train_id,
            referenced_by: "journeys",
        });
    }

    Train::delete_by_id(train_id).exec(db).await?;
    info!("Deleted train {}", train_id);
    Ok(())
}
