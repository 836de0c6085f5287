//! Crew business logic.

use crate::{
    core::views::CrewListItem,
    entities::{Crew, JourneyCrew, crew, journey_crew},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, warn};

/// Fields of a crew write
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCrew {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

fn validate(new: &NewCrew) -> Result<(String, String)> {
    let first = new.first_name.trim();
    let last = new.last_name.trim();
    if first.is_empty() || last.is_empty() {
        return Err(Error::InvalidValue {
            field: "name",
            message: "first and last name are required".to_string(),
        });
    }
    Ok((first.to_string(), last.to_string()))
}

/// Creates a crew member.
pub async fn create_crew<C>(db: &C, new: NewCrew) -> Result<crew::Model>
where
    C: ConnectionTrait,
{
    let (first_name, last_name) = validate(&new)?;
    let model = crew::ActiveModel {
        first_name: Set(first_name),
        last_name: Set(last_name),
        ..Default::default()
    };
    let crew = model.insert(db).await?;
    info!("Created crew {} '{}'", crew.id, crew.full_name());
    Ok(crew)
}

/// Finds a crew member by id.
pub async fn get_crew_by_id<C>(db: &C, crew_id: i64) -> Result<crew::Model>
where
    C: ConnectionTrait,
{
    Crew::find_by_id(crew_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "crew",
            id: crew_id,
        })
}

/// Lists crew ordered by last then first name.
pub async fn list_crew(db: &DatabaseConnection) -> Result<Vec<CrewListItem>> {
    let crew = Crew::find()
        .order_by_asc(crew::Column::LastName)
        .order_by_asc(crew::Column::FirstName)
        .all(db)
        .await?;
    Ok(crew.iter().map(CrewListItem::from).collect())
}

/// Replaces a crew member's names.
pub async fn update_crew(db: &DatabaseConnection, crew_id: i64, new: NewCrew) -> Result<crew::Model> {
    let (first_name, last_name) = validate(&new)?;
    let existing = get_crew_by_id(db, crew_id).await?;
    let mut model: crew::ActiveModel = existing.into();
    model.first_name = Set(first_name);
    model.last_name = Set(last_name);
    model.update(db).await.map_err(Into::into)
}

/// Deletes a crew member not assigned to any journey.
pub async fn delete_crew(db: &DatabaseConnection, crew_id: i64) -> Result<()> {
    get_crew_by_id(db, crew_id).await?;

    let assignments = JourneyCrew::find()
        .filter(journey_crew::Column::CrewId.eq(crew_id))
        .count(db)
        .await?;
    if assignments > 0 {
        warn!(
            "Refusing to delete crew {}: assigned to {} journeys",
            crew_id, assignments
        );
        return Err(Error::InUse {
            entity: "crew",
            id: crew_id,
            referenced_by: "journeys",
        });
    }

    Crew::delete_by_id(crew_id).exec(db).await?;
    info!("Deleted crew {}", crew_id);
    Ok(())
}
