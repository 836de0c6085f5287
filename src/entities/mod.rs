//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod crew;
pub mod journey;
pub mod journey_crew;
pub mod order;
pub mod route;
pub mod station;
pub mod ticket;
pub mod train;
pub mod train_type;

// Re-export specific types to avoid conflicts
pub use crew::{Column as CrewColumn, Entity as Crew, Model as CrewModel};
pub use journey::{Column as JourneyColumn, Entity as Journey, Model as JourneyModel};
pub use journey_crew::{
    Column as JourneyCrewColumn, Entity as JourneyCrew, Model as JourneyCrewModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use route::{Column as RouteColumn, Entity as Route, Model as RouteModel};
pub use station::{Column as StationColumn, Entity as Station, Model as StationModel};
pub use ticket::{Column as TicketColumn, Entity as Ticket, Model as TicketModel};
pub use train::{Column as TrainColumn, Entity as Train, Model as TrainModel};
pub use train_type::{Column as TrainTypeColumn, Entity as TrainType, Model as TrainTypeModel};
