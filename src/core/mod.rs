//! Core business logic - framework-agnostic booking rules over the relational store.

/// Seat availability derived from train capacity and sold tickets
pub mod availability;
/// Crew members
pub mod crew;
/// Journey scheduling and listings
pub mod journey;
/// Atomic ticket purchases
pub mod order;
/// Page-number pagination
pub mod pagination;
/// Route catalog and search
pub mod route;
/// Reference data seeding
pub mod seed;
/// Stations
pub mod station;
/// Ticket bounds and seat conflicts
pub mod ticket;
/// Trains and train types
pub mod train;
/// View models for list and detail reads
pub mod views;
