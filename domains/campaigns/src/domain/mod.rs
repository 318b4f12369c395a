//! Campaigns domain layer: entities, the pledge state machine, validation

pub mod entities;
pub mod state;
pub mod validation;
