//! SeaORM entities and their conversions to/from the domain types.

pub mod post;
pub mod user;
