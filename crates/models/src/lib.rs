pub mod amenity;
pub mod entity;
pub mod errors;
pub mod place;
pub mod review;
pub mod user;

pub use entity::{Entity, EntityMeta};
