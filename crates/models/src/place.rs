use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, EntityMeta};
use crate::errors::ModelError;
use crate::user::validate_name;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Required at creation, immutable afterwards; no patch field exists.
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_per_night: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenity_ids: Vec<Uuid>,
}

#[derive(Clone, Debug)]
pub struct NewPlace {
    pub id: Option<Uuid>,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_per_night: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenity_ids: Vec<Uuid>,
}

/// Partial update; the owner is deliberately not patchable.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlacePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_per_night: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenity_ids: Option<Vec<Uuid>>,
}

fn validate_price(price: f64) -> Result<(), ModelError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ModelError::Validation("price_per_night must be non-negative".into()));
    }
    Ok(())
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), ModelError> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ModelError::Validation("latitude must be within [-90, 90]".into()));
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ModelError::Validation("longitude must be within [-180, 180]".into()));
        }
    }
    Ok(())
}

impl Place {
    pub fn new(input: NewPlace) -> Result<Self, ModelError> {
        validate_name(&input.title)?;
        validate_price(input.price_per_night)?;
        validate_coordinates(input.latitude, input.longitude)?;
        let mut amenity_ids = input.amenity_ids;
        amenity_ids.sort_unstable();
        amenity_ids.dedup();
        Ok(Self {
            meta: EntityMeta::new(input.id),
            owner_id: input.owner_id,
            title: input.title,
            description: input.description,
            price_per_night: input.price_per_night,
            latitude: input.latitude,
            longitude: input.longitude,
            amenity_ids,
        })
    }

    pub fn apply(&mut self, patch: &PlacePatch) -> Result<(), ModelError> {
        if let Some(title) = &patch.title {
            validate_name(title)?;
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(price) = patch.price_per_night {
            validate_price(price)?;
            self.price_per_night = price;
        }
        validate_coordinates(patch.latitude, patch.longitude)?;
        if patch.latitude.is_some() {
            self.latitude = patch.latitude;
        }
        if patch.longitude.is_some() {
            self.longitude = patch.longitude;
        }
        if let Some(amenity_ids) = &patch.amenity_ids {
            let mut ids = amenity_ids.clone();
            ids.sort_unstable();
            ids.dedup();
            self.amenity_ids = ids;
        }
        Ok(())
    }
}

impl Entity for Place {
    fn id(&self) -> Uuid { self.meta.id }
    fn touch(&mut self) { self.meta.touch(); }
}
