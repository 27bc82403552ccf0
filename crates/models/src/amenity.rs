use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, EntityMeta};
use crate::errors::ModelError;
use crate::user::validate_name;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug)]
pub struct NewAmenity {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AmenityPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Amenity {
    pub fn new(input: NewAmenity) -> Result<Self, ModelError> {
        validate_name(&input.name)?;
        Ok(Self {
            meta: EntityMeta::new(input.id),
            name: input.name,
            description: input.description,
        })
    }

    pub fn apply(&mut self, patch: &AmenityPatch) -> Result<(), ModelError> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        Ok(())
    }
}

impl Entity for Amenity {
    fn id(&self) -> Uuid { self.meta.id }
    fn touch(&mut self) { self.meta.touch(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amenity_creation() {
        let a = Amenity::new(NewAmenity { id: None, name: "Wi-Fi".into(), description: "Fiber".into() }).unwrap();
        assert_eq!(a.name, "Wi-Fi");
    }

    #[test]
    fn rejects_blank_name() {
        let res = Amenity::new(NewAmenity { id: None, name: "  ".into(), description: String::new() });
        assert!(res.is_err());
    }
}
