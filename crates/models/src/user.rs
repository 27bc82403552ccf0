use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, EntityMeta};
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_admin: bool,
    /// Back-reference to owned places, maintained by the facade. Not an
    /// ownership relation; deleting a user does not delete these places.
    pub place_ids: Vec<Uuid>,
}

/// Fields accepted when creating a user. The password arrives already
/// hashed; plaintext never reaches the model layer.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Partial update; absent fields keep their stored value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::Validation("name required".into()));
    }
    Ok(())
}

impl User {
    pub fn new(input: NewUser) -> Result<Self, ModelError> {
        validate_name(&input.first_name)?;
        validate_name(&input.last_name)?;
        validate_email(&input.email)?;
        Ok(Self {
            meta: EntityMeta::new(input.id),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email.trim().to_lowercase(),
            password_hash: input.password_hash,
            is_admin: input.is_admin,
            place_ids: Vec::new(),
        })
    }

    pub fn apply(&mut self, patch: &UserPatch) -> Result<(), ModelError> {
        if let Some(first_name) = &patch.first_name {
            validate_name(first_name)?;
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            validate_name(last_name)?;
            self.last_name = last_name.clone();
        }
        if let Some(email) = &patch.email {
            validate_email(email)?;
            self.email = email.trim().to_lowercase();
        }
        if let Some(password_hash) = &patch.password_hash {
            self.password_hash = password_hash.clone();
        }
        Ok(())
    }
}

impl Entity for User {
    fn id(&self) -> Uuid { self.meta.id }
    fn touch(&mut self) { self.meta.touch(); }
}
