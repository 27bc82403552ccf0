use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, EntityMeta};
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub comment: String,
    /// Integer in 1..=5 inclusive.
    pub rating: i32,
    pub user_id: Uuid,
    pub place_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct NewReview {
    pub id: Option<Uuid>,
    pub comment: String,
    pub rating: i32,
    pub user_id: Uuid,
    pub place_id: Uuid,
}

/// Only the comment and rating are mutable after creation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReviewPatch {
    pub comment: Option<String>,
    pub rating: Option<i32>,
}

pub fn validate_rating(rating: i32) -> Result<(), ModelError> {
    if !(1..=5).contains(&rating) {
        return Err(ModelError::Validation("rating must be an integer in 1..=5".into()));
    }
    Ok(())
}

impl Review {
    pub fn new(input: NewReview) -> Result<Self, ModelError> {
        validate_rating(input.rating)?;
        Ok(Self {
            meta: EntityMeta::new(input.id),
            comment: input.comment,
            rating: input.rating,
            user_id: input.user_id,
            place_id: input.place_id,
        })
    }

    pub fn apply(&mut self, patch: &ReviewPatch) -> Result<(), ModelError> {
        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
            self.rating = rating;
        }
        if let Some(comment) = &patch.comment {
            self.comment = comment.clone();
        }
        Ok(())
    }
}

impl Entity for Review {
    fn id(&self) -> Uuid { self.meta.id }
    fn touch(&mut self) { self.meta.touch(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(rating: i32) -> NewReview {
        NewReview {
            id: None,
            comment: "Great stay".into(),
            rating,
            user_id: Uuid::new_v4(),
            place_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn accepts_full_rating_range() {
        for rating in 1..=5 {
            assert!(Review::new(input(rating)).is_ok(), "rating {rating} should be valid");
        }
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        for rating in [0, 6, -1, 100] {
            assert!(Review::new(input(rating)).is_err(), "rating {rating} should be invalid");
        }
    }

    #[test]
    fn patch_rejects_bad_rating_without_partial_apply() {
        let mut review = Review::new(input(4)).unwrap();
        let patch = ReviewPatch { comment: Some("Changed".into()), rating: Some(9) };
        assert!(review.apply(&patch).is_err());
        // rating validated before any field is written
        assert_eq!(review.comment, "Great stay");
        assert_eq!(review.rating, 4);
    }
}
