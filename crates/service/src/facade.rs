use std::collections::BTreeMap;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use models::amenity::{Amenity, AmenityPatch, NewAmenity};
use models::place::{NewPlace, Place, PlacePatch};
use models::review::{NewReview, Review, ReviewPatch};
use models::user::{NewUser, User, UserPatch};
use models::Entity;

use crate::auth::domain::Identity;
use crate::errors::ServiceError;
use crate::repository::Repository;

/// Input for `create_review`; the author is always the requester.
#[derive(Clone, Debug)]
pub struct CreateReview {
    pub id: Option<Uuid>,
    pub place_id: Uuid,
    pub comment: String,
    pub rating: i32,
}

/// The only component allowed to see more than one repository at once.
///
/// Every business rule spanning entities lives here: ownership checks,
/// uniqueness, referential integrity. The HTTP adapter calls exactly one
/// facade operation per request and never reaches a repository directly.
///
/// Uniqueness that would otherwise need a list-then-decide scan is
/// enforced with conditional inserts on dedicated indexes, so concurrent
/// requests cannot both pass the check before either writes:
/// - `email_index`: user email -> user id
/// - `review_index`: (author id, place id) -> review id
pub struct Facade {
    users: Repository<User>,
    places: Repository<Place>,
    amenities: Repository<Amenity>,
    reviews: Repository<Review>,
    email_index: DashMap<String, Uuid>,
    review_index: DashMap<(Uuid, Uuid), Uuid>,
}

impl Default for Facade {
    fn default() -> Self {
        Self::new()
    }
}

impl Facade {
    pub fn new() -> Self {
        Self {
            users: Repository::new("user"),
            places: Repository::new("place"),
            amenities: Repository::new("amenity"),
            reviews: Repository::new("review"),
            email_index: DashMap::new(),
            review_index: DashMap::new(),
        }
    }

    fn authorize_self_or_admin(subject: Uuid, requester: &Identity) -> Result<(), ServiceError> {
        if requester.user_id == subject || requester.is_admin {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized)
        }
    }

    fn authorize_admin(requester: &Identity) -> Result<(), ServiceError> {
        if requester.is_admin {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized)
        }
    }

    // ---- users -----------------------------------------------------------

    /// Create a user, enforcing email uniqueness across all users.
    pub fn create_user(&self, input: NewUser) -> Result<User, ServiceError> {
        let user = User::new(input)?;
        let email = user.email.clone();
        match self.email_index.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(ServiceError::DuplicateKey(format!(
                    "email {email} already registered"
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id());
            }
        }
        match self.users.insert(user) {
            Ok(user) => {
                info!(user_id = %user.id(), email = %user.email, event = "user_created", "user created");
                Ok(user)
            }
            Err(err) => {
                self.email_index.remove(&email);
                Err(err)
            }
        }
    }

    pub fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.get(id)
    }

    pub fn get_user_by_email(&self, email: &str) -> Option<User> {
        let normalized = email.trim().to_lowercase();
        let id = *self.email_index.get(&normalized)?;
        self.users.get(id)
    }

    pub fn list_users(&self) -> Vec<User> {
        self.users.list_all()
    }

    /// Partial update of a user; only the user themselves or an admin may
    /// apply it. An email change re-checks uniqueness atomically.
    pub fn update_user(
        &self,
        id: Uuid,
        patch: &UserPatch,
        requester: &Identity,
    ) -> Result<User, ServiceError> {
        Self::authorize_self_or_admin(id, requester)?;
        let current = self.users.get(id).ok_or_else(|| ServiceError::not_found("user"))?;

        let new_email = patch.email.as_ref().map(|e| e.trim().to_lowercase());
        let email_changed = new_email.as_ref().is_some_and(|e| *e != current.email);
        if email_changed {
            let reserved = new_email.clone().unwrap_or_default();
            match self.email_index.entry(reserved.clone()) {
                Entry::Occupied(_) => {
                    return Err(ServiceError::DuplicateKey(format!(
                        "email {reserved} already registered"
                    )))
                }
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
        }

        let result = self.users.update(id, |user| user.apply(patch).map_err(Into::into));
        match result {
            Ok(user) => {
                if email_changed {
                    self.email_index.remove(&current.email);
                }
                info!(user_id = %id, event = "user_updated", "user updated");
                Ok(user)
            }
            Err(err) => {
                if email_changed {
                    if let Some(reserved) = &new_email {
                        self.email_index.remove(reserved);
                    }
                }
                Err(err)
            }
        }
    }

    /// Delete a user. Owned places and authored reviews are left in place;
    /// deletes never cascade.
    pub fn delete_user(&self, id: Uuid, requester: &Identity) -> Result<(), ServiceError> {
        Self::authorize_self_or_admin(id, requester)?;
        let removed = self.users.delete(id)?;
        self.email_index.remove(&removed.email);
        info!(user_id = %id, event = "user_deleted", "user deleted");
        Ok(())
    }

    // ---- places ----------------------------------------------------------

    /// Create a place. The owner must exist and, unless the requester is an
    /// admin, must be the requester. Every referenced amenity must exist.
    pub fn create_place(&self, input: NewPlace, requester: &Identity) -> Result<Place, ServiceError> {
        Self::authorize_self_or_admin(input.owner_id, requester)?;
        if self.users.get(input.owner_id).is_none() {
            return Err(ServiceError::not_found("owner user"));
        }
        self.ensure_amenities_exist(&input.amenity_ids)?;
        let place = Place::new(input)?;
        let place = self.places.insert(place)?;

        // Back-reference on the owner; if the owner was deleted in the
        // meantime there is nothing left to maintain.
        let place_id = place.id();
        let backref = self.users.update(place.owner_id, |user| {
            if !user.place_ids.contains(&place_id) {
                user.place_ids.push(place_id);
            }
            Ok(())
        });
        if backref.is_err() {
            warn!(place_id = %place_id, owner_id = %place.owner_id, "owner vanished before back-reference update");
        }

        info!(place_id = %place_id, owner_id = %place.owner_id, event = "place_created", "place created");
        Ok(place)
    }

    pub fn get_place(&self, id: Uuid) -> Option<Place> {
        self.places.get(id)
    }

    pub fn list_places(&self) -> Vec<Place> {
        self.places.list_all()
    }

    pub fn get_places_by_owner(&self, owner_id: Uuid) -> Vec<Place> {
        self.places
            .list_all()
            .into_iter()
            .filter(|place| place.owner_id == owner_id)
            .collect()
    }

    /// Partial update; owner-or-admin only. The owner id itself is
    /// immutable (the patch carries no owner field).
    pub fn update_place(
        &self,
        id: Uuid,
        patch: &PlacePatch,
        requester: &Identity,
    ) -> Result<Place, ServiceError> {
        let current = self.places.get(id).ok_or_else(|| ServiceError::not_found("place"))?;
        Self::authorize_self_or_admin(current.owner_id, requester)?;
        if let Some(amenity_ids) = &patch.amenity_ids {
            self.ensure_amenities_exist(amenity_ids)?;
        }
        let place = self.places.update(id, |place| place.apply(patch).map_err(Into::into))?;
        info!(place_id = %id, event = "place_updated", "place updated");
        Ok(place)
    }

    /// Delete a place; owner-or-admin only. Its reviews are left in place
    /// (deletes never cascade).
    pub fn delete_place(&self, id: Uuid, requester: &Identity) -> Result<(), ServiceError> {
        let current = self.places.get(id).ok_or_else(|| ServiceError::not_found("place"))?;
        Self::authorize_self_or_admin(current.owner_id, requester)?;
        let removed = self.places.delete(id)?;
        let backref = self.users.update(removed.owner_id, |user| {
            user.place_ids.retain(|pid| *pid != id);
            Ok(())
        });
        if backref.is_err() {
            warn!(place_id = %id, owner_id = %removed.owner_id, "owner vanished before back-reference cleanup");
        }
        info!(place_id = %id, event = "place_deleted", "place deleted");
        Ok(())
    }

    fn ensure_amenities_exist(&self, amenity_ids: &[Uuid]) -> Result<(), ServiceError> {
        for amenity_id in amenity_ids {
            if self.amenities.get(*amenity_id).is_none() {
                return Err(ServiceError::NotFound(format!("amenity {amenity_id} not found")));
            }
        }
        Ok(())
    }

    // ---- amenities -------------------------------------------------------

    /// Amenity management is admin-only; reads are open.
    pub fn create_amenity(
        &self,
        input: NewAmenity,
        requester: &Identity,
    ) -> Result<Amenity, ServiceError> {
        Self::authorize_admin(requester)?;
        let amenity = Amenity::new(input)?;
        let amenity = self.amenities.insert(amenity)?;
        info!(amenity_id = %amenity.id(), name = %amenity.name, event = "amenity_created", "amenity created");
        Ok(amenity)
    }

    pub fn get_amenity(&self, id: Uuid) -> Option<Amenity> {
        self.amenities.get(id)
    }

    pub fn list_amenities(&self) -> Vec<Amenity> {
        self.amenities.list_all()
    }

    pub fn update_amenity(
        &self,
        id: Uuid,
        patch: &AmenityPatch,
        requester: &Identity,
    ) -> Result<Amenity, ServiceError> {
        Self::authorize_admin(requester)?;
        let amenity = self.amenities.update(id, |amenity| amenity.apply(patch).map_err(Into::into))?;
        info!(amenity_id = %id, event = "amenity_updated", "amenity updated");
        Ok(amenity)
    }

    pub fn delete_amenity(&self, id: Uuid, requester: &Identity) -> Result<(), ServiceError> {
        Self::authorize_admin(requester)?;
        self.amenities.delete(id)?;
        info!(amenity_id = %id, event = "amenity_deleted", "amenity deleted");
        Ok(())
    }

    /// Derived name -> description mapping over the full amenity set,
    /// computed freshly on every call. Not cached on purpose.
    pub fn amenity_catalog(&self) -> BTreeMap<String, String> {
        self.amenities
            .list_all()
            .into_iter()
            .map(|amenity| (amenity.name, amenity.description))
            .collect()
    }

    // ---- reviews ---------------------------------------------------------

    /// Create a review on behalf of the requester.
    ///
    /// Rule order: the place must exist, the requester must not own it,
    /// the requester must not have reviewed it before, and the rating must
    /// be in range. The uniqueness check is a conditional insert on the
    /// `(user, place)` index, so two concurrent attempts by the same user
    /// cannot both succeed.
    pub fn create_review(
        &self,
        input: CreateReview,
        requester: &Identity,
    ) -> Result<Review, ServiceError> {
        let place = self
            .places
            .get(input.place_id)
            .ok_or_else(|| ServiceError::not_found("place"))?;
        if place.owner_id == requester.user_id {
            return Err(ServiceError::SelfReviewForbidden);
        }

        let pair = (requester.user_id, input.place_id);
        let review_id = input.id.unwrap_or_else(Uuid::new_v4);
        match self.review_index.entry(pair) {
            Entry::Occupied(_) => return Err(ServiceError::DuplicateReview),
            Entry::Vacant(slot) => {
                slot.insert(review_id);
            }
        }

        let review = Review::new(NewReview {
            id: Some(review_id),
            comment: input.comment,
            rating: input.rating,
            user_id: requester.user_id,
            place_id: input.place_id,
        });
        let review = match review {
            Ok(review) => review,
            Err(err) => {
                self.review_index.remove(&pair);
                return Err(err.into());
            }
        };

        match self.reviews.insert(review) {
            Ok(review) => {
                info!(
                    review_id = %review.id(),
                    user_id = %requester.user_id,
                    place_id = %input.place_id,
                    rating = review.rating,
                    event = "review_created",
                    "review created"
                );
                Ok(review)
            }
            Err(err) => {
                self.review_index.remove(&pair);
                Err(err)
            }
        }
    }

    pub fn get_review(&self, id: Uuid) -> Option<Review> {
        self.reviews.get(id)
    }

    pub fn list_reviews(&self) -> Vec<Review> {
        self.reviews.list_all()
    }

    /// All reviews for a place; an empty result is valid and does not by
    /// itself distinguish "no reviews" from "no such place".
    pub fn get_reviews_by_place(&self, place_id: Uuid) -> Vec<Review> {
        self.reviews
            .list_all()
            .into_iter()
            .filter(|review| review.place_id == place_id)
            .collect()
    }

    /// Partial update of comment/rating. Only the author may update;
    /// admins get no override here.
    pub fn update_review(
        &self,
        id: Uuid,
        patch: &ReviewPatch,
        requester: &Identity,
    ) -> Result<Review, ServiceError> {
        let current = self.reviews.get(id).ok_or_else(|| ServiceError::not_found("review"))?;
        if requester.user_id != current.user_id {
            return Err(ServiceError::Unauthorized);
        }
        let result = self.reviews.update(id, |review| review.apply(patch).map_err(Into::into));
        match result {
            Ok(review) => {
                info!(review_id = %id, event = "review_updated", "review updated");
                Ok(review)
            }
            // existence was confirmed above; a store miss now is an
            // internal fault, not a caller error
            Err(ServiceError::NotFound(_)) => {
                Err(ServiceError::UpdateFailed("review disappeared from store".into()))
            }
            Err(err) => Err(err),
        }
    }

    /// Delete a review; the author or any admin may delete.
    pub fn delete_review(&self, id: Uuid, requester: &Identity) -> Result<(), ServiceError> {
        let current = self.reviews.get(id).ok_or_else(|| ServiceError::not_found("review"))?;
        if requester.user_id != current.user_id && !requester.is_admin {
            return Err(ServiceError::Unauthorized);
        }
        match self.reviews.delete(id) {
            Ok(removed) => {
                self.review_index.remove(&(removed.user_id, removed.place_id));
                info!(review_id = %id, event = "review_deleted", "review deleted");
                Ok(())
            }
            Err(ServiceError::NotFound(_)) => {
                Err(ServiceError::DeleteFailed("review disappeared from store".into()))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(user: &User) -> Identity {
        Identity { user_id: user.id(), is_admin: user.is_admin }
    }

    fn new_user(email: &str, is_admin: bool) -> NewUser {
        NewUser {
            id: None,
            first_name: "Test".into(),
            last_name: "User".into(),
            email: email.into(),
            password_hash: "hash".into(),
            is_admin,
        }
    }

    fn new_place(owner_id: Uuid) -> NewPlace {
        NewPlace {
            id: None,
            owner_id,
            title: "Harbor House".into(),
            description: "Quiet street".into(),
            price_per_night: 80.0,
            latitude: None,
            longitude: None,
            amenity_ids: vec![],
        }
    }

    struct Fixture {
        facade: Facade,
        owner: User,
        guest: User,
        admin: User,
        place: Place,
    }

    fn fixture() -> Fixture {
        let facade = Facade::new();
        let owner = facade.create_user(new_user("owner@example.com", false)).unwrap();
        let guest = facade.create_user(new_user("guest@example.com", false)).unwrap();
        let admin = facade.create_user(new_user("admin@example.com", true)).unwrap();
        let place = facade
            .create_place(new_place(owner.id()), &identity(&owner))
            .unwrap();
        Fixture { facade, owner, guest, admin, place }
    }

    fn review_input(place_id: Uuid, rating: i32) -> CreateReview {
        CreateReview { id: None, place_id, comment: "Nice".into(), rating }
    }

    // -- users --

    #[test]
    fn user_round_trip() {
        let facade = Facade::new();
        let created = facade.create_user(new_user("a@example.com", false)).unwrap();
        assert_eq!(facade.get_user(created.id()), Some(created));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let facade = Facade::new();
        facade.create_user(new_user("a@example.com", false)).unwrap();
        let res = facade.create_user(new_user("A@Example.com", false));
        assert!(matches!(res, Err(ServiceError::DuplicateKey(_))));
    }

    #[test]
    fn email_freed_after_user_delete() {
        let facade = Facade::new();
        let user = facade.create_user(new_user("a@example.com", false)).unwrap();
        facade.delete_user(user.id(), &identity(&user)).unwrap();
        assert!(facade.create_user(new_user("a@example.com", false)).is_ok());
    }

    #[test]
    fn user_update_requires_self_or_admin() {
        let fx = fixture();
        let patch = UserPatch { first_name: Some("Changed".into()), ..Default::default() };
        let res = fx.facade.update_user(fx.owner.id(), &patch, &identity(&fx.guest));
        assert!(matches!(res, Err(ServiceError::Unauthorized)));
        assert!(fx.facade.update_user(fx.owner.id(), &patch, &identity(&fx.admin)).is_ok());
        let updated = fx.facade.update_user(fx.owner.id(), &patch, &identity(&fx.owner)).unwrap();
        assert_eq!(updated.first_name, "Changed");
    }

    #[test]
    fn email_change_keeps_index_consistent() {
        let fx = fixture();
        let patch = UserPatch { email: Some("moved@example.com".into()), ..Default::default() };
        fx.facade.update_user(fx.guest.id(), &patch, &identity(&fx.guest)).unwrap();
        assert!(fx.facade.get_user_by_email("guest@example.com").is_none());
        assert_eq!(
            fx.facade.get_user_by_email("moved@example.com").map(|u| u.id()),
            Some(fx.guest.id())
        );
        // old address becomes available again
        assert!(fx.facade.create_user(new_user("guest@example.com", false)).is_ok());
    }

    #[test]
    fn email_change_to_taken_address_is_rejected() {
        let fx = fixture();
        let patch = UserPatch { email: Some("owner@example.com".into()), ..Default::default() };
        let res = fx.facade.update_user(fx.guest.id(), &patch, &identity(&fx.guest));
        assert!(matches!(res, Err(ServiceError::DuplicateKey(_))));
        // the failed change must not clobber the owner's index entry
        assert_eq!(
            fx.facade.get_user_by_email("owner@example.com").map(|u| u.id()),
            Some(fx.owner.id())
        );
    }

    // -- places --

    #[test]
    fn place_round_trip_and_backref() {
        let fx = fixture();
        assert_eq!(fx.facade.get_place(fx.place.id()), Some(fx.place.clone()));
        let owner = fx.facade.get_user(fx.owner.id()).unwrap();
        assert_eq!(owner.place_ids, vec![fx.place.id()]);
    }

    #[test]
    fn place_creation_requires_existing_owner() {
        let facade = Facade::new();
        let ghost = Identity { user_id: Uuid::new_v4(), is_admin: false };
        let res = facade.create_place(new_place(ghost.user_id), &ghost);
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn place_creation_for_someone_else_requires_admin() {
        let fx = fixture();
        let res = fx.facade.create_place(new_place(fx.owner.id()), &identity(&fx.guest));
        assert!(matches!(res, Err(ServiceError::Unauthorized)));
        assert!(fx.facade.create_place(new_place(fx.owner.id()), &identity(&fx.admin)).is_ok());
    }

    #[test]
    fn places_by_owner_filters_listing() {
        let fx = fixture();
        let second = fx
            .facade
            .create_place(new_place(fx.owner.id()), &identity(&fx.owner))
            .unwrap();
        let owned = fx.facade.get_places_by_owner(fx.owner.id());
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().any(|p| p.id() == second.id()));
        assert!(fx.facade.get_places_by_owner(fx.guest.id()).is_empty());
    }

    #[test]
    fn place_rejects_unknown_amenities() {
        let fx = fixture();
        let mut input = new_place(fx.owner.id());
        input.amenity_ids = vec![Uuid::new_v4()];
        let res = fx.facade.create_place(input, &identity(&fx.owner));
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn place_update_and_delete_honor_ownership() {
        let fx = fixture();
        let patch = PlacePatch { title: Some("Renamed".into()), ..Default::default() };
        assert!(matches!(
            fx.facade.update_place(fx.place.id(), &patch, &identity(&fx.guest)),
            Err(ServiceError::Unauthorized)
        ));
        let updated = fx.facade.update_place(fx.place.id(), &patch, &identity(&fx.owner)).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert!(updated.meta.updated_at > fx.place.meta.updated_at);

        assert!(matches!(
            fx.facade.delete_place(fx.place.id(), &identity(&fx.guest)),
            Err(ServiceError::Unauthorized)
        ));
        fx.facade.delete_place(fx.place.id(), &identity(&fx.admin)).unwrap();
        assert!(fx.facade.get_place(fx.place.id()).is_none());
        let owner = fx.facade.get_user(fx.owner.id()).unwrap();
        assert!(owner.place_ids.is_empty());
    }

    // -- amenities --

    #[test]
    fn amenity_management_is_admin_only() {
        let fx = fixture();
        let input = NewAmenity { id: None, name: "Wi-Fi".into(), description: "Fiber".into() };
        assert!(matches!(
            fx.facade.create_amenity(input.clone(), &identity(&fx.guest)),
            Err(ServiceError::Unauthorized)
        ));
        let amenity = fx.facade.create_amenity(input, &identity(&fx.admin)).unwrap();
        assert_eq!(fx.facade.get_amenity(amenity.id()), Some(amenity.clone()));

        let patch = AmenityPatch { description: Some("Gigabit".into()), ..Default::default() };
        assert!(matches!(
            fx.facade.update_amenity(amenity.id(), &patch, &identity(&fx.guest)),
            Err(ServiceError::Unauthorized)
        ));
        fx.facade.update_amenity(amenity.id(), &patch, &identity(&fx.admin)).unwrap();
        assert!(matches!(
            fx.facade.delete_amenity(amenity.id(), &identity(&fx.guest)),
            Err(ServiceError::Unauthorized)
        ));
        fx.facade.delete_amenity(amenity.id(), &identity(&fx.admin)).unwrap();
    }

    #[test]
    fn amenity_catalog_is_recomputed_per_call() {
        let fx = fixture();
        let admin = identity(&fx.admin);
        fx.facade
            .create_amenity(NewAmenity { id: None, name: "Pool".into(), description: "Outdoor".into() }, &admin)
            .unwrap();
        let catalog = fx.facade.amenity_catalog();
        assert_eq!(catalog.get("Pool").map(String::as_str), Some("Outdoor"));

        fx.facade
            .create_amenity(NewAmenity { id: None, name: "Sauna".into(), description: String::new() }, &admin)
            .unwrap();
        let catalog = fx.facade.amenity_catalog();
        assert_eq!(catalog.len(), 2);
    }

    // -- reviews --

    #[test]
    fn valid_review_creation_stores_input_fields() {
        let fx = fixture();
        let review = fx
            .facade
            .create_review(review_input(fx.place.id(), 4), &identity(&fx.guest))
            .unwrap();
        assert_eq!(review.rating, 4);
        assert_eq!(review.comment, "Nice");
        assert_eq!(review.user_id, fx.guest.id());
        assert_eq!(review.place_id, fx.place.id());
        assert_eq!(fx.facade.get_review(review.id()), Some(review));
    }

    #[test]
    fn review_on_unknown_place_fails_not_found() {
        let fx = fixture();
        let res = fx
            .facade
            .create_review(review_input(Uuid::new_v4(), 4), &identity(&fx.guest));
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn owner_cannot_review_own_place() {
        let fx = fixture();
        let res = fx
            .facade
            .create_review(review_input(fx.place.id(), 4), &identity(&fx.owner));
        assert!(matches!(res, Err(ServiceError::SelfReviewForbidden)));
    }

    #[test]
    fn second_review_by_same_user_fails_duplicate() {
        let fx = fixture();
        let guest = identity(&fx.guest);
        fx.facade.create_review(review_input(fx.place.id(), 4), &guest).unwrap();
        let res = fx.facade.create_review(review_input(fx.place.id(), 2), &guest);
        assert!(matches!(res, Err(ServiceError::DuplicateReview)));
        // other users are unaffected
        assert!(fx
            .facade
            .create_review(review_input(fx.place.id(), 5), &identity(&fx.admin))
            .is_ok());
    }

    #[test]
    fn out_of_range_ratings_are_rejected_without_reserving() {
        let fx = fixture();
        let guest = identity(&fx.guest);
        for rating in [0, 6] {
            let res = fx.facade.create_review(review_input(fx.place.id(), rating), &guest);
            assert!(matches!(res, Err(ServiceError::InvalidInput(_))), "rating {rating}");
        }
        // the failed attempts must not have consumed the uniqueness slot
        assert!(fx.facade.create_review(review_input(fx.place.id(), 1), &guest).is_ok());
    }

    #[test]
    fn review_update_is_author_only_even_for_admins() {
        let fx = fixture();
        let review = fx
            .facade
            .create_review(review_input(fx.place.id(), 4), &identity(&fx.guest))
            .unwrap();
        let patch = ReviewPatch { comment: Some("Edited".into()), rating: Some(3) };
        assert!(matches!(
            fx.facade.update_review(review.id(), &patch, &identity(&fx.admin)),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            fx.facade.update_review(review.id(), &patch, &identity(&fx.owner)),
            Err(ServiceError::Unauthorized)
        ));
        let updated = fx
            .facade
            .update_review(review.id(), &patch, &identity(&fx.guest))
            .unwrap();
        assert_eq!(updated.comment, "Edited");
        assert_eq!(updated.rating, 3);
    }

    #[test]
    fn review_delete_allows_author_and_admin_only() {
        let fx = fixture();
        let guest = identity(&fx.guest);
        let review = fx.facade.create_review(review_input(fx.place.id(), 4), &guest).unwrap();
        assert!(matches!(
            fx.facade.delete_review(review.id(), &identity(&fx.owner)),
            Err(ServiceError::Unauthorized)
        ));
        fx.facade.delete_review(review.id(), &guest).unwrap();
        assert!(fx.facade.get_review(review.id()).is_none());

        // admin may delete someone else's review
        let review = fx.facade.create_review(review_input(fx.place.id(), 2), &guest).unwrap();
        fx.facade.delete_review(review.id(), &identity(&fx.admin)).unwrap();
        assert!(fx.facade.get_review(review.id()).is_none());
    }

    #[test]
    fn deleting_a_review_frees_the_uniqueness_slot() {
        let fx = fixture();
        let guest = identity(&fx.guest);
        let review = fx.facade.create_review(review_input(fx.place.id(), 4), &guest).unwrap();
        fx.facade.delete_review(review.id(), &guest).unwrap();
        assert!(fx.facade.create_review(review_input(fx.place.id(), 5), &guest).is_ok());
    }

    #[test]
    fn reviews_by_place_filters_and_allows_empty() {
        let fx = fixture();
        assert!(fx.facade.get_reviews_by_place(fx.place.id()).is_empty());
        fx.facade
            .create_review(review_input(fx.place.id(), 4), &identity(&fx.guest))
            .unwrap();
        let second_place = fx
            .facade
            .create_place(new_place(fx.owner.id()), &identity(&fx.owner))
            .unwrap();
        let reviews = fx.facade.get_reviews_by_place(fx.place.id());
        assert_eq!(reviews.len(), 1);
        assert!(fx.facade.get_reviews_by_place(second_place.id()).is_empty());
    }

    #[test]
    fn place_delete_survives_missing_owner() {
        let fx = fixture();
        let admin = identity(&fx.admin);
        fx.facade.delete_user(fx.owner.id(), &admin).unwrap();
        fx.facade.delete_place(fx.place.id(), &admin).unwrap();
        assert!(fx.facade.get_place(fx.place.id()).is_none());
    }

    #[test]
    fn deleting_a_place_does_not_cascade_to_reviews() {
        let fx = fixture();
        let review = fx
            .facade
            .create_review(review_input(fx.place.id(), 4), &identity(&fx.guest))
            .unwrap();
        fx.facade.delete_place(fx.place.id(), &identity(&fx.owner)).unwrap();
        assert_eq!(fx.facade.get_review(review.id()), Some(review));
    }

    // -- races --

    #[test]
    fn racing_reviews_for_one_pair_admit_exactly_one() {
        let fx = fixture();
        let guest = identity(&fx.guest);
        let place_id = fx.place.id();
        let facade = std::sync::Arc::new(fx.facade);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let facade = std::sync::Arc::clone(&facade);
                std::thread::spawn(move || {
                    facade.create_review(review_input(place_id, 4), &guest)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(ServiceError::DuplicateReview))));
        assert_eq!(facade.get_reviews_by_place(place_id).len(), 1);
    }

    #[test]
    fn racing_signups_for_one_email_admit_exactly_one() {
        let facade = std::sync::Arc::new(Facade::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let facade = std::sync::Arc::clone(&facade);
                std::thread::spawn(move || facade.create_user(new_user("raced@example.com", false)))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(ServiceError::DuplicateKey(_)))));
        assert_eq!(facade.list_users().len(), 1);
    }

    // -- end-to-end scenario --

    #[test]
    fn owner_guest_admin_scenario() {
        let fx = fixture();
        let owner = identity(&fx.owner);
        let guest = identity(&fx.guest);
        let admin = identity(&fx.admin);
        let place_id = fx.place.id();

        // owner attempts to review own place
        assert!(matches!(
            fx.facade.create_review(review_input(place_id, 3), &owner),
            Err(ServiceError::SelfReviewForbidden)
        ));

        // guest reviews with rating 4
        let review = fx.facade.create_review(review_input(place_id, 4), &guest).unwrap();

        // guest tries again with rating 2
        assert!(matches!(
            fx.facade.create_review(review_input(place_id, 2), &guest),
            Err(ServiceError::DuplicateReview)
        ));

        // admin deletes the guest's review
        fx.facade.delete_review(review.id(), &admin).unwrap();

        // another non-admin tries to delete the now nonexistent review
        let outsider = fx.facade.create_user(new_user("c@example.com", false)).unwrap();
        assert!(matches!(
            fx.facade.delete_review(review.id(), &identity(&outsider)),
            Err(ServiceError::NotFound(_))
        ));
    }
}
