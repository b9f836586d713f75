//! Application user persistence.

use super::{from_document, to_document, RepoResult};
use crate::docdb::Collection;
use crate::model::user::AppUser;
use serde_json::json;

pub trait UserRepository {
    /// Exact, case-sensitive username lookup.
    fn find_by_username(&self, username: &str) -> RepoResult<Option<AppUser>>;
    /// Returns whether the insert was acknowledged.
    fn insert_user(&self, user: &AppUser) -> RepoResult<bool>;
}

/// `users` collection backed repository.
pub struct DocUserRepository<'conn> {
    collection: Collection<'conn>,
}

impl<'conn> DocUserRepository<'conn> {
    pub fn new(collection: Collection<'conn>) -> Self {
        Self { collection }
    }
}

impl UserRepository for DocUserRepository<'_> {
    fn find_by_username(&self, username: &str) -> RepoResult<Option<AppUser>> {
        self.collection
            .find_one(&json!({ "username": username }))?
            .map(from_document)
            .transpose()
    }

    fn insert_user(&self, user: &AppUser) -> RepoResult<bool> {
        let result = self.collection.insert_one(&to_document(user)?)?;
        Ok(result.acknowledged)
    }
}
