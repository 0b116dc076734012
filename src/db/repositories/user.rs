use crate::db::{Store, StoreError};
use crate::models::{Role, User};

/// Account storage.
///
/// Kept apart from the generic repository so rows are only ever written with
/// a digest produced by [`User`].
#[derive(Clone)]
pub struct UserRepository {
    store: Store,
}

impl UserRepository {
    const TABLE: &'static str = "users";

    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.store
            .fetch_one(
                "SELECT * FROM users WHERE username = ?",
                vec![username.into()],
            )
            .await?
            .map(User::from_record)
            .transpose()
            .map_err(StoreError::from)
    }

    pub async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        let found = self
            .store
            .fetch_scalar(
                "SELECT COUNT(*) AS value FROM users WHERE username = ?",
                vec![username.into()],
            )
            .await?;
        Ok(found > 0)
    }

    pub async fn role_of(&self, username: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.find_by_username(username).await?.map(|u| u.role()))
    }

    /// # Errors
    ///
    /// [`StoreError::ConstraintViolation`] when the username is taken.
    pub async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut fields = user.to_storage_record();
        fields.remove("id");

        let id = self.store.insert(Self::TABLE, &fields).await?;
        Ok(user.with_id(id))
    }

    /// Writes the user's current digest. Returns `false` if the account is gone.
    pub async fn update_password(&self, user: &User) -> Result<bool, StoreError> {
        let Some(id) = user.id() else {
            return Ok(false);
        };
        self.store
            .update(Self::TABLE, id, &user.password_record())
            .await
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        self.store.count(Self::TABLE).await
    }
}
