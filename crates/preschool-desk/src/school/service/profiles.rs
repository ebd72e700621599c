use tracing::{info, warn};

use super::{newest_first, SchoolService, SchoolServiceError};
use crate::school::access::{AccessError, Caller};
use crate::school::domain::{AuthIdentity, Profile, ProfileUpdate, Role, UserId};
use crate::school::repository::RepositoryError;
use crate::school::storage::ObjectStore;
use crate::school::RecordStore;

impl<S, O> SchoolService<S, O>
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    /// Resolve the role for an authenticated user id. Unknown users are rejected.
    pub fn resolve_caller(&self, user_id: &UserId) -> Result<Caller, SchoolServiceError> {
        match self.store.fetch_profile(user_id)? {
            Some(profile) => Ok(Caller::new(profile.id, profile.role)),
            None => Err(AccessError::Unauthenticated.into()),
        }
    }

    /// Fetch the profile for a freshly authenticated user, creating it on first sight.
    pub fn current_profile(
        &self,
        user_id: &UserId,
        identity: &AuthIdentity,
    ) -> Result<Profile, SchoolServiceError> {
        if let Some(profile) = self.store.fetch_profile(user_id)? {
            return Ok(profile);
        }

        let now = self.now();
        let full_name = identity
            .full_name
            .clone()
            .or_else(|| identity.username.clone())
            .or_else(|| {
                identity
                    .email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "User".to_string());

        let profile = Profile {
            id: user_id.clone(),
            email: identity.email.clone(),
            full_name: Some(full_name),
            phone: None,
            role: identity.role.unwrap_or(Role::Parent),
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_profile(profile) {
            Ok(created) => {
                info!(user = %created.id, role = created.role.label(), "profile created");
                Ok(created)
            }
            // Someone else created it between our read and write.
            Err(RepositoryError::Conflict) => self
                .store
                .fetch_profile(user_id)?
                .ok_or_else(|| SchoolServiceError::not_found("profile", user_id)),
            Err(err) => Err(err.into()),
        }
    }

    pub fn update_profile(
        &self,
        caller: &Caller,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<Profile, SchoolServiceError> {
        caller.require_owner_or_admin(user_id, "editing a profile")?;
        let mut profile = self
            .store
            .fetch_profile(user_id)?
            .ok_or_else(|| SchoolServiceError::not_found("profile", user_id))?;

        if update.email.is_some() {
            profile.email = update.email;
        }
        if update.full_name.is_some() {
            profile.full_name = update.full_name;
        }
        if update.phone.is_some() {
            profile.phone = update.phone;
        }
        profile.updated_at = self.now();

        self.store.update_profile(profile.clone())?;
        Ok(profile)
    }

    pub fn list_profiles(&self, caller: &Caller) -> Result<Vec<Profile>, SchoolServiceError> {
        caller.require_admin("listing users")?;
        let mut profiles = self.store.all_profiles()?;
        newest_first(&mut profiles, |profile| {
            (profile.created_at, profile.id.clone())
        });
        Ok(profiles)
    }

    pub fn change_role(
        &self,
        caller: &Caller,
        user_id: &UserId,
        role: Role,
    ) -> Result<Profile, SchoolServiceError> {
        caller.require_admin("changing a user role")?;
        let mut profile = self
            .store
            .fetch_profile(user_id)?
            .ok_or_else(|| SchoolServiceError::not_found("profile", user_id))?;

        if profile.role != role {
            info!(user = %user_id, from = profile.role.label(), to = role.label(), by = %caller.user_id, "role changed");
        }
        profile.role = role;
        profile.updated_at = self.now();
        self.store.update_profile(profile.clone())?;
        Ok(profile)
    }

    /// Destructive admin override; the caller cannot remove their own account.
    pub fn delete_profile(
        &self,
        caller: &Caller,
        user_id: &UserId,
    ) -> Result<(), SchoolServiceError> {
        caller.require_admin("deleting a user")?;
        if &caller.user_id == user_id {
            warn!(user = %user_id, "refused self deletion");
            return Err(SchoolServiceError::Invalid(
                "admins cannot delete their own profile".to_string(),
            ));
        }

        match self.store.delete_profile(user_id) {
            Ok(()) => {
                info!(user = %user_id, by = %caller.user_id, "profile deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => {
                Err(SchoolServiceError::not_found("profile", user_id))
            }
            Err(err) => Err(err.into()),
        }
    }
}
