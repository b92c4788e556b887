//! Saved-city and marker-color use-cases.
//!
//! # Invariants
//! - City names are trimmed before lookup; matching stays case-sensitive.
//! - Blank names never reach storage and count as unknown cities.

use crate::model::preference::{DeleteOutcome, MarkerColor, SaveOutcome, UserId};
use crate::repo::preference_repo::PreferenceRepository;
use crate::repo::RepoResult;
use log::{info, warn};

/// Preference service facade over repository implementations.
pub struct PreferenceService<R: PreferenceRepository> {
    repo: R,
}

impl<R: PreferenceRepository> PreferenceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_saved_cities(&self, user_id: UserId) -> RepoResult<Vec<String>> {
        self.repo.list_saved_cities(user_id)
    }

    pub fn save_city(&mut self, user_id: UserId, city_name: &str) -> RepoResult<SaveOutcome> {
        let name = city_name.trim();
        if name.is_empty() {
            return Ok(SaveOutcome::UnknownCity);
        }

        let outcome = self.repo.save_city(user_id, name)?;
        info!("event=city_save module=service status=ok user_id={user_id} outcome={outcome:?}");
        Ok(outcome)
    }

    /// Removes a saved city. `false` covers both unknown and unsaved names.
    pub fn delete_city(&mut self, user_id: UserId, city_name: &str) -> RepoResult<bool> {
        Ok(self.remove_saved_city(user_id, city_name)?.is_deleted())
    }

    /// Same as `delete_city`, keeping the reason a removal did not happen.
    pub fn remove_saved_city(
        &mut self,
        user_id: UserId,
        city_name: &str,
    ) -> RepoResult<DeleteOutcome> {
        let name = city_name.trim();
        if name.is_empty() {
            return Ok(DeleteOutcome::UnknownCity);
        }

        let outcome = self.repo.remove_saved_city(user_id, name)?;
        if outcome == DeleteOutcome::UnknownCity {
            warn!("event=city_delete module=service status=skip user_id={user_id} reason=unknown_city");
        } else {
            info!("event=city_delete module=service status=ok user_id={user_id} outcome={outcome:?}");
        }
        Ok(outcome)
    }

    pub fn get_marker_color(&self, user_id: UserId) -> RepoResult<MarkerColor> {
        self.repo.get_marker_color(user_id)
    }

    pub fn set_marker_color(&self, user_id: UserId, color: MarkerColor) -> RepoResult<()> {
        self.repo.set_marker_color(user_id, color)?;
        info!("event=marker_color_set module=service status=ok user_id={user_id} color={color}");
        Ok(())
    }
}
