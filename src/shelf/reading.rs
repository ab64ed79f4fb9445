use super::{ShelfError, ShelfStore};
use crate::domain::VolumeId;
use crate::models::{ProgressPatch, ReadingEntry};

impl ShelfStore<ReadingEntry> {
    /// Stores the page the user is on. Pages beyond the total are kept as given.
    pub async fn update_progress(
        &self,
        key: &VolumeId,
        current_page: i32,
    ) -> Result<ReadingEntry, ShelfError> {
        self.current_user()?;
        if current_page < 0 {
            return Err(ShelfError::Validation(
                "La página actual no puede ser negativa".to_string(),
            ));
        }

        self.apply_update(key, ProgressPatch { current_page }).await
    }

    /// Rounded percent read for a cached row; 0 when it is not on the shelf.
    #[must_use]
    pub fn progress(&self, key: &VolumeId) -> u8 {
        self.get(key).map_or(0, |entry| entry.progress())
    }
}
