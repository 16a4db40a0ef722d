use std::sync::Arc;

use chrono::Utc;
use models::ambulance::{Ambulance, LocationEntry, LocationUpdate, NewAmbulance};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::storage::{BlobStore, RecordStore};

/// Blob key holding the ordered ambulance collection.
pub const AMBULANCES_KEY: &str = "ambulances";

/// Ambulance records with the status-toggle workflow and location history.
pub struct AmbulanceDirectory {
    store: RecordStore<Ambulance>,
}

impl AmbulanceDirectory {
    /// Open the directory over `blobs`, loading whatever was persisted.
    pub async fn open(blobs: Arc<dyn BlobStore>) -> Self {
        let store = RecordStore::new(blobs, AMBULANCES_KEY);
        let count = store.load().await.count;
        info!(count, "ambulance directory loaded");
        Self { store }
    }

    /// Register a new ambulance as `Available` with a one-entry history.
    ///
    /// # Examples
    /// ```
    /// use service::ambulance::AmbulanceDirectory;
    /// use service::storage::MemoryBlobStore;
    /// use models::ambulance::{AmbulanceStatus, NewAmbulance};
    /// let dir = tokio_test::block_on(AmbulanceDirectory::open(MemoryBlobStore::new()));
    /// let input = NewAmbulance {
    ///     id: "A1".into(), driver_name: "Asha".into(), phone_number: "555".into(),
    ///     ambulance_type: "BLS".into(), current_location: "City Hospital".into(),
    ///     latitude: Some(12.9), longitude: Some(77.6),
    /// };
    /// let a = tokio_test::block_on(dir.register(input)).unwrap();
    /// assert_eq!(a.status, AmbulanceStatus::Available);
    /// assert_eq!(a.location_history.len(), 1);
    /// ```
    #[instrument(skip(self, input), fields(ambulance_id = %input.id))]
    pub async fn register(&self, input: NewAmbulance) -> Result<Ambulance, ServiceError> {
        if self.store.contains(input.id.trim()).await {
            return Err(ServiceError::duplicate("ambulance", input.id.trim()));
        }
        let ambulance = Ambulance::register(input, Utc::now())?;
        let stored = self.store.add(ambulance).await?;
        info!(ambulance_id = %stored.id, status = %stored.status, "ambulance_registered");
        Ok(stored)
    }

    /// Flip `Available` <-> `Busy`, move to the given location and append one
    /// history entry stamped now.
    #[instrument(skip(self, update), fields(ambulance_id = %id))]
    pub async fn toggle_status(&self, id: &str, update: LocationUpdate) -> Result<Ambulance, ServiceError> {
        let updated = self.apply_move(id, update).await?;
        info!(
            ambulance_id = %updated.id,
            status = %updated.status,
            history_len = updated.location_history.len(),
            "ambulance_status_toggled"
        );
        Ok(updated)
    }

    /// Manual location update from typed input. Has the same effect as a
    /// status toggle: the status flips and one history entry is appended.
    #[instrument(skip(self, update), fields(ambulance_id = %id))]
    pub async fn update_location(&self, id: &str, update: LocationUpdate) -> Result<Ambulance, ServiceError> {
        let updated = self.apply_move(id, update).await?;
        info!(
            ambulance_id = %updated.id,
            status = %updated.status,
            location = %updated.current_location,
            "ambulance_location_updated"
        );
        Ok(updated)
    }

    async fn apply_move(&self, id: &str, update: LocationUpdate) -> Result<Ambulance, ServiceError> {
        self.store
            .update(id, |ambulance| {
                let (location, coords) = update.validate()?;
                ambulance.toggle_status(location, coords, Utc::now());
                Ok(())
            })
            .await
    }

    /// Full location history, oldest first.
    pub async fn history(&self, id: &str) -> Result<Vec<LocationEntry>, ServiceError> {
        self.store
            .get(id)
            .await
            .map(|a| a.location_history)
            .ok_or_else(|| ServiceError::not_found("ambulance", id))
    }

    pub async fn get(&self, id: &str) -> Option<Ambulance> {
        self.store.get(id).await
    }

    /// All ambulances in registration order.
    pub async fn list(&self) -> Vec<Ambulance> {
        self.store.list().await
    }

    /// Re-read the persisted collection, discarding in-memory state.
    pub async fn reload(&self) -> usize {
        self.store.load().await.count
    }
}
