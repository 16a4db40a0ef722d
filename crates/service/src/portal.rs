//! Portal facade: the operations the presentation layer calls.
//!
//! Takes and returns plain values only. Rendering is left to whoever
//! subscribes as an [`AmbulanceListObserver`].

use std::{sync::Arc, time::Duration};

use models::{
    ambulance::{Ambulance, Coordinates, LocationEntry, LocationUpdate, NewAmbulance},
    user::{Registration, UserProfile},
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::ambulance::{history_report, AmbulanceDirectory};
use crate::auth::{AuthKind, CredentialDirectory, Session};
use crate::errors::ServiceError;
use crate::geocode::{DebouncedLookup, GeocodeAdapter, LookupMode, LookupOutcome};

/// Receives the full ordered ambulance list after every change.
pub trait AmbulanceListObserver: Send + Sync {
    fn on_ambulance_list_changed(&self, ambulances: &[Ambulance]);
}

/// Form field a coordinate lookup belongs to. Each field debounces on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupField {
    AddForm,
    StatusUpdate,
}

pub struct DispatchPortal {
    ambulances: Arc<AmbulanceDirectory>,
    credentials: Arc<CredentialDirectory>,
    geocoder: Arc<dyn GeocodeAdapter>,
    add_form_lookup: DebouncedLookup,
    status_lookup: DebouncedLookup,
    observers: RwLock<Vec<Arc<dyn AmbulanceListObserver>>>,
}

impl DispatchPortal {
    pub fn new(
        ambulances: Arc<AmbulanceDirectory>,
        credentials: Arc<CredentialDirectory>,
        geocoder: Arc<dyn GeocodeAdapter>,
        debounce: Duration,
    ) -> Self {
        Self {
            add_form_lookup: DebouncedLookup::new(Arc::clone(&geocoder), debounce),
            status_lookup: DebouncedLookup::new(Arc::clone(&geocoder), debounce),
            ambulances,
            credentials,
            geocoder,
            observers: RwLock::new(Vec::new()),
        }
    }

    pub async fn subscribe(&self, observer: Arc<dyn AmbulanceListObserver>) {
        self.observers.write().await.push(observer);
    }

    pub fn credentials(&self) -> &CredentialDirectory { &self.credentials }

    pub async fn ambulances(&self) -> Vec<Ambulance> {
        self.ambulances.list().await
    }

    pub async fn ambulance(&self, id: &str) -> Result<Ambulance, ServiceError> {
        self.ambulances.get(id).await.ok_or_else(|| ServiceError::not_found("ambulance", id))
    }

    pub async fn register_ambulance(&self, input: NewAmbulance) -> Result<Ambulance, ServiceError> {
        let created = self.ambulances.register(input).await?;
        self.notify().await;
        Ok(created)
    }

    pub async fn on_status_toggle_requested(&self, id: &str, update: LocationUpdate) -> Result<Ambulance, ServiceError> {
        let updated = self.ambulances.toggle_status(id, update).await?;
        self.notify().await;
        Ok(updated)
    }

    /// Resolve a typed address right away and apply it as a manual location
    /// update. Nothing changes if the address cannot be resolved.
    pub async fn update_location_from_input(&self, id: &str, address: &str) -> Result<Ambulance, ServiceError> {
        if address.trim().is_empty() {
            return Err(ServiceError::Validation("location is required".into()));
        }
        let place = match self.status_lookup.lookup(address, LookupMode::Manual).await? {
            LookupOutcome::Resolved(place) => place,
            LookupOutcome::Cleared | LookupOutcome::Superseded => {
                return Err(ServiceError::Validation("location is required".into()))
            }
        };
        let update = LocationUpdate::new(address.trim(), place.latitude, place.longitude);
        let updated = self.ambulances.update_location(id, update).await?;
        self.notify().await;
        Ok(updated)
    }

    pub async fn on_history_requested(&self, id: &str) -> Result<Vec<LocationEntry>, ServiceError> {
        self.ambulances.history(id).await
    }

    pub async fn history_report(&self, id: &str) -> Result<String, ServiceError> {
        Ok(history_report(&self.ambulances.history(id).await?))
    }

    pub async fn on_auth_requested(&self, kind: AuthKind, username: &str, password: &str) -> bool {
        self.credentials.authenticate(kind, username, password).await
    }

    pub async fn login(&self, kind: AuthKind, username: &str, password: &str) -> Option<Session> {
        self.credentials.login(kind, username, password).await
    }

    pub async fn register_user(&self, registration: Registration) -> Result<UserProfile, ServiceError> {
        self.credentials.register(registration).await
    }

    pub async fn lookup_coordinates(
        &self,
        field: LookupField,
        address: &str,
        mode: LookupMode,
    ) -> Result<LookupOutcome, ServiceError> {
        let lookup = match field {
            LookupField::AddForm => &self.add_form_lookup,
            LookupField::StatusUpdate => &self.status_lookup,
        };
        lookup.lookup(address, mode).await
    }

    /// Best label for a point: the service's display name, or the formatted
    /// coordinates when the reverse lookup fails.
    pub async fn describe_coordinates(&self, coords: Coordinates) -> String {
        match self.geocoder.resolve_coordinates(coords.latitude, coords.longitude).await {
            Ok(place) => place.display_name,
            Err(e) => {
                warn!(error = %e, "reverse lookup failed; using coordinates as label");
                coords.label()
            }
        }
    }

    async fn notify(&self) {
        let observers = self.observers.read().await;
        if observers.is_empty() {
            return;
        }
        let list = self.ambulances.list().await;
        debug!(observers = observers.len(), count = list.len(), "ambulance list changed");
        for observer in observers.iter() {
            observer.on_ambulance_list_changed(&list);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialSeeds;
    use crate::errors::AdapterError;
    use crate::storage::MemoryBlobStore;
    use crate::test_support::{cheap_hasher, new_ambulance, registration, FakeGeocoder};
    use models::ambulance::AmbulanceStatus;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        snapshots: Mutex<Vec<Vec<String>>>,
    }

    impl AmbulanceListObserver for Recorder {
        fn on_ambulance_list_changed(&self, ambulances: &[Ambulance]) {
            let ids = ambulances.iter().map(|a| format!("{}:{}", a.id, a.status)).collect();
            self.snapshots.lock().unwrap().push(ids);
        }
    }

    async fn portal() -> (DispatchPortal, Arc<FakeGeocoder>) {
        let blobs = MemoryBlobStore::new();
        let ambulances = Arc::new(AmbulanceDirectory::open(blobs.clone()).await);
        let credentials = Arc::new(
            CredentialDirectory::open(blobs, cheap_hasher(), CredentialSeeds::default()).await.unwrap(),
        );
        let fake = FakeGeocoder::new();
        let portal = DispatchPortal::new(ambulances, credentials, fake.clone(), Duration::from_millis(500));
        (portal, fake)
    }

    #[tokio::test]
    async fn observers_see_every_change() -> Result<(), anyhow::Error> {
        let (portal, _) = portal().await;
        let recorder = Arc::new(Recorder::default());
        portal.subscribe(recorder.clone()).await;

        portal.register_ambulance(new_ambulance("A1")).await?;
        portal.register_ambulance(new_ambulance("A2")).await?;
        portal.on_status_toggle_requested("A1", LocationUpdate::new("Bus Stand", 12.95, 77.65)).await?;
        // failures do not notify
        assert!(portal.register_ambulance(new_ambulance("A1")).await.is_err());

        let snapshots = recorder.snapshots.lock().unwrap().clone();
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[2], vec!["A1:Busy".to_string(), "A2:Available".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn history_and_report() -> Result<(), anyhow::Error> {
        let (portal, _) = portal().await;
        portal.register_ambulance(new_ambulance("A1")).await?;
        portal.on_status_toggle_requested("A1", LocationUpdate::new("Bus Stand", 12.95, 77.65)).await?;
        assert_eq!(portal.on_history_requested("A1").await?.len(), 2);
        let report = portal.history_report("A1").await?;
        assert!(report.starts_with("Location History:"));
        assert!(report.contains("Location: Bus Stand\nCoordinates: 12.95, 77.65"));
        assert!(matches!(portal.history_report("none").await, Err(ServiceError::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn auth_requests_route_by_kind() -> Result<(), anyhow::Error> {
        let (portal, _) = portal().await;
        portal.register_user(registration("u1", "pw1")).await?;
        portal.credentials().add_admin("admin1", "admin123").await?;
        assert!(portal.on_auth_requested(AuthKind::User, "u1", "pw1").await);
        assert!(!portal.on_auth_requested(AuthKind::Admin, "u1", "pw1").await);
        assert!(portal.on_auth_requested(AuthKind::Admin, "admin1", "admin123").await);
        assert_eq!(portal.login(AuthKind::User, "u1", "pw1").await.unwrap().username, "u1");
        Ok(())
    }

    #[tokio::test]
    async fn update_from_input_resolves_then_moves() -> Result<(), anyhow::Error> {
        let (portal, fake) = portal().await;
        portal.register_ambulance(new_ambulance("A1")).await?;

        let moved = portal.update_location_from_input("A1", "Bus Stand").await?;
        assert_eq!(moved.status, AmbulanceStatus::Busy);
        assert_eq!(moved.current_location, "Bus Stand");
        assert_eq!((moved.latitude, moved.longitude), (12.95, 77.65));
        assert_eq!(fake.address_calls(), vec!["Bus Stand".to_string()]);

        // unresolvable address: adapter error, record untouched
        let err = portal.update_location_from_input("A1", FakeGeocoder::UNKNOWN).await.unwrap_err();
        assert!(matches!(err, ServiceError::Adapter(_)));
        assert_eq!(portal.on_history_requested("A1").await?.len(), 2);

        // service down: its own message, record untouched
        let err = portal.update_location_from_input("A1", FakeGeocoder::OFFLINE).await.unwrap_err();
        assert!(matches!(err, ServiceError::Adapter(AdapterError::Unavailable(_))));
        assert_eq!(err.notification(), "Error getting coordinates. Please try again.");
        let a1 = portal.ambulance("A1").await?;
        assert_eq!(a1.current_location, "Bus Stand");
        assert_eq!(a1.status, AmbulanceStatus::Busy);
        assert_eq!(a1.location_history.len(), 2);

        assert!(matches!(portal.update_location_from_input("A1", " ").await, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_fields_debounce_independently() -> Result<(), anyhow::Error> {
        let (portal, fake) = portal().await;
        let (add, status) = tokio::join!(
            portal.lookup_coordinates(LookupField::AddForm, "Depot", LookupMode::Debounced),
            portal.lookup_coordinates(LookupField::StatusUpdate, "Bus Stand", LookupMode::Debounced),
        );
        assert!(matches!(add?, LookupOutcome::Resolved(_)));
        assert!(matches!(status?, LookupOutcome::Resolved(_)));
        assert_eq!(fake.address_calls().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn describe_falls_back_to_coordinates() -> Result<(), anyhow::Error> {
        let (portal, _) = portal().await;
        assert_eq!(portal.describe_coordinates(Coordinates::new(12.95, 77.65)?).await, "Bus Stand");
        assert_eq!(portal.describe_coordinates(Coordinates::new(0.0, 0.0)?).await, "0.000000, 0.000000");
        Ok(())
    }
}
