//! TripRepository - Repository per la gestione dei viaggi
//!
//! Ogni modifica ad un viaggio passa da [`TripRepository::modify`]: la closure riceve il
//! documento appena letto e viene rieseguita in caso di conflitto di versione, quindi deve
//! limitarsi a trasformare il documento (le transizioni di `crate::membership` lo sono).

use super::{Create, Document, DocumentStore, Read, ReadMany, StoreError};
use crate::dtos::CreateTripDTO;
use crate::entities::{Trip, TripStatus};
use chrono::Utc;
use serde_json::json;
use tracing::instrument;

impl Document for Trip {
    const COLLECTION: &'static str = "trips";

    fn id(&self) -> i32 {
        self.trip_id
    }

    fn set_id(&mut self, id: i32) {
        self.trip_id = id;
    }
}

// TRIP REPO
pub struct TripRepository {
    store: DocumentStore,
}

impl TripRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Read-modify-write con retry sul conflitto di versione, aggiorna `updated_at`.
    /// Se `apply` ritorna `Err` il viaggio non viene salvato.
    #[instrument(skip(self, apply))]
    pub async fn modify<R, E, F>(&self, trip_id: i32, mut apply: F) -> Result<(Trip, R), E>
    where
        F: FnMut(&mut Trip) -> Result<R, E>,
        E: From<StoreError>,
    {
        self.store
            .modify(trip_id, |trip: &mut Trip| {
                let outcome = apply(trip)?;
                trip.updated_at = Utc::now();
                Ok(outcome)
            })
            .await
    }

    /// Elimina il viaggio se `check` lo consente, ritornandolo con i membri al momento
    /// dell'eliminazione
    #[instrument(skip(self, check))]
    pub async fn remove<E, F>(&self, trip_id: i32, check: F) -> Result<Trip, E>
    where
        F: FnMut(&Trip) -> Result<(), E>,
        E: From<StoreError>,
    {
        self.store.remove(trip_id, check).await
    }

    pub async fn find_public(&self) -> Result<Vec<Trip>, StoreError> {
        self.store.find_by_field("is_public", json!(true)).await
    }

    pub async fn find_all(&self) -> Result<Vec<Trip>, StoreError> {
        self.store.find_all().await
    }
}

impl Create<Trip, CreateTripDTO> for TripRepository {
    async fn create(&self, data: &CreateTripDTO) -> Result<Trip, StoreError> {
        let now = Utc::now();
        let trip = Trip {
            trip_id: 0,
            title: data.title.trim().to_string(),
            description: data.description.clone(),
            destination: data.destination.clone(),
            estimated_budget: data.estimated_budget,
            duration_days: data.duration_days,
            itinerary: data.itinerary.clone(),
            packing_essentials: data.packing_essentials.clone(),
            tags: data.tags.clone(),
            cover_photo: data.cover_photo.clone(),
            photos: data.photos.clone(),
            host: data.host,
            members: vec![Trip::host_member(data.host)],
            is_public: data.is_public,
            status: TripStatus::Planning,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(trip).await
    }
}

impl Read<Trip, i32> for TripRepository {
    async fn read(&self, id: &i32) -> Result<Option<Trip>, StoreError> {
        self.store.get(*id).await
    }
}

impl ReadMany<Trip, i32> for TripRepository {
    async fn read_many(&self, ids: &[i32]) -> Result<Vec<Trip>, StoreError> {
        self.store.get_many(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Decision, MemberRole, MemberStatus};
    use crate::membership::MembershipError;

    #[derive(Debug)]
    enum TestError {
        Store(StoreError),
        Membership(MembershipError),
    }

    impl From<StoreError> for TestError {
        fn from(e: StoreError) -> Self {
            TestError::Store(e)
        }
    }

    impl From<MembershipError> for TestError {
        fn from(e: MembershipError) -> Self {
            TestError::Membership(e)
        }
    }

    fn new_trip(host: i32, is_public: bool) -> CreateTripDTO {
        CreateTripDTO {
            host,
            title: "  Kyoto ".to_string(),
            description: None,
            destination: Some("Japan".to_string()),
            estimated_budget: None,
            duration_days: Some(7),
            itinerary: vec![],
            packing_essentials: vec![],
            tags: vec!["food".to_string()],
            cover_photo: None,
            photos: vec![],
            is_public,
        }
    }

    #[tokio::test]
    async fn test_create_starts_with_host_member() {
        let repo = TripRepository::new(DocumentStore::in_memory());
        let trip = repo.create(&new_trip(1, false)).await.unwrap();

        assert_eq!(trip.title, "Kyoto");
        assert_eq!(trip.members().len(), 1);
        let host = trip.member(1).unwrap();
        assert_eq!(host.role, MemberRole::Host);
        assert_eq!(host.status, MemberStatus::Accepted);
    }

    #[tokio::test]
    async fn test_transition_is_persisted() {
        let repo = TripRepository::new(DocumentStore::in_memory());
        let trip = repo.create(&new_trip(1, false)).await.unwrap();

        repo.modify::<_, TestError, _>(trip.trip_id, |t| Ok(t.invite(1, 2)?))
            .await
            .unwrap();
        repo.modify::<_, TestError, _>(trip.trip_id, |t| {
            Ok(t.respond_to_invitation(2, Decision::Accept)?)
        })
        .await
        .unwrap();

        let stored = repo.read(&trip.trip_id).await.unwrap().unwrap();
        assert_eq!(stored.member(2).unwrap().status, MemberStatus::Accepted);
    }

    #[tokio::test]
    async fn test_rejected_transition_is_not_persisted() {
        let repo = TripRepository::new(DocumentStore::in_memory());
        let trip = repo.create(&new_trip(1, false)).await.unwrap();

        let result = repo
            .modify::<_, TestError, _>(trip.trip_id, |t| Ok(t.request_join(2)?))
            .await;
        assert!(matches!(
            result,
            Err(TestError::Membership(MembershipError::Forbidden(_)))
        ));

        let stored = repo.read(&trip.trip_id).await.unwrap().unwrap();
        assert_eq!(stored.members().len(), 1);
        assert_eq!(stored.updated_at, trip.updated_at);
    }

    #[tokio::test]
    async fn test_remove_returns_members_at_deletion() {
        let repo = TripRepository::new(DocumentStore::in_memory());
        let trip = repo.create(&new_trip(1, false)).await.unwrap();

        // membro accettato dopo una lettura precedente
        let stale = repo.read(&trip.trip_id).await.unwrap().unwrap();
        repo.modify::<_, TestError, _>(trip.trip_id, |t| Ok(t.invite(1, 2)?))
            .await
            .unwrap();
        repo.modify::<_, TestError, _>(trip.trip_id, |t| {
            Ok(t.respond_to_invitation(2, Decision::Accept)?)
        })
        .await
        .unwrap();

        let removed = repo
            .remove::<TestError, _>(trip.trip_id, |_| Ok(()))
            .await
            .unwrap();
        assert!(stale.member(2).is_none());
        assert_eq!(removed.member(2).unwrap().status, MemberStatus::Accepted);
        assert!(repo.read(&trip.trip_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_trip() {
        let repo = TripRepository::new(DocumentStore::in_memory());
        let result = repo
            .modify::<_, TestError, _>(77, |t| Ok(t.request_join(2)?))
            .await;
        assert!(matches!(result, Err(TestError::Store(StoreError::NotFound))));
    }

    #[tokio::test]
    async fn test_find_public() {
        let repo = TripRepository::new(DocumentStore::in_memory());
        repo.create(&new_trip(1, true)).await.unwrap();
        repo.create(&new_trip(1, false)).await.unwrap();
        assert_eq!(repo.find_public().await.unwrap().len(), 1);
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }
}
