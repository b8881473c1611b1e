use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::media::{ImageUpload, ImageUploader, UploadError};
use crate::property::domain::{Payment, PaymentId, Room, RoomId, Tenant, TenantDraft, TenantId};
use crate::property::fixtures::seed_snapshot;
use crate::property::records::{RoomPatch, TenantPatch};
use crate::property::occupancy::audit;
use crate::property::repository::{OccupancyChange, PropertyRepository, RepositoryError};
use crate::property::{InMemoryPropertyRepository, PropertyService};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn tenant_id(raw: &str) -> TenantId {
    TenantId::new(raw)
}

pub(super) fn room_id(raw: &str) -> RoomId {
    RoomId::new(raw)
}

pub(super) fn seeded_store() -> InMemoryPropertyRepository {
    InMemoryPropertyRepository::from_snapshot(seed_snapshot()).expect("seed data is consistent")
}

pub(super) fn seeded_repository() -> Arc<InMemoryPropertyRepository> {
    Arc::new(seeded_store())
}

pub(super) fn build_service() -> (
    PropertyService<InMemoryPropertyRepository, MemoryUploader>,
    Arc<InMemoryPropertyRepository>,
    Arc<MemoryUploader>,
) {
    let repository = seeded_repository();
    let uploader = Arc::new(MemoryUploader::default());
    let service = PropertyService::new(repository.clone(), uploader.clone());
    (service, repository, uploader)
}

pub(super) fn tenant_draft(name: &str, email: &str) -> TenantDraft {
    TenantDraft {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        phone: Some("555-0100".to_string()),
        date_joined: Some(date(2024, 6, 1)),
        ..TenantDraft::default()
    }
}

/// Fails the test if room lists and tenant references disagree.
pub(super) fn assert_consistent<R: PropertyRepository>(repository: &R) {
    let rooms = repository.rooms().expect("rooms readable");
    let tenants = repository.tenants().expect("tenants readable");
    let violations = audit(&rooms, &tenants);
    assert!(violations.is_empty(), "occupancy drifted: {violations:?}");
}

pub(super) fn room_of<R: PropertyRepository>(repository: &R, id: &str) -> Room {
    repository
        .room(&room_id(id))
        .expect("store readable")
        .expect("room present")
}

pub(super) fn tenant_of<R: PropertyRepository>(repository: &R, id: &str) -> Tenant {
    repository
        .tenant(&tenant_id(id))
        .expect("store readable")
        .expect("tenant present")
}

#[derive(Default)]
pub(super) struct MemoryUploader {
    uploads: Mutex<Vec<String>>,
}

impl MemoryUploader {
    pub(super) fn uploads(&self) -> Vec<String> {
        self.uploads.lock().expect("uploader mutex poisoned").clone()
    }
}

impl ImageUploader for MemoryUploader {
    async fn upload(&self, image: ImageUpload) -> Result<String, UploadError> {
        image.validate()?;
        let url = format!("https://images.test/rooms/{}", image.file_name);
        self.uploads
            .lock()
            .expect("uploader mutex poisoned")
            .push(url.clone());
        Ok(url)
    }
}

pub(super) struct OfflineUploader;

impl ImageUploader for OfflineUploader {
    async fn upload(&self, _image: ImageUpload) -> Result<String, UploadError> {
        Err(UploadError::UploadFailed("image host offline".to_string()))
    }
}

/// Seeded store whose occupancy commits always fail, for rollback checks.
pub(super) struct CommitFailingRepository {
    pub(super) inner: InMemoryPropertyRepository,
}

impl CommitFailingRepository {
    pub(super) fn seeded() -> Self {
        Self {
            inner: seeded_store(),
        }
    }
}

impl PropertyRepository for CommitFailingRepository {
    fn tenants(&self) -> Result<Vec<Tenant>, RepositoryError> {
        self.inner.tenants()
    }

    fn tenant(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        self.inner.tenant(id)
    }

    fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        self.inner.insert_tenant(tenant)
    }

    fn update_tenant(&self, id: &TenantId, patch: TenantPatch) -> Result<Tenant, RepositoryError> {
        self.inner.update_tenant(id, patch)
    }

    fn rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        self.inner.rooms()
    }

    fn room(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        self.inner.room(id)
    }

    fn insert_room(&self, room: Room) -> Result<Room, RepositoryError> {
        self.inner.insert_room(room)
    }

    fn update_room(&self, id: &RoomId, patch: RoomPatch) -> Result<Room, RepositoryError> {
        self.inner.update_room(id, patch)
    }

    fn add_room_image(&self, id: &RoomId, url: String) -> Result<Room, RepositoryError> {
        self.inner.add_room_image(id, url)
    }

    fn delete_room(&self, id: &RoomId) -> Result<(), RepositoryError> {
        self.inner.delete_room(id)
    }

    fn payments(&self) -> Result<Vec<Payment>, RepositoryError> {
        self.inner.payments()
    }

    fn payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        self.inner.payment(id)
    }

    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        self.inner.insert_payment(payment)
    }

    fn update_payment(&self, payment: Payment) -> Result<(), RepositoryError> {
        self.inner.update_payment(payment)
    }

    fn commit(&self, _change: OccupancyChange) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("write rejected".to_string()))
    }
}

type Interleaved = Box<dyn FnOnce(&Arc<InMemoryPropertyRepository>) + Send>;

/// Shared store that runs a competing operation right before the next commit
/// reaches it, as a second request would on another worker thread.
pub(super) struct InterleavingRepository {
    pub(super) inner: Arc<InMemoryPropertyRepository>,
    before_commit: Mutex<Option<Interleaved>>,
}

impl InterleavingRepository {
    pub(super) fn new(
        inner: Arc<InMemoryPropertyRepository>,
        competitor: impl FnOnce(&Arc<InMemoryPropertyRepository>) + Send + 'static,
    ) -> Self {
        Self {
            inner,
            before_commit: Mutex::new(Some(Box::new(competitor))),
        }
    }

    fn interleave(&self) {
        let competitor = self
            .before_commit
            .lock()
            .expect("hook mutex poisoned")
            .take();
        if let Some(competitor) = competitor {
            competitor(&self.inner);
        }
    }
}

impl PropertyRepository for InterleavingRepository {
    fn tenants(&self) -> Result<Vec<Tenant>, RepositoryError> {
        self.inner.tenants()
    }

    fn tenant(&self, id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        self.inner.tenant(id)
    }

    fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        self.inner.insert_tenant(tenant)
    }

    fn update_tenant(&self, id: &TenantId, patch: TenantPatch) -> Result<Tenant, RepositoryError> {
        self.inner.update_tenant(id, patch)
    }

    fn rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        self.inner.rooms()
    }

    fn room(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        self.inner.room(id)
    }

    fn insert_room(&self, room: Room) -> Result<Room, RepositoryError> {
        self.inner.insert_room(room)
    }

    fn update_room(&self, id: &RoomId, patch: RoomPatch) -> Result<Room, RepositoryError> {
        self.interleave();
        self.inner.update_room(id, patch)
    }

    fn add_room_image(&self, id: &RoomId, url: String) -> Result<Room, RepositoryError> {
        self.interleave();
        self.inner.add_room_image(id, url)
    }

    fn delete_room(&self, id: &RoomId) -> Result<(), RepositoryError> {
        self.interleave();
        self.inner.delete_room(id)
    }

    fn payments(&self) -> Result<Vec<Payment>, RepositoryError> {
        self.inner.payments()
    }

    fn payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        self.inner.payment(id)
    }

    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        self.inner.insert_payment(payment)
    }

    fn update_payment(&self, payment: Payment) -> Result<(), RepositoryError> {
        self.inner.update_payment(payment)
    }

    fn commit(&self, change: OccupancyChange) -> Result<(), RepositoryError> {
        self.interleave();
        self.inner.commit(change)
    }
}

pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl PropertyRepository for UnavailableRepository {
    fn tenants(&self) -> Result<Vec<Tenant>, RepositoryError> {
        offline()
    }

    fn tenant(&self, _id: &TenantId) -> Result<Option<Tenant>, RepositoryError> {
        offline()
    }

    fn insert_tenant(&self, _tenant: Tenant) -> Result<Tenant, RepositoryError> {
        offline()
    }

    fn update_tenant(&self, _id: &TenantId, _patch: TenantPatch) -> Result<Tenant, RepositoryError> {
        offline()
    }

    fn rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        offline()
    }

    fn room(&self, _id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        offline()
    }

    fn insert_room(&self, _room: Room) -> Result<Room, RepositoryError> {
        offline()
    }

    fn update_room(&self, _id: &RoomId, _patch: RoomPatch) -> Result<Room, RepositoryError> {
        offline()
    }

    fn add_room_image(&self, _id: &RoomId, _url: String) -> Result<Room, RepositoryError> {
        offline()
    }

    fn delete_room(&self, _id: &RoomId) -> Result<(), RepositoryError> {
        offline()
    }

    fn payments(&self) -> Result<Vec<Payment>, RepositoryError> {
        offline()
    }

    fn payment(&self, _id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        offline()
    }

    fn insert_payment(&self, _payment: Payment) -> Result<Payment, RepositoryError> {
        offline()
    }

    fn update_payment(&self, _payment: Payment) -> Result<(), RepositoryError> {
        offline()
    }

    fn commit(&self, _change: OccupancyChange) -> Result<(), RepositoryError> {
        offline()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
