use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveDate;
use tracing::info;

use super::dashboard::DashboardView;
use super::domain::{
    DraftError, Payment, PaymentDraft, PaymentId, PaymentUpdate, Room, RoomDraft, RoomId,
    RoomUpdate, Tenant, TenantDraft, TenantId, TenantUpdate,
};
use super::ledger::{LedgerError, PaymentLedger};
use super::occupancy::{Assignment, OccupancyEngine, OccupancyError};
use super::repository::{PropertyRepository, RepositoryError};
use super::search::{PaymentFilter, RoomFilter, TenantFilter};
use super::status::StatusParseError;
use crate::media::{ImageUpload, ImageUploader, UploadError};

/// Service composing the repository, occupancy rules, ledger, and image host.
pub struct PropertyService<R, U> {
    repository: Arc<R>,
    uploader: Arc<U>,
    occupancy: OccupancyEngine<R>,
    ledger: PaymentLedger<R>,
}

impl<R, U> PropertyService<R, U>
where
    R: PropertyRepository + 'static,
    U: ImageUploader + 'static,
{
    pub fn new(repository: Arc<R>, uploader: Arc<U>) -> Self {
        Self {
            occupancy: OccupancyEngine::new(repository.clone()),
            ledger: PaymentLedger::new(repository.clone()),
            repository,
            uploader,
        }
    }

    pub fn occupancy(&self) -> &OccupancyEngine<R> {
        &self.occupancy
    }

    pub fn ledger(&self) -> &PaymentLedger<R> {
        &self.ledger
    }

    pub fn dashboard(&self) -> Result<DashboardView, PropertyServiceError> {
        let tenants = self.repository.tenants()?;
        let rooms = self.repository.rooms()?;
        let payments = self.repository.payments()?;
        Ok(DashboardView::build(&tenants, &rooms, &payments))
    }

    pub fn tenants(&self, filter: &TenantFilter) -> Result<Vec<Tenant>, PropertyServiceError> {
        Ok(filter.apply(self.repository.tenants()?))
    }

    pub fn tenant(&self, id: &TenantId) -> Result<Tenant, PropertyServiceError> {
        self.repository
            .tenant(id)?
            .ok_or_else(|| PropertyServiceError::TenantNotFound(id.clone()))
    }

    pub fn register_tenant(&self, draft: TenantDraft) -> Result<Tenant, PropertyServiceError> {
        let tenant = draft.build(TenantId::generate())?;
        let stored = self.repository.insert_tenant(tenant)?;
        info!(tenant = %stored.id, "tenant registered");
        Ok(stored)
    }

    pub fn update_tenant(
        &self,
        id: &TenantId,
        update: TenantUpdate,
    ) -> Result<Tenant, PropertyServiceError> {
        let patch = update.validated()?.to_storage();
        match self.repository.update_tenant(id, patch) {
            Err(RepositoryError::NotFound) => Err(PropertyServiceError::TenantNotFound(id.clone())),
            result => Ok(result?),
        }
    }

    pub fn remove_tenant(&self, id: &TenantId) -> Result<Tenant, PropertyServiceError> {
        Ok(self.occupancy.delete_tenant(id)?)
    }

    /// Assigns an unplaced tenant, or moves a placed one.
    pub fn place_tenant(
        &self,
        id: &TenantId,
        room_id: &RoomId,
    ) -> Result<Assignment, PropertyServiceError> {
        let tenant = self.tenant(id)?;
        if tenant.is_assigned() {
            let moved = self.occupancy.reassign(id, room_id)?;
            Ok(Assignment {
                tenant: moved.tenant,
                room: moved.to,
            })
        } else {
            Ok(self.occupancy.assign(id, room_id)?)
        }
    }

    pub fn vacate_tenant(&self, id: &TenantId) -> Result<Assignment, PropertyServiceError> {
        Ok(self.occupancy.unassign(id)?)
    }

    pub fn rooms(&self, filter: &RoomFilter) -> Result<Vec<Room>, PropertyServiceError> {
        Ok(filter.apply(self.repository.rooms()?))
    }

    pub fn room(&self, id: &RoomId) -> Result<Room, PropertyServiceError> {
        self.repository
            .room(id)?
            .ok_or_else(|| PropertyServiceError::RoomNotFound(id.clone()))
    }

    pub fn add_room(&self, draft: RoomDraft) -> Result<Room, PropertyServiceError> {
        let room = draft.build(RoomId::generate())?;
        let stored = self.repository.insert_room(room)?;
        info!(room = %stored.id, number = %stored.number, "room added");
        Ok(stored)
    }

    /// Edits listing attributes. Capacity may not drop below current
    /// occupants; the store re-checks that against membership at write time.
    pub fn update_room(
        &self,
        id: &RoomId,
        update: RoomUpdate,
    ) -> Result<Room, PropertyServiceError> {
        let update = update.validated()?;
        let room = self.room(id)?;
        if let Some(capacity) = update.capacity {
            if (capacity as usize) < room.occupants() {
                return Err(OccupancyError::CapacityExceeded {
                    room: id.clone(),
                    capacity,
                }
                .into());
            }
        }
        let updated = self.repository.update_room(id, update.to_storage())?;
        info!(room = %id, "room listing updated");
        Ok(updated)
    }

    pub fn remove_room(&self, id: &RoomId) -> Result<Room, PropertyServiceError> {
        Ok(self.occupancy.delete_room(id)?)
    }

    /// Uploads a photo and appends its URL to the room. The room is checked
    /// before the upload so a missing room never leaves an orphaned image.
    pub async fn attach_room_image(
        &self,
        id: &RoomId,
        image: ImageUpload,
    ) -> Result<Room, PropertyServiceError> {
        self.room(id)?;
        image.validate()?;
        let url = self.uploader.upload(image).await?;

        let room = match self.repository.add_room_image(id, url) {
            Err(RepositoryError::NotFound) => {
                return Err(PropertyServiceError::RoomNotFound(id.clone()))
            }
            result => result?,
        };
        info!(room = %id, images = room.images.len(), "room image attached");
        Ok(room)
    }

    pub fn payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>, PropertyServiceError> {
        let tenants = self.repository.tenants()?;
        let rooms = self.repository.rooms()?;
        Ok(filter.apply(self.repository.payments()?, &tenants, &rooms))
    }

    pub fn record_payment(
        &self,
        draft: PaymentDraft,
        today: NaiveDate,
    ) -> Result<Payment, PropertyServiceError> {
        Ok(self.ledger.record(draft, today)?)
    }

    pub fn amend_payment(
        &self,
        id: &PaymentId,
        update: PaymentUpdate,
    ) -> Result<Payment, PropertyServiceError> {
        Ok(self.ledger.amend(id, update)?)
    }

    pub fn settle_payment(
        &self,
        id: &PaymentId,
        today: NaiveDate,
    ) -> Result<Payment, PropertyServiceError> {
        Ok(self.ledger.mark_paid(id, today)?)
    }

    pub fn reopen_payment(&self, id: &PaymentId) -> Result<Payment, PropertyServiceError> {
        Ok(self.ledger.mark_unpaid(id)?)
    }

    pub fn flag_overdue(&self, id: &PaymentId) -> Result<Payment, PropertyServiceError> {
        Ok(self.ledger.mark_overdue(id)?)
    }
}

/// Error raised by the property service.
#[derive(Debug, thiserror::Error)]
pub enum PropertyServiceError {
    #[error("tenant {0} not found")]
    TenantNotFound(TenantId),
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Status(#[from] StatusParseError),
    #[error(transparent)]
    Occupancy(#[from] OccupancyError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PropertyServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PropertyServiceError::TenantNotFound(_) | PropertyServiceError::RoomNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            PropertyServiceError::Draft(_) | PropertyServiceError::Status(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PropertyServiceError::Occupancy(err) => match err {
                OccupancyError::TenantNotFound(_) | OccupancyError::RoomNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                OccupancyError::Store(err) => repository_status(err),
                _ => StatusCode::CONFLICT,
            },
            PropertyServiceError::Ledger(err) => match err {
                LedgerError::PaymentNotFound(_)
                | LedgerError::TenantNotFound(_)
                | LedgerError::RoomNotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::AlreadyPaid(_) => StatusCode::CONFLICT,
                LedgerError::Draft(_) | LedgerError::RoomMismatch { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                LedgerError::Store(err) => repository_status(err),
            },
            PropertyServiceError::Upload(err) => match err {
                UploadError::EmptyFile | UploadError::UnsupportedMedia(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                UploadError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            },
            PropertyServiceError::Repository(err) => repository_status(err),
        }
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::Conflict | RepositoryError::Stale(_) => StatusCode::CONFLICT,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
