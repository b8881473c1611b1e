use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use super::domain::{
    DraftError, Payment, PaymentDraft, PaymentId, PaymentUpdate, RoomId, TenantId,
};
use super::repository::{PropertyRepository, RepositoryError};
use super::status::PaymentStatus;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),
    #[error("tenant {0} not found")]
    TenantNotFound(TenantId),
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    #[error("tenant {tenant} lives in room {current}, not room {room}")]
    RoomMismatch {
        tenant: TenantId,
        room: RoomId,
        current: RoomId,
    },
    #[error("payment {0} is already paid")]
    AlreadyPaid(PaymentId),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Rent charges and their status transitions.
pub struct PaymentLedger<R> {
    repository: Arc<R>,
}

impl<R> PaymentLedger<R>
where
    R: PropertyRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    fn load(&self, id: &PaymentId) -> Result<Payment, LedgerError> {
        self.repository
            .payment(id)?
            .ok_or_else(|| LedgerError::PaymentNotFound(id.clone()))
    }

    /// Records a charge. The room defaults to the tenant's current room; an
    /// explicit room must exist and, for a placed tenant, be that room.
    pub fn record(&self, mut draft: PaymentDraft, today: NaiveDate) -> Result<Payment, LedgerError> {
        let tenant_id = draft
            .tenant_id
            .clone()
            .ok_or(DraftError::MissingField("tenantId"))?;
        let tenant = self
            .repository
            .tenant(&tenant_id)?
            .ok_or(LedgerError::TenantNotFound(tenant_id))?;

        match draft.room_id.clone() {
            None => draft.room_id = tenant.room_id,
            Some(room) => {
                if self.repository.room(&room)?.is_none() {
                    return Err(LedgerError::RoomNotFound(room));
                }
                if let Some(current) = tenant.room_id.filter(|current| *current != room) {
                    return Err(LedgerError::RoomMismatch {
                        tenant: tenant.id,
                        room,
                        current,
                    });
                }
            }
        }

        let payment = draft.build(PaymentId::generate(), today)?;
        let stored = self.repository.insert_payment(payment)?;
        info!(payment = %stored.id, tenant = %stored.tenant_id, amount = stored.amount, "payment recorded");
        Ok(stored)
    }

    pub fn mark_paid(&self, id: &PaymentId, today: NaiveDate) -> Result<Payment, LedgerError> {
        let mut payment = self.load(id)?;
        if payment.is_settled() {
            return Err(LedgerError::AlreadyPaid(id.clone()));
        }
        payment.mark_paid(today);
        self.repository.update_payment(payment.clone())?;
        info!(payment = %id, paid_on = %today, "payment marked paid");
        Ok(payment)
    }

    /// Reverts a payment to pending and clears its paid date.
    pub fn mark_unpaid(&self, id: &PaymentId) -> Result<Payment, LedgerError> {
        let mut payment = self.load(id)?;
        payment.mark_unpaid();
        self.repository.update_payment(payment.clone())?;
        info!(payment = %id, "payment marked unpaid");
        Ok(payment)
    }

    pub fn mark_overdue(&self, id: &PaymentId) -> Result<Payment, LedgerError> {
        let mut payment = self.load(id)?;
        if payment.is_settled() {
            return Err(LedgerError::AlreadyPaid(id.clone()));
        }
        payment.mark_overdue();
        self.repository.update_payment(payment.clone())?;
        info!(payment = %id, "payment marked overdue");
        Ok(payment)
    }

    pub fn amend(&self, id: &PaymentId, update: PaymentUpdate) -> Result<Payment, LedgerError> {
        let mut payment = self.load(id)?;
        update.apply(&mut payment)?;
        self.repository.update_payment(payment.clone())?;
        Ok(payment)
    }

    /// Pending charges whose due date has passed before `today`.
    pub fn lapsed(&self, today: NaiveDate) -> Result<Vec<Payment>, LedgerError> {
        Ok(self
            .repository
            .payments()?
            .into_iter()
            .filter(|payment| payment.status == PaymentStatus::Pending && payment.due_date < today)
            .collect())
    }
}
