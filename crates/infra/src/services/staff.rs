use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};

use stockconf_core::{DomainError, ValidationErrors};
use stockconf_staff::{NewStaff, StaffFields, StaffId, StaffInput, StaffMember, StaffRole, StaffRoster};

use super::error::{ServiceError, ServiceResult};
use crate::store::{Store, Transaction};

/// Salespeople and drivers. Every operation is scoped to one role.
#[derive(Clone)]
pub struct StaffService {
    store: Arc<dyn Store>,
}

impl StaffService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), err)]
    pub async fn create_staff(&self, role: StaffRole, input: StaffInput) -> ServiceResult<StaffMember> {
        let fields = input.clean(today())?;

        let mut tx = self.store.begin().await?;
        check_unique(&mut *tx, role, &fields, None).await?;
        let member = tx.insert_staff(NewStaff { role, fields }).await?;
        tx.commit().await?;

        info!(%role, staff = %member.id, "staff member created");
        Ok(member)
    }

    /// Overwrite the form fields. A missing `fecha_alta` keeps the stored one.
    #[instrument(skip(self, input), err)]
    pub async fn update_staff(
        &self,
        role: StaffRole,
        id: StaffId,
        input: StaffInput,
    ) -> ServiceResult<StaffMember> {
        let mut tx = self.store.begin().await?;
        let mut member = load_staff(&mut *tx, role, id).await?;

        let fields = input.clean(member.fecha_alta)?;
        check_unique(&mut *tx, role, &fields, Some(id)).await?;
        member.apply_fields(fields)?;
        tx.save_staff(&member).await?;
        tx.commit().await?;

        info!(%role, staff = %id, "staff member updated");
        Ok(member)
    }

    #[instrument(skip(self), err)]
    pub async fn get_staff(&self, role: StaffRole, id: StaffId) -> ServiceResult<StaffMember> {
        let mut tx = self.store.begin().await?;
        load_staff(&mut *tx, role, id).await
    }

    #[instrument(skip(self), err)]
    pub async fn list_staff(&self, role: StaffRole) -> ServiceResult<StaffRoster> {
        let mut tx = self.store.begin().await?;
        Ok(StaffRoster::from_members(tx.list_staff(role).await?))
    }

    /// Mark inactive as of `fecha_baja`, today when not given.
    #[instrument(skip(self), err)]
    pub async fn deactivate_staff(
        &self,
        role: StaffRole,
        id: StaffId,
        fecha_baja: Option<NaiveDate>,
    ) -> ServiceResult<StaffMember> {
        let mut tx = self.store.begin().await?;
        let mut member = load_staff(&mut *tx, role, id).await?;
        member.deactivate(fecha_baja.unwrap_or_else(today))?;
        tx.save_staff(&member).await?;
        tx.commit().await?;

        info!(%role, staff = %id, fecha_baja = ?member.fecha_baja, "staff member deactivated");
        Ok(member)
    }

    /// Clear `fecha_baja` and mark active, optionally with a new `fecha_alta`.
    #[instrument(skip(self), err)]
    pub async fn reactivate_staff(
        &self,
        role: StaffRole,
        id: StaffId,
        fecha_alta: Option<NaiveDate>,
    ) -> ServiceResult<StaffMember> {
        let mut tx = self.store.begin().await?;
        let mut member = load_staff(&mut *tx, role, id).await?;
        member.reactivate(fecha_alta);
        tx.save_staff(&member).await?;
        tx.commit().await?;

        info!(%role, staff = %id, fecha_alta = %member.fecha_alta, "staff member reactivated");
        Ok(member)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_staff(&self, role: StaffRole, id: StaffId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_staff(role, id).await? {
            return Err(DomainError::not_found(StaffId::ENTITY, id).into());
        }
        tx.commit().await?;

        info!(%role, staff = %id, "staff member deleted");
        Ok(())
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn load_staff(
    tx: &mut dyn Transaction,
    role: StaffRole,
    id: StaffId,
) -> ServiceResult<StaffMember> {
    tx.get_staff(role, id)
        .await?
        .ok_or_else(|| DomainError::not_found(StaffId::ENTITY, id).into())
}

/// `dni` and `email` are unique within a role.
async fn check_unique(
    tx: &mut dyn Transaction,
    role: StaffRole,
    fields: &StaffFields,
    except: Option<StaffId>,
) -> ServiceResult<()> {
    let mut errors = ValidationErrors::new();
    if let Some(other) = tx.find_staff_by_dni(role, &fields.dni).await? {
        if Some(other.id) != except {
            errors.add("dni", format!("already registered for {}", other.full_name()));
        }
    }
    if let Some(other) = tx.find_staff_by_email(role, &fields.email).await? {
        if Some(other.id) != except {
            errors.add("email", format!("already registered for {}", other.full_name()));
        }
    }
    errors.into_result().map_err(ServiceError::from)
}
