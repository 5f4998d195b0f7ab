use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use stockconf_core::{DomainError, DomainResult, Entity};

use crate::validation::{digits_only, into_field_errors, letters_only};

stockconf_core::record_id!(
    /// Staff record identifier, unique within a role.
    StaffId,
    "staff"
);

/// Staff role: salesperson or driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Vendedor,
    Chofer,
}

impl StaffRole {
    pub const ALL: [StaffRole; 2] = [StaffRole::Vendedor, StaffRole::Chofer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vendedor => "vendedor",
            Self::Chofer => "chofer",
        }
    }
}

impl core::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vendedor" => Ok(Self::Vendedor),
            "chofer" => Ok(Self::Chofer),
            other => Err(DomainError::validation(
                "role",
                format!("unknown staff role {other:?}"),
            )),
        }
    }
}

/// A salesperson or driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub role: StaffRole,
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub email: String,
    pub direccion: String,
    pub telefono: String,
    pub fecha_alta: NaiveDate,
    pub fecha_baja: Option<NaiveDate>,
    pub activo: bool,
}

impl Entity for StaffMember {
    type Id = StaffId;
    const ENTITY: &'static str = StaffId::ENTITY;

    fn id(&self) -> StaffId {
        self.id
    }
}

impl StaffMember {
    /// New members start active with no end date.
    pub fn from_new(id: StaffId, new: NewStaff) -> Self {
        let NewStaff { role, fields } = new;
        Self {
            id,
            role,
            nombre: fields.nombre,
            apellido: fields.apellido,
            dni: fields.dni,
            email: fields.email,
            direccion: fields.direccion,
            telefono: fields.telefono,
            fecha_alta: fields.fecha_alta,
            fecha_baja: None,
            activo: true,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }

    /// Overwrite the form fields. Activation state is untouched.
    pub fn apply_fields(&mut self, fields: StaffFields) -> DomainResult<()> {
        if let Some(baja) = self.fecha_baja {
            if fields.fecha_alta > baja {
                return Err(DomainError::validation(
                    "fecha_alta",
                    format!("cannot be later than fecha_baja {baja}"),
                ));
            }
        }
        self.nombre = fields.nombre;
        self.apellido = fields.apellido;
        self.dni = fields.dni;
        self.email = fields.email;
        self.direccion = fields.direccion;
        self.telefono = fields.telefono;
        self.fecha_alta = fields.fecha_alta;
        Ok(())
    }

    /// Record the end date and mark inactive.
    pub fn deactivate(&mut self, fecha_baja: NaiveDate) -> DomainResult<()> {
        if fecha_baja < self.fecha_alta {
            return Err(DomainError::validation(
                "fecha_baja",
                format!("cannot be earlier than fecha_alta {}", self.fecha_alta),
            ));
        }
        self.fecha_baja = Some(fecha_baja);
        self.activo = false;
        Ok(())
    }

    /// Clear the end date and mark active, optionally with a new start date.
    pub fn reactivate(&mut self, fecha_alta: Option<NaiveDate>) {
        if let Some(alta) = fecha_alta {
            self.fecha_alta = alta;
        }
        self.fecha_baja = None;
        self.activo = true;
    }
}

/// Raw staff form data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StaffInput {
    #[validate(
        length(max = 50, message = "must be at most 50 characters"),
        custom(function = "letters_only")
    )]
    pub nombre: String,
    #[validate(
        length(max = 50, message = "must be at most 50 characters"),
        custom(function = "letters_only")
    )]
    pub apellido: String,
    #[validate(
        length(max = 15, message = "must be at most 15 characters"),
        custom(function = "digits_only")
    )]
    pub dni: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub direccion: String,
    #[validate(
        length(max = 20, message = "must be at most 20 characters"),
        custom(function = "digits_only")
    )]
    pub telefono: String,
    /// Defaults to the current date.
    #[serde(default)]
    pub fecha_alta: Option<NaiveDate>,
}

impl StaffInput {
    /// Trim every text field, validate, and fill in the start date.
    pub fn clean(self, today: NaiveDate) -> DomainResult<StaffFields> {
        let input = Self {
            nombre: self.nombre.trim().to_string(),
            apellido: self.apellido.trim().to_string(),
            dni: self.dni.trim().to_string(),
            email: self.email.trim().to_string(),
            direccion: self.direccion.trim().to_string(),
            telefono: self.telefono.trim().to_string(),
            fecha_alta: self.fecha_alta,
        };
        input
            .validate()
            .map_err(|e| DomainError::Validation(into_field_errors(e)))?;

        Ok(StaffFields {
            nombre: input.nombre,
            apellido: input.apellido,
            dni: input.dni,
            email: input.email,
            direccion: input.direccion,
            telefono: input.telefono,
            fecha_alta: input.fecha_alta.unwrap_or(today),
        })
    }
}

/// Validated staff form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffFields {
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub email: String,
    pub direccion: String,
    pub telefono: String,
    pub fecha_alta: NaiveDate,
}

/// Staff member about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStaff {
    pub role: StaffRole,
    pub fields: StaffFields,
}

/// One role's roster split by activation state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaffRoster {
    pub activos: Vec<StaffMember>,
    pub inactivos: Vec<StaffMember>,
}

impl StaffRoster {
    /// Each side is ordered by apellido, then nombre.
    pub fn from_members(members: impl IntoIterator<Item = StaffMember>) -> Self {
        let (mut activos, mut inactivos): (Vec<_>, Vec<_>) =
            members.into_iter().partition(|m| m.activo);
        let by_name = |a: &StaffMember, b: &StaffMember| {
            (&a.apellido, &a.nombre, a.id).cmp(&(&b.apellido, &b.nombre, b.id))
        };
        activos.sort_by(by_name);
        inactivos.sort_by(by_name);
        Self { activos, inactivos }
    }

    pub fn len(&self) -> usize {
        self.activos.len() + self.inactivos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
