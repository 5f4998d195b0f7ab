use thiserror::Error;

use stockconf_core::{DomainError, ValidationErrors};

use crate::store::{StoreError, constraints};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of an application service operation. Nothing was persisted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Input rejected with field-level detail.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Reserved for concurrent-edit detection.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(errors) => ServiceError::Validation(errors),
            DomainError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

/// Unique violations that got past the service pre-checks become field errors.
/// A save that matched no row is reported as not found.
impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        let constraint = match &value {
            StoreError::UniqueViolation { constraint } => constraint,
            StoreError::MissingRow { entity, id } => {
                return ServiceError::NotFound {
                    entity: *entity,
                    id: *id,
                };
            }
            _ => return ServiceError::Store(value),
        };
        let field = match constraint.as_str() {
            constraints::CATEGORY_NAME | constraints::CATEGORY_SLUG => "name",
            constraints::PRODUCT_CODE => "code",
            constraints::PRODUCT_NAME => "name",
            constraints::STAFF_DNI => "dni",
            constraints::STAFF_EMAIL => "email",
            _ => return ServiceError::Store(value),
        };
        let mut errors = ValidationErrors::new();
        errors.add(field, "already in use");
        ServiceError::Validation(errors)
    }
}
