//! Boundary checks for staff form fields.

use std::borrow::Cow;

use validator::{ValidationError, ValidationErrors as FormErrors};

use stockconf_core::ValidationErrors;

/// Non-empty and made of letters only (no spaces, digits or punctuation).
pub fn letters_only(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(char::is_alphabetic) {
        Ok(())
    } else {
        Err(ValidationError::new("letters_only").with_message(Cow::Borrowed("must contain letters only")))
    }
}

/// Non-empty and made of ASCII digits only.
pub fn digits_only(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("digits_only").with_message(Cow::Borrowed("must contain digits only")))
    }
}

/// Flatten `validator` output into field errors, ordered by field name.
pub(crate) fn into_field_errors(errors: FormErrors) -> ValidationErrors {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = ValidationErrors::new();
    for (field, list) in fields {
        for error in list {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string());
            out.add(field.to_string(), message);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_accept_accented_names() {
        assert!(letters_only("Juan").is_ok());
        assert!(letters_only("Muñoz").is_ok());
        assert!(letters_only("José").is_ok());
    }

    #[test]
    fn letters_reject_digits_spaces_and_blank() {
        assert!(letters_only("Juan3").is_err());
        assert!(letters_only("Juan Pablo").is_err());
        assert!(letters_only("").is_err());
    }

    #[test]
    fn digits_reject_separators() {
        assert!(digits_only("12345678").is_ok());
        assert!(digits_only("555-1234").is_err());
        assert!(digits_only("12.345.678").is_err());
        assert!(digits_only("").is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_ascii_digit_string_passes(s in "[0-9]{1,15}") {
                prop_assert!(digits_only(&s).is_ok());
            }

            #[test]
            fn a_single_non_digit_fails(prefix in "[0-9]{0,6}", bad in "[^0-9]", suffix in "[0-9]{0,6}") {
                let value = format!("{prefix}{bad}{suffix}");
                prop_assert!(digits_only(&value).is_err());
            }

            #[test]
            fn a_digit_breaks_letters_only(name in "[a-zA-Z]{1,10}", d in 0u8..10) {
                let value = format!("{name}{d}");
                prop_assert!(letters_only(&value).is_err());
            }
        }
    }
}
