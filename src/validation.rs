use crate::{
    error::{EstudiantesResult, GradeTooHighSnafu, GradeTooLowSnafu, MissingGradeSnafu},
    store::ObjectId,
};
use snafu::{OptionExt, ensure};

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 20.0;

pub fn validate_identifier(raw: &str) -> EstudiantesResult<ObjectId> {
    raw.parse().inspect_err(|e| debug!(?e, raw, "Rejected identifier"))
}

/// Both bounds are inclusive. `NaN` counts as no grade at all.
pub fn validate_grade(nota: Option<f64>) -> EstudiantesResult<()> {
    let nota = nota.filter(|nota| !nota.is_nan()).context(MissingGradeSnafu)?;

    ensure!(nota >= MIN_GRADE, GradeTooLowSnafu { nota });
    ensure!(nota <= MAX_GRADE, GradeTooHighSnafu { nota });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EstudiantesError;
    use proptest::prelude::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(validate_grade(Some(0.0)).is_ok());
        assert!(validate_grade(Some(20.0)).is_ok());
        assert!(validate_grade(Some(15.5)).is_ok());
    }

    #[test]
    fn reports_which_bound_was_broken() {
        assert!(matches!(
            validate_grade(None),
            Err(EstudiantesError::MissingGrade)
        ));
        assert!(matches!(
            validate_grade(Some(f64::NAN)),
            Err(EstudiantesError::MissingGrade)
        ));
        assert!(matches!(
            validate_grade(Some(-0.5)),
            Err(EstudiantesError::GradeTooLow { .. })
        ));
        assert!(matches!(
            validate_grade(Some(20.01)),
            Err(EstudiantesError::GradeTooHigh { .. })
        ));
    }

    #[test]
    fn identifier_rejects_non_hex() {
        assert!(matches!(
            validate_identifier("not-an-id"),
            Err(EstudiantesError::InvalidIdentifier { .. })
        ));
    }

    proptest! {
        #[test]
        fn grade_is_valid_iff_within_bounds(nota in -1_000.0f64..1_000.0) {
            prop_assert_eq!(
                validate_grade(Some(nota)).is_ok(),
                (MIN_GRADE..=MAX_GRADE).contains(&nota)
            );
        }

        #[test]
        fn every_24_hex_string_is_an_identifier(raw in "[0-9a-fA-F]{24}") {
            let id = validate_identifier(&raw).unwrap();
            prop_assert_eq!(id.to_string(), raw.to_ascii_lowercase());
        }

        #[test]
        fn other_strings_are_rejected(raw in "\\PC*") {
            prop_assume!(raw.len() != 24 || !raw.bytes().all(|b| b.is_ascii_hexdigit()));
            let rejected = matches!(
                validate_identifier(&raw),
                Err(EstudiantesError::InvalidIdentifier { .. })
            );
            prop_assert!(rejected);
        }
    }
}
