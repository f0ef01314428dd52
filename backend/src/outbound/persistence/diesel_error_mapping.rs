//! Classification of Diesel failures shared by the repositories.
//!
//! Each repository turns a [`DieselFailure`] into its own port error so
//! constraint violations can carry domain context (the zone number, the
//! region key) that only the caller knows.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Constraint guarding unique zone numbers.
pub(super) const ZONE_NUMBER_CONSTRAINT: &str = "delivery_zones_zone_number_key";
/// Constraint guarding unique region keys.
pub(super) const REGION_KEY_CONSTRAINT: &str = "zone_regions_region_key_key";

/// Coarse outcome of a failed Diesel operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum DieselFailure {
    /// The connection dropped mid-operation.
    Connection,
    UniqueViolation { constraint: Option<String> },
    ForeignKeyViolation { constraint: Option<String> },
    Query { message: &'static str },
}

impl DieselFailure {
    /// Whether a unique violation was raised by `constraint`.
    ///
    /// Drivers that omit the constraint name are treated as a match since
    /// each table carries a single unique constraint besides its key.
    pub(super) fn violates_unique(&self, constraint: &str) -> bool {
        match self {
            Self::UniqueViolation { constraint: None } => true,
            Self::UniqueViolation {
                constraint: Some(name),
            } => name == constraint,
            _ => false,
        }
    }
}

/// Classify a Diesel error, logging its details at debug level.
pub(super) fn classify_diesel_error(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query {
            message: "record not found",
        },
        DieselError::QueryBuilderError(_) => DieselFailure::Query {
            message: "database query error",
        },
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation => DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            },
            DatabaseErrorKind::ForeignKeyViolation => DieselFailure::ForeignKeyViolation {
                constraint: info.constraint_name().map(str::to_owned),
            },
            DatabaseErrorKind::ClosedConnection => DieselFailure::Connection,
            _ => DieselFailure::Query {
                message: "database error",
            },
        },
        _ => DieselFailure::Query {
            message: "database error",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DieselError::NotFound, "record not found")]
    #[case(DieselError::RollbackTransaction, "database error")]
    fn non_database_errors_become_query_failures(
        #[case] error: DieselError,
        #[case] message: &'static str,
    ) {
        assert_eq!(classify_diesel_error(error), DieselFailure::Query { message });
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(ZONE_NUMBER_CONSTRAINT), true)]
    #[case(Some("zone_regions_pkey"), false)]
    fn unique_violation_matches_named_constraint(
        #[case] constraint: Option<&str>,
        #[case] expected: bool,
    ) {
        let failure = DieselFailure::UniqueViolation {
            constraint: constraint.map(str::to_owned),
        };

        assert_eq!(failure.violates_unique(ZONE_NUMBER_CONSTRAINT), expected);
    }

    #[rstest]
    fn foreign_key_failure_is_not_a_unique_violation() {
        let failure = DieselFailure::ForeignKeyViolation { constraint: None };

        assert!(!failure.violates_unique(REGION_KEY_CONSTRAINT));
    }
}
