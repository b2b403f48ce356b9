//! Write-path row-count discipline.
//!
//! Every organization-scoped update or delete returns the rows it touched.
//! These helpers turn that row list into a result:
//!
//! | rows | [`expect_scoped_write`] | [`maybe_single`] | [`expect_created`] |
//! |------|-------------------------|------------------|--------------------|
//! | 0    | `NotFoundOrForbidden`   | `Ok(None)`       | `IntegrityFault`   |
//! | 1    | `Ok(row)`               | `Ok(Some(row))`  | `Ok(row)`          |
//! | n>1  | `IntegrityFault`        | `IntegrityFault` | `IntegrityFault`   |
//!
//! A multi-row match is never resolved by picking one of the rows.

use tracing::error;

use crate::error::{AppError, AppResult};

/// Tolerant single-row fetch: zero rows is `None`, not a fault.
pub fn maybe_single<T>(rows: Vec<T>, entity: &str) -> AppResult<Option<T>> {
    let matched = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), matched) {
        (None, _) => Ok(None),
        (Some(row), 1) => Ok(Some(row)),
        (Some(_), _) => {
            error!(entity, matched, "single-row filter matched multiple rows");
            Err(AppError::IntegrityFault {
                entity: entity.to_string(),
                matched,
            })
        }
    }
}

/// Result of an update/delete filtered by id and organization.
///
/// Zero rows means the record is absent *or* owned by another
/// organization; the two are reported identically.
pub fn expect_scoped_write<T>(rows: Vec<T>, entity: &str) -> AppResult<T> {
    maybe_single(rows, entity)?.ok_or_else(|| AppError::not_found_or_forbidden(entity))
}

/// Result of an insert with a freshly generated identifier.
pub fn expect_created<T>(rows: Vec<T>, entity: &str) -> AppResult<T> {
    match maybe_single(rows, entity)? {
        Some(row) => Ok(row),
        None => {
            error!(entity, "insert returned no row");
            Err(AppError::IntegrityFault {
                entity: entity.to_string(),
                matched: 0,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rows_on_scoped_write_is_not_found_or_forbidden() {
        let err = expect_scoped_write(Vec::<u32>::new(), "customer").unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFoundOrForbidden { ref entity } if entity == "customer"
        ));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn one_row_on_scoped_write_is_returned() {
        assert_eq!(expect_scoped_write(vec![7], "customer").unwrap(), 7);
    }

    #[test]
    fn many_rows_on_scoped_write_is_integrity_fault() {
        let err = expect_scoped_write(vec![1, 2, 3], "customer").unwrap_err();
        assert!(matches!(err, AppError::IntegrityFault { matched: 3, .. }));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn maybe_single_tolerates_zero_rows() {
        assert_eq!(maybe_single(Vec::<u32>::new(), "role").unwrap(), None);
        assert_eq!(maybe_single(vec![4], "role").unwrap(), Some(4));
        assert!(maybe_single(vec![4, 5], "role").is_err());
    }

    #[test]
    fn empty_insert_result_is_a_server_fault() {
        let err = expect_created(Vec::<u32>::new(), "role").unwrap_err();
        assert!(matches!(err, AppError::IntegrityFault { matched: 0, .. }));
        assert!(!err.is_client_error());
    }
}
