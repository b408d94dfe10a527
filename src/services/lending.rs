//! Lending lifecycle: borrow, return, extension and reports

use chrono::{Duration, Local, NaiveDate};
use validator::Validate;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        lending::{
            ActiveLending, CreateLending, ExtendLendings, ExtendResult, Lending, LendingFilter,
            LendingImportResult, OverdueLending, ReturnLending,
        },
        student::BorrowedBook,
        user::Identity,
        workbook::{lending_rows, Workbook, LENDING_SHEET},
    },
    repository::{lendings::RowStream, Repository},
};

/// The library's calendar day. Every due-date comparison uses this clock.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Due date of a new lending: the requested one, or today plus the default
/// loan duration. A date in the past is refused.
pub fn resolve_due_date(
    requested: Option<NaiveDate>,
    today: NaiveDate,
    default_loan_days: i64,
) -> AppResult<NaiveDate> {
    match requested {
        Some(date) if date < today => Err(AppError::Validation(format!(
            "Due date {} is in the past",
            date
        ))),
        Some(date) => Ok(date),
        None => Ok(today + Duration::days(default_loan_days)),
    }
}

/// Extension length in days, bounded by the configured maximum
pub fn extension_days(days: i64, max_extension_days: i64) -> AppResult<i32> {
    if !(1..=max_extension_days).contains(&days) {
        return Err(AppError::Validation(format!(
            "Extension must be between 1 and {} days",
            max_extension_days
        )));
    }
    i32::try_from(days).map_err(|_| AppError::Validation("Extension is too long".to_string()))
}

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    config: LendingConfig,
}

impl LendingService {
    pub fn new(repository: Repository, config: LendingConfig) -> Self {
        Self { repository, config }
    }

    /// Lend a copy to a student
    pub async fn borrow(&self, request: &CreateLending) -> AppResult<Lending> {
        request.validate()?;
        let due_date =
            resolve_due_date(request.due_date, today(), self.config.default_loan_days)?;

        let lending = self
            .repository
            .lendings
            .borrow(
                request.student_id.trim(),
                request.book_barcode.trim(),
                due_date,
                request.notes.as_deref(),
            )
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    student_id = %request.student_id,
                    barcode = %request.book_barcode,
                    "Borrow rejected: {}", e
                )
            })?;

        tracing::info!(
            lending_id = lending.id,
            student_id = %lending.student_id,
            barcode = %lending.book_barcode,
            due_date = %lending.due_date,
            "Book lent"
        );
        Ok(lending)
    }

    pub async fn return_lending(
        &self,
        identity: &Identity,
        lending_id: i32,
        request: &ReturnLending,
    ) -> AppResult<Lending> {
        request.validate()?;
        let lending = self
            .repository
            .lendings
            .return_lending(lending_id, identity.user_id, request.notes.as_deref())
            .await?;

        tracing::info!(
            lending_id = lending.id,
            barcode = %lending.book_barcode,
            returned_by = identity.user_id,
            "Book returned"
        );
        Ok(lending)
    }

    /// Reset the due date of the given active lendings to today + days
    pub async fn extend(&self, request: &ExtendLendings) -> AppResult<ExtendResult> {
        let days = extension_days(request.days, self.config.max_extension_days)?;
        let new_due_date = today() + Duration::days(i64::from(days));
        if request.lending_ids.is_empty() {
            return Ok(ExtendResult {
                extended: 0,
                new_due_date,
            });
        }

        let result = self
            .repository
            .lendings
            .extend(&request.lending_ids, new_due_date)
            .await?;
        tracing::info!(
            requested = request.lending_ids.len(),
            extended = result.extended,
            new_due_date = %result.new_due_date,
            "Lendings extended"
        );
        Ok(result)
    }

    /// Active lendings as a lazily fetched stream
    pub fn active<'a>(&'a self, filter: &LendingFilter) -> RowStream<'a, ActiveLending> {
        self.repository.lendings.active(filter, today())
    }

    pub async fn overdue(&self) -> AppResult<Vec<OverdueLending>> {
        self.repository.lendings.overdue(today()).await
    }

    pub async fn student_lendings(&self, student_id: &str) -> AppResult<Vec<BorrowedBook>> {
        self.repository.students.get(student_id).await?;
        self.repository
            .lendings
            .student_lendings(student_id, today())
            .await
    }

    /// Import existing lendings from the `Ausleihen` sheet
    pub async fn import(&self, workbook: &Workbook) -> AppResult<LendingImportResult> {
        let rows = lending_rows(workbook.sheet(LENDING_SHEET)?)?;
        let result = self.repository.lendings.import(&rows).await?;
        tracing::info!(
            created = result.created,
            books_marked_lent = result.books_marked_lent,
            "Lendings imported"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_due_date() {
        let today = date(2025, 3, 1);
        assert_eq!(resolve_due_date(None, today, 14).unwrap(), date(2025, 3, 15));
        assert_eq!(
            resolve_due_date(Some(today), today, 14).unwrap(),
            today,
            "due today is allowed"
        );
    }

    #[test]
    fn test_past_due_date_rejected() {
        let today = date(2025, 3, 1);
        assert!(matches!(
            resolve_due_date(Some(date(2025, 2, 28)), today, 14),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_extension_bounds() {
        assert_eq!(extension_days(7, 120).unwrap(), 7);
        assert_eq!(extension_days(120, 120).unwrap(), 120);
        assert!(extension_days(0, 120).is_err());
        assert!(extension_days(-3, 120).is_err());
        assert!(extension_days(121, 120).is_err());
    }
}
