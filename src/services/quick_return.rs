//! Single-scan return at the desk, with undo

use crate::{
    error::AppResult,
    models::{
        lending::{Lending, QuickReturnReceipt},
        user::Identity,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct QuickReturnService {
    repository: Repository,
}

impl QuickReturnService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Return whatever lending holds the scanned copy. The receipt carries
    /// the lending id the client needs to offer an undo.
    pub async fn quick_return(
        &self,
        identity: &Identity,
        barcode: &str,
    ) -> AppResult<QuickReturnReceipt> {
        let receipt = self
            .repository
            .lendings
            .quick_return(barcode.trim(), identity.user_id, &identity.full_name)
            .await?;

        tracing::info!(
            lending_id = receipt.lending_id,
            barcode = %receipt.book_barcode,
            student_id = %receipt.student_id,
            returned_by = identity.user_id,
            "Quick return"
        );
        Ok(receipt)
    }

    /// Put a quick-returned lending back on loan
    pub async fn undo(&self, identity: &Identity, lending_id: i32) -> AppResult<Lending> {
        let lending = self.repository.lendings.undo_return(lending_id).await?;
        tracing::info!(
            lending_id = lending.id,
            barcode = %lending.book_barcode,
            undone_by = identity.user_id,
            "Quick return undone"
        );
        Ok(lending)
    }
}
