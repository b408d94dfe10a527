//! Roster sync and inventory check payloads

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookStatus;

/// One student as listed in the authoritative roster file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub class: String,
}

/// Values stored before a roster update, kept for confirmation screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PreviousValues {
    pub name: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StudentUpdate {
    pub id: String,
    pub name: String,
    pub class: String,
    pub old: PreviousValues,
}

/// Diff between a roster file and the active students in the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StudentSyncPlan {
    pub to_create: Vec<RosterEntry>,
    pub to_update: Vec<StudentUpdate>,
    pub to_deactivate: Vec<RosterEntry>,
}

impl StudentSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_deactivate.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StudentSyncResult {
    pub created: usize,
    pub updated: usize,
    pub deactivated: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct RosterImportResult {
    pub rows: usize,
    pub inserted: u64,
}

/// Catalog view of a book for the inventory check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryBook {
    pub barcode: String,
    pub title: String,
    pub author: Option<String>,
    pub status: BookStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InventoryScan {
    pub barcodes: Vec<String>,
}

/// Physical scan classified against the catalog. The four sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct InventoryReport {
    /// Scanned and available in the catalog
    pub found_correctly: Vec<InventoryBook>,
    /// Available in the catalog but not scanned
    pub missing_in_reality: Vec<InventoryBook>,
    /// Scanned although the catalog has it on loan
    pub found_unexpectedly: Vec<InventoryBook>,
    /// Scanned codes unknown to the catalog
    pub unknown_barcodes: Vec<String>,
}
