//! Roster sync and inventory reconciliation.
//!
//! Both compare an authoritative external snapshot with the store. The diff
//! and the classification are pure; only [`ReconciliationService::execute_sync`]
//! writes.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::{
    error::AppResult,
    models::{
        book::BookStatus,
        reconciliation::{
            InventoryBook, InventoryReport, PreviousValues, RosterEntry, StudentSyncPlan,
            StudentSyncResult, StudentUpdate,
        },
        workbook::{roster_entries, Workbook},
    },
    repository::Repository,
};

/// Compare a roster file with the active students.
///
/// A file id listed twice keeps its last row.
pub fn diff_roster(file: &[RosterEntry], active: &[RosterEntry]) -> StudentSyncPlan {
    let file: IndexMap<&str, &RosterEntry> = file.iter().map(|e| (e.id.as_str(), e)).collect();
    let stored: HashMap<&str, &RosterEntry> =
        active.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut plan = StudentSyncPlan::default();

    for (id, entry) in &file {
        match stored.get(id) {
            None => plan.to_create.push((*entry).clone()),
            Some(current) if current.name != entry.name || current.class != entry.class => {
                plan.to_update.push(StudentUpdate {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    class: entry.class.clone(),
                    old: PreviousValues {
                        name: current.name.clone(),
                        class: current.class.clone(),
                    },
                })
            }
            Some(_) => {}
        }
    }

    plan.to_deactivate = active
        .iter()
        .filter(|s| !file.contains_key(s.id.as_str()))
        .cloned()
        .collect();

    plan
}

/// Classify the catalog against a shelf scan. Scanned duplicates count once.
pub fn classify_inventory(catalog: Vec<InventoryBook>, scanned: &[String]) -> InventoryReport {
    let mut seen = HashSet::new();
    let scanned: Vec<&str> = scanned
        .iter()
        .map(|b| b.trim())
        .filter(|b| !b.is_empty() && seen.insert(*b))
        .collect();
    let scanned_set: HashSet<&str> = scanned.iter().copied().collect();
    let known: HashSet<&str> = catalog.iter().map(|b| b.barcode.as_str()).collect();

    let unknown_barcodes = scanned
        .iter()
        .filter(|b| !known.contains(*b))
        .map(|b| b.to_string())
        .collect();

    let mut report = InventoryReport {
        unknown_barcodes,
        ..Default::default()
    };

    for book in catalog {
        let was_scanned = scanned_set.contains(book.barcode.as_str());
        match (was_scanned, book.status) {
            (true, BookStatus::Available) => report.found_correctly.push(book),
            (true, _) => report.found_unexpectedly.push(book),
            (false, BookStatus::Available) => report.missing_in_reality.push(book),
            // On loan and not on the shelf, as expected
            (false, _) => {}
        }
    }

    report
}

#[derive(Clone)]
pub struct ReconciliationService {
    repository: Repository,
}

impl ReconciliationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Preview what a roster sync would change
    pub async fn analyze_sync(&self, workbook: &Workbook) -> AppResult<StudentSyncPlan> {
        let file = roster_entries(workbook.first_sheet()?)?;
        let active = self.repository.students.active_roster().await?;
        let plan = diff_roster(&file, &active);

        tracing::info!(
            to_create = plan.to_create.len(),
            to_update = plan.to_update.len(),
            to_deactivate = plan.to_deactivate.len(),
            "Analyzed student roster"
        );
        Ok(plan)
    }

    /// Apply a (possibly edited) roster diff atomically
    pub async fn execute_sync(&self, plan: &StudentSyncPlan) -> AppResult<StudentSyncResult> {
        if plan.is_empty() {
            return Ok(StudentSyncResult::default());
        }
        let result = self.repository.students.execute_sync(plan).await?;
        tracing::info!(
            created = result.created,
            updated = result.updated,
            deactivated = result.deactivated,
            "Student roster synchronized"
        );
        Ok(result)
    }

    pub async fn inventory_check(&self, scanned: &[String]) -> AppResult<InventoryReport> {
        let catalog = self.repository.books.inventory_snapshot().await?;
        let report = classify_inventory(catalog, scanned);
        tracing::info!(
            scanned = scanned.len(),
            found = report.found_correctly.len(),
            missing = report.missing_in_reality.len(),
            unexpected = report.found_unexpectedly.len(),
            unknown = report.unknown_barcodes.len(),
            "Inventory check"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, name: &str, class: &str) -> RosterEntry {
        RosterEntry {
            id: id.into(),
            name: name.into(),
            class: class.into(),
        }
    }

    fn book(barcode: &str, status: BookStatus) -> InventoryBook {
        InventoryBook {
            barcode: barcode.into(),
            title: format!("Titel {}", barcode),
            author: None,
            status,
        }
    }

    fn barcodes(books: &[InventoryBook]) -> Vec<&str> {
        books.iter().map(|b| b.barcode.as_str()).collect()
    }

    #[test]
    fn test_diff_roster_sets() {
        let active = vec![
            student("1", "Anna", "5a"),
            student("2", "Ben", "5b"),
            student("3", "Cem", "6a"),
        ];
        let file = vec![
            student("1", "Anna", "5a"),
            student("2", "Ben", "6b"),
            student("4", "Dana", "5a"),
        ];

        let plan = diff_roster(&file, &active);
        assert_eq!(plan.to_create, vec![student("4", "Dana", "5a")]);
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].id, "2");
        assert_eq!(plan.to_update[0].class, "6b");
        assert_eq!(
            plan.to_update[0].old,
            PreviousValues {
                name: "Ben".into(),
                class: "5b".into()
            }
        );
        assert_eq!(plan.to_deactivate, vec![student("3", "Cem", "6a")]);
    }

    #[test]
    fn test_diff_of_identical_roster_is_empty() {
        let roster = vec![student("1", "Anna", "5a"), student("2", "Ben", "5b")];
        assert!(diff_roster(&roster, &roster).is_empty());
    }

    #[test]
    fn test_applying_the_diff_converges() {
        let active = vec![student("1", "Anna", "5a"), student("3", "Cem", "6a")];
        let file = vec![
            student("1", "Anna Berg", "5a"),
            student("2", "Ben", "5b"),
            student("2", "Ben", "5c"),
        ];
        let plan = diff_roster(&file, &active);
        assert_eq!(plan.to_create, vec![student("2", "Ben", "5c")]);

        // Apply the plan to an in-memory copy of the active set
        let mut applied: IndexMap<String, RosterEntry> =
            active.iter().map(|s| (s.id.clone(), s.clone())).collect();
        for s in &plan.to_create {
            applied.insert(s.id.clone(), s.clone());
        }
        for u in &plan.to_update {
            applied.insert(u.id.clone(), student(&u.id, &u.name, &u.class));
        }
        for s in &plan.to_deactivate {
            applied.shift_remove(&s.id);
        }

        let ids: HashSet<&str> = applied.keys().map(String::as_str).collect();
        assert_eq!(ids, HashSet::from(["1", "2"]));

        let after: Vec<RosterEntry> = applied.into_values().collect();
        assert!(diff_roster(&file, &after).is_empty());
    }

    #[test]
    fn test_classify_inventory() {
        let catalog = vec![
            book("buch-1", BookStatus::Available),
            book("buch-2", BookStatus::Available),
            book("buch-3", BookStatus::Lent),
            book("buch-4", BookStatus::Lent),
        ];
        let scanned: Vec<String> = ["buch-1", "buch-3", "buch-1", " buch-9 ", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = classify_inventory(catalog, &scanned);
        assert_eq!(barcodes(&report.found_correctly), vec!["buch-1"]);
        assert_eq!(barcodes(&report.missing_in_reality), vec!["buch-2"]);
        assert_eq!(barcodes(&report.found_unexpectedly), vec!["buch-3"]);
        assert_eq!(report.unknown_barcodes, vec!["buch-9".to_string()]);
    }

    #[test]
    fn test_inventory_sets_are_disjoint_and_cover_the_scan() {
        let catalog: Vec<InventoryBook> = (1..=20)
            .map(|i| {
                let status = if i % 3 == 0 {
                    BookStatus::Lent
                } else {
                    BookStatus::Available
                };
                book(&format!("buch-{}", i), status)
            })
            .collect();
        let scanned: Vec<String> = (10..=30).map(|i| format!("buch-{}", i)).collect();

        let report = classify_inventory(catalog, &scanned);

        let mut all: Vec<&str> = Vec::new();
        all.extend(barcodes(&report.found_correctly));
        all.extend(barcodes(&report.missing_in_reality));
        all.extend(barcodes(&report.found_unexpectedly));
        all.extend(report.unknown_barcodes.iter().map(String::as_str));
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());

        let mut scanned_side: HashSet<&str> = HashSet::new();
        scanned_side.extend(barcodes(&report.found_correctly));
        scanned_side.extend(barcodes(&report.found_unexpectedly));
        scanned_side.extend(report.unknown_barcodes.iter().map(String::as_str));
        let expected: HashSet<&str> = scanned.iter().map(String::as_str).collect();
        assert_eq!(scanned_side, expected);
    }
}
