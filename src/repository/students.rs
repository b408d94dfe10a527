//! Students repository for database operations

use indexmap::IndexMap;
use sqlx::{Pool, Postgres};

use super::{
    abort,
    table::{Filter, Record, Table},
};
use crate::{
    error::{AppError, AppResult},
    models::{
        reconciliation::{RosterEntry, StudentSyncPlan, StudentSyncResult},
        student::{CreateStudent, Student, StudentQuery, UpdateStudent},
        Page, PageQuery,
    },
};

impl Record for Student {
    const LABEL: &'static str = "Student";
    const TABLE: &'static str = "students";
    const KEY: &'static str = "id";
    const SEARCH_COLUMNS: &'static [&'static str] = &["t.name", "t.id"];
    const ORDER_BY: &'static str = "t.class ASC, t.name ASC";
}

/// Split roster entries into parallel column arrays for an UNNEST insert.
/// A repeated id keeps its last entry; one statement may not touch a row twice.
fn columns(entries: &[RosterEntry]) -> (Vec<String>, Vec<String>, Vec<String>) {
    let unique: IndexMap<&str, &RosterEntry> =
        entries.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut ids = Vec::with_capacity(unique.len());
    let mut names = Vec::with_capacity(unique.len());
    let mut classes = Vec::with_capacity(unique.len());
    for entry in unique.values() {
        ids.push(entry.id.clone());
        names.push(entry.name.clone());
        classes.push(entry.class.clone());
    }
    (ids, names, classes)
}

#[derive(Clone)]
pub struct StudentsRepository {
    pool: Pool<Postgres>,
    table: Table<Student>,
}

impl StudentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            table: Table::new(pool.clone()),
            pool,
        }
    }

    /// Get student by roster id
    pub async fn get(&self, id: &str) -> AppResult<Student> {
        self.table.get(id).await
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<Student>> {
        self.table.find(id).await
    }

    /// Search students by name or id, optionally within a class or status
    pub async fn search(&self, query: &StudentQuery) -> AppResult<Page<Student>> {
        let page = PageQuery {
            q: query.q.clone(),
            page: query.page,
            per_page: query.per_page,
        };
        let mut filters = Vec::new();
        if let Some(class) = &query.class {
            filters.push(Filter::Text("t.class", class.clone()));
        }
        if let Some(status) = query.status {
            filters.push(Filter::Text("t.status", status.as_str().to_string()));
        }
        self.table.search(&page, &filters).await
    }

    /// Distinct classes of active students
    pub async fn classes(&self) -> AppResult<Vec<String>> {
        let classes = sqlx::query_scalar(
            "SELECT DISTINCT class FROM students WHERE status = 'active' ORDER BY class",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(classes)
    }

    /// Active students of one class
    pub async fn by_class(&self, class: &str) -> AppResult<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE class = $1 AND status = 'active' ORDER BY name",
        )
        .bind(class)
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }

    pub async fn create(&self, student: &CreateStudent) -> AppResult<Student> {
        let created = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (id, name, class, status)
            VALUES ($1, $2, $3, 'active')
            RETURNING *
            "#,
        )
        .bind(student.id.trim())
        .bind(student.name.trim())
        .bind(student.class.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update(&self, id: &str, student: &UpdateStudent) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            "UPDATE students SET name = $2, class = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(student.name.trim())
        .bind(student.class.trim())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))
    }

    pub async fn update_photo(&self, id: &str, photo_url: Option<&str>) -> AppResult<Student> {
        sqlx::query_as::<_, Student>("UPDATE students SET photo_url = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(photo_url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))
    }

    /// Delete a student without active lendings; returned lendings go too
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let found: Option<String> =
            sqlx::query_scalar("SELECT id FROM students WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            return abort(tx, AppError::NotFound(format!("Student {} not found", id))).await;
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lendings WHERE student_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if active > 0 {
            return abort(
                tx,
                AppError::Conflict(format!(
                    "Student {} still has {} book(s) on loan",
                    id, active
                )),
            )
            .await;
        }

        sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Active students as roster entries, the baseline of a roster sync
    pub async fn active_roster(&self) -> AppResult<Vec<RosterEntry>> {
        let entries = sqlx::query_as::<_, RosterEntry>(
            "SELECT id, name, class FROM students WHERE status = 'active' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Apply a roster diff in one transaction.
    ///
    /// Creations that hit an existing active id are skipped; a graduated
    /// student listed again is reactivated with the roster's name and class.
    pub async fn execute_sync(&self, plan: &StudentSyncPlan) -> AppResult<StudentSyncResult> {
        let mut tx = self.pool.begin().await?;
        let mut result = StudentSyncResult::default();

        if !plan.to_create.is_empty() {
            let (ids, names, classes) = columns(&plan.to_create);
            let inserted = sqlx::query(
                r#"
                INSERT INTO students (id, name, class, status)
                SELECT id, name, class, 'active'
                FROM UNNEST($1::varchar[], $2::varchar[], $3::varchar[]) AS r(id, name, class)
                ON CONFLICT (id) DO UPDATE
                    SET name = EXCLUDED.name, class = EXCLUDED.class, status = 'active'
                    WHERE students.status <> 'active'
                "#,
            )
            .bind(&ids)
            .bind(&names)
            .bind(&classes)
            .execute(&mut *tx)
            .await?;
            result.created = inserted.rows_affected() as usize;
        }

        for update in &plan.to_update {
            let updated = sqlx::query("UPDATE students SET name = $2, class = $3 WHERE id = $1")
                .bind(&update.id)
                .bind(&update.name)
                .bind(&update.class)
                .execute(&mut *tx)
                .await?;
            result.updated += updated.rows_affected() as usize;
        }

        if !plan.to_deactivate.is_empty() {
            let ids: Vec<String> = plan.to_deactivate.iter().map(|s| s.id.clone()).collect();
            let deactivated = sqlx::query(
                "UPDATE students SET status = 'graduated' WHERE id = ANY($1) AND status = 'active'",
            )
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
            result.deactivated = deactivated.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(result)
    }

    /// Insert roster rows, leaving students that already exist untouched
    pub async fn bulk_insert(&self, entries: &[RosterEntry]) -> AppResult<u64> {
        if entries.is_empty() {
            return Ok(0);
        }
        let (ids, names, classes) = columns(entries);
        let result = sqlx::query(
            r#"
            INSERT INTO students (id, name, class, status)
            SELECT id, name, class, 'active'
            FROM UNNEST($1::varchar[], $2::varchar[], $3::varchar[]) AS r(id, name, class)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&ids)
        .bind(&names)
        .bind(&classes)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
