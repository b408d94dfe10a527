//! Student records and roster import

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        reconciliation::RosterImportResult,
        student::{CreateStudent, Student, StudentDetails, StudentQuery, UpdateStudent},
        workbook::{roster_entries, Workbook},
        Page,
    },
    repository::Repository,
    services::lending::today,
};

#[derive(Clone)]
pub struct StudentsService {
    repository: Repository,
}

impl StudentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Student with the books currently on loan, soonest due first
    pub async fn get_details(&self, id: &str) -> AppResult<StudentDetails> {
        let student = self.repository.students.get(id).await?;
        let borrowed_books = self
            .repository
            .lendings
            .student_lendings(id, today())
            .await?;
        Ok(StudentDetails {
            student,
            borrowed_books,
        })
    }

    pub async fn search(&self, query: &StudentQuery) -> AppResult<Page<Student>> {
        self.repository.students.search(query).await
    }

    pub async fn classes(&self) -> AppResult<Vec<String>> {
        self.repository.students.classes().await
    }

    pub async fn by_class(&self, class: &str) -> AppResult<Vec<Student>> {
        self.repository.students.by_class(class).await
    }

    pub async fn create(&self, student: &CreateStudent) -> AppResult<Student> {
        student.validate()?;
        let created = self.repository.students.create(student).await?;
        tracing::info!(student_id = %created.id, class = %created.class, "Student created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, student: &UpdateStudent) -> AppResult<Student> {
        student.validate()?;
        self.repository.students.update(id, student).await
    }

    pub async fn set_photo(&self, id: &str, photo_url: Option<&str>) -> AppResult<Student> {
        self.repository.students.update_photo(id, photo_url).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.repository.students.delete(id).await?;
        tracing::info!(student_id = id, "Student deleted");
        Ok(())
    }

    /// Add the students of a roster file; existing ids are left as they are
    pub async fn import_roster(&self, workbook: &Workbook) -> AppResult<RosterImportResult> {
        let entries = roster_entries(workbook.first_sheet()?)?;
        let inserted = self.repository.students.bulk_insert(&entries).await?;
        tracing::info!(rows = entries.len(), inserted, "Student roster imported");
        Ok(RosterImportResult {
            rows: entries.len(),
            inserted,
        })
    }
}
