//! Catalog service: books, categories and suppliers

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, BookStatus, CreateBook, UpdateBook},
        catalog::{
            Category, CategoryWithCounts, CreateCategory, SearchHit, Supplier, SupplierInput,
            SupplierWithCounts,
        },
        student::{Student, StudentDetails, StudentQuery},
        Page,
    },
    repository::Repository,
    services::lending::today,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn ensure_category(&self, category_id: Option<i32>) -> AppResult<()> {
        if let Some(id) = category_id {
            if !self.repository.categories.exists(id).await? {
                return Err(AppError::NotFound(format!("Category {} not found", id)));
            }
        }
        Ok(())
    }

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Page<Book>> {
        self.repository.books.search(query).await
    }

    pub async fn get_book(&self, barcode: &str) -> AppResult<Book> {
        self.repository.books.get(barcode).await
    }

    /// Copies of an ISBN in the local catalog
    pub async fn books_by_isbn(&self, isbn: &str) -> AppResult<Vec<Book>> {
        if isbn.trim().is_empty() {
            return Err(AppError::Validation("ISBN is required".to_string()));
        }
        self.repository.books.find_by_isbn(isbn).await
    }

    pub async fn create_book(&self, book: &CreateBook) -> AppResult<Book> {
        book.validate()?;
        self.ensure_category(book.category_id).await?;

        let created = self.repository.books.create(book).await?;
        tracing::info!(barcode = %created.barcode, title = %created.title, "Book created");
        Ok(created)
    }

    pub async fn update_book(&self, barcode: &str, book: &UpdateBook) -> AppResult<Book> {
        book.validate()?;
        self.ensure_category(book.category_id).await?;
        self.repository.books.update(barcode, book).await
    }

    pub async fn set_cover(&self, barcode: &str, cover_url: Option<&str>) -> AppResult<Book> {
        self.repository.books.update_cover(barcode, cover_url).await
    }

    pub async fn delete_book(&self, barcode: &str) -> AppResult<()> {
        self.repository.books.delete(barcode).await?;
        tracing::info!(barcode, "Book deleted");
        Ok(())
    }

    /// Delete several books; all or nothing
    pub async fn delete_books(&self, barcodes: &[String]) -> AppResult<u64> {
        if barcodes.is_empty() {
            return Err(AppError::Validation("No books selected".to_string()));
        }
        let deleted = self.repository.books.delete_many(barcodes).await?;
        tracing::info!(requested = barcodes.len(), deleted, "Books deleted");
        Ok(deleted)
    }

    /// Resolve one term from the search box.
    ///
    /// Tried in order: student id, book barcode (a lent copy resolves to its
    /// borrower), student name. `NotFound` when nothing matches.
    pub async fn universal_search(&self, term: &str) -> AppResult<SearchHit> {
        let term = term.trim();
        if term.is_empty() {
            return Err(AppError::Validation("Search term is required".to_string()));
        }

        if let Some(student) = self.repository.students.find(term).await? {
            return Ok(SearchHit::StudentDetails(self.student_details(student).await?));
        }

        if let Some(book) = self.repository.books.find(term).await? {
            if book.status == BookStatus::Lent {
                if let Some(lending) = self
                    .repository
                    .lendings
                    .find_active_by_barcode(&book.barcode)
                    .await?
                {
                    let borrower = self.repository.students.get(&lending.student_id).await?;
                    return Ok(SearchHit::StudentDetails(
                        self.student_details(borrower).await?,
                    ));
                }
            }
            return Ok(SearchHit::BookDetails(book));
        }

        let by_name = self
            .repository
            .students
            .search(&StudentQuery {
                q: Some(term.to_string()),
                ..Default::default()
            })
            .await?;
        if !by_name.items.is_empty() {
            return Ok(SearchHit::StudentList(by_name.items));
        }

        Err(AppError::NotFound(format!(
            "No student or book matches '{}'",
            term
        )))
    }

    async fn student_details(&self, student: Student) -> AppResult<StudentDetails> {
        let borrowed_books = self
            .repository
            .lendings
            .student_lendings(&student.id, today())
            .await?;
        Ok(StudentDetails {
            student,
            borrowed_books,
        })
    }

    pub async fn list_categories(&self) -> AppResult<Vec<CategoryWithCounts>> {
        self.repository.categories.list().await
    }

    pub async fn create_category(&self, category: &CreateCategory) -> AppResult<Category> {
        category.validate()?;
        self.repository.categories.create(&category.name).await
    }

    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        self.repository.categories.delete(id).await?;
        tracing::info!(category_id = id, "Category deleted");
        Ok(())
    }

    pub async fn list_suppliers(&self) -> AppResult<Vec<SupplierWithCounts>> {
        self.repository.suppliers.list().await
    }

    pub async fn create_supplier(&self, supplier: &SupplierInput) -> AppResult<Supplier> {
        supplier.validate()?;
        self.repository.suppliers.create(supplier).await
    }

    pub async fn update_supplier(&self, id: i32, supplier: &SupplierInput) -> AppResult<Supplier> {
        supplier.validate()?;
        self.repository.suppliers.update(id, supplier).await
    }

    pub async fn delete_supplier(&self, id: i32) -> AppResult<()> {
        self.repository.suppliers.delete(id).await?;
        tracing::info!(supplier_id = id, "Supplier deleted");
        Ok(())
    }
}
