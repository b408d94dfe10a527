//! Student endpoints, roster import and roster sync

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::{ApiResponse, ApiResult, AuthenticatedUser};
use crate::{
    error::AppResult,
    models::{
        reconciliation::{RosterImportResult, StudentSyncPlan, StudentSyncResult},
        student::{
            BorrowedBook, CreateStudent, Student, StudentDetails, StudentQuery, UpdatePhoto,
            UpdateStudent,
        },
        workbook::Workbook,
        Page,
    },
    AppState,
};

/// Search students
#[utoipa::path(
    get,
    path = "/students",
    tag = "students",
    security(("bearer_auth" = [])),
    params(StudentQuery),
    responses(
        (status = 200, description = "Page of students", body = Vec<Student>)
    )
)]
pub async fn list_students(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Query(query): Query<StudentQuery>,
) -> ApiResult<Page<Student>> {
    identity.require_staff()?;
    let page = state.services.students.search(&query).await?;
    Ok(ApiResponse::ok(page))
}

/// Get a student with the books currently on loan
#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Roster id")),
    responses(
        (status = 200, description = "Student details", body = StudentDetails),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<StudentDetails> {
    identity.require_staff()?;
    let details = state.services.students.get_details(&id).await?;
    Ok(ApiResponse::ok(details))
}

/// Active lendings of a student
#[utoipa::path(
    get,
    path = "/students/{id}/lendings",
    tag = "students",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Roster id")),
    responses(
        (status = 200, description = "Borrowed books, soonest due first", body = Vec<BorrowedBook>),
        (status = 404, description = "Student not found")
    )
)]
pub async fn student_lendings(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<Vec<BorrowedBook>> {
    identity.require_staff()?;
    let books = state.services.lending.student_lendings(&id).await?;
    Ok(ApiResponse::ok(books))
}

/// Create a student
#[utoipa::path(
    post,
    path = "/students",
    tag = "students",
    security(("bearer_auth" = [])),
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 409, description = "Id already exists")
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(student): Json<CreateStudent>,
) -> AppResult<(StatusCode, Json<ApiResponse<Student>>)> {
    identity.require_staff()?;
    let created = state.services.students.create(&student).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(created, "Student created"),
    ))
}

/// Update name and class
#[utoipa::path(
    put,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Roster id")),
    request_body = UpdateStudent,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 404, description = "Student not found")
    )
)]
pub async fn update_student(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<String>,
    Json(student): Json<UpdateStudent>,
) -> ApiResult<Student> {
    identity.require_staff()?;
    let updated = state.services.students.update(&id, &student).await?;
    Ok(ApiResponse::with_message(updated, "Student updated"))
}

/// Set or clear the photo reference
#[utoipa::path(
    put,
    path = "/students/{id}/photo",
    tag = "students",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Roster id")),
    request_body = UpdatePhoto,
    responses(
        (status = 200, description = "Photo updated", body = Student),
        (status = 404, description = "Student not found")
    )
)]
pub async fn set_photo(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<String>,
    Json(photo): Json<UpdatePhoto>,
) -> ApiResult<Student> {
    identity.require_staff()?;
    let student = state
        .services
        .students
        .set_photo(&id, photo.photo_url.as_deref())
        .await?;
    Ok(ApiResponse::with_message(student, "Photo updated"))
}

/// Delete a student without active lendings
#[utoipa::path(
    delete,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Roster id")),
    responses(
        (status = 200, description = "Student deleted"),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Student has books on loan")
    )
)]
pub async fn delete_student(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    identity.require_staff()?;
    state.services.students.delete(&id).await?;
    Ok(ApiResponse::with_message((), "Student deleted"))
}

/// Distinct classes of active students
#[utoipa::path(
    get,
    path = "/classes",
    tag = "students",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Class names", body = Vec<String>)
    )
)]
pub async fn list_classes(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> ApiResult<Vec<String>> {
    identity.require_staff()?;
    let classes = state.services.students.classes().await?;
    Ok(ApiResponse::ok(classes))
}

/// Active students of a class
#[utoipa::path(
    get,
    path = "/classes/{class}/students",
    tag = "students",
    security(("bearer_auth" = [])),
    params(("class" = String, Path, description = "Class name")),
    responses(
        (status = 200, description = "Students", body = Vec<Student>)
    )
)]
pub async fn class_students(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(class): Path<String>,
) -> ApiResult<Vec<Student>> {
    identity.require_staff()?;
    let students = state.services.students.by_class(&class).await?;
    Ok(ApiResponse::ok(students))
}

/// Import a roster workbook; existing ids are skipped
#[utoipa::path(
    post,
    path = "/students/import",
    tag = "students",
    security(("bearer_auth" = [])),
    request_body = Workbook,
    responses(
        (status = 200, description = "Roster imported", body = RosterImportResult),
        (status = 400, description = "Missing sheet or column")
    )
)]
pub async fn import_students(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(workbook): Json<Workbook>,
) -> ApiResult<RosterImportResult> {
    identity.require_staff()?;
    let result = state.services.students.import_roster(&workbook).await?;
    Ok(ApiResponse::with_message(
        result,
        format!("{} of {} student(s) added", result.inserted, result.rows),
    ))
}

/// Compare a roster workbook with the active students, without writing
#[utoipa::path(
    post,
    path = "/students/sync/preview",
    tag = "students",
    security(("bearer_auth" = [])),
    request_body = Workbook,
    responses(
        (status = 200, description = "Planned changes", body = StudentSyncPlan),
        (status = 400, description = "Missing sheet or column")
    )
)]
pub async fn preview_sync(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(workbook): Json<Workbook>,
) -> ApiResult<StudentSyncPlan> {
    identity.require_staff()?;
    let plan = state.services.reconciliation.analyze_sync(&workbook).await?;
    Ok(ApiResponse::ok(plan))
}

/// Apply a (possibly edited) sync plan in one transaction
#[utoipa::path(
    post,
    path = "/students/sync/execute",
    tag = "students",
    security(("bearer_auth" = [])),
    request_body = StudentSyncPlan,
    responses(
        (status = 200, description = "Changes applied", body = StudentSyncResult)
    )
)]
pub async fn execute_sync(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(plan): Json<StudentSyncPlan>,
) -> ApiResult<StudentSyncResult> {
    identity.require_staff()?;
    let result = state.services.reconciliation.execute_sync(&plan).await?;
    Ok(ApiResponse::with_message(result, "Student roster synchronized"))
}
