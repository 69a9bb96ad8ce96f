//! Student roster service

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::student::{CreateStudent, Student, StudentQuery, StudentsResponse},
    models::PaginationInfo,
    repository::Repository,
    validation,
};

use super::reports::PageLimits;

#[derive(Clone)]
pub struct StudentsService {
    repository: Repository,
    limits: PageLimits,
}

impl StudentsService {
    pub fn new(repository: Repository, limits: PageLimits) -> Self {
        Self { repository, limits }
    }

    pub async fn list_students(&self, query: &StudentQuery) -> AppResult<StudentsResponse> {
        let page = self.limits.clamp(query.limit, query.offset);
        let (results, total) = self.repository.students.list(page).await?;
        Ok(StudentsResponse {
            results,
            pagination: PaginationInfo::new(page, total),
        })
    }

    pub async fn get_student(&self, id: Uuid) -> AppResult<Student> {
        self.repository.students.get_by_id(id).await
    }

    pub async fn get_by_card(&self, card_id: &str) -> AppResult<Student> {
        self.repository.students.get_by_card_id(card_id.trim()).await
    }

    pub async fn create_student(&self, request: CreateStudent) -> AppResult<Student> {
        validation::check(&request)?;
        let student = self
            .repository
            .students
            .create(&request.into_student(Utc::now()))
            .await?;
        tracing::info!("Student {} registered with card {}", student.id, student.card_id);
        Ok(student)
    }

    pub async fn delete_student(&self, id: Uuid) -> AppResult<()> {
        self.repository.students.delete(id).await?;
        tracing::info!("Student {} deleted", id);
        Ok(())
    }
}
