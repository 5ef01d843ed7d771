//! Persistence. `CourseStore` is the seam the handlers and the payment
//! state machine talk to; `PgStore` is the Postgres implementation.
//!
//! The course document is the unit of mutation. Content edits write only
//! the `chapters` column and the enrollment path writes only guarded
//! array appends plus the purchase row, so editor traffic and webhook
//! traffic on the same course never clobber each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::Db;
use crate::error::ApiError;
use crate::models::{
    Chapter, Course, CourseProgress, Purchase, PurchaseStatus, Rating, UpdateCourseInput, User,
};

#[async_trait]
pub trait CourseStore: Send + Sync {
    // users
    async fn upsert_user(&self, user: &User) -> Result<(), ApiError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, ApiError>;
    async fn get_users(&self, ids: &[String]) -> Result<Vec<User>, ApiError>;
    async fn delete_user(&self, id: &str) -> Result<(), ApiError>;
    /// Student side of the enrollment pair. Idempotent.
    async fn add_course_to_student(&self, student_id: &str, course_id: Uuid)
        -> Result<(), ApiError>;

    // courses
    async fn insert_course(&self, course: &Course) -> Result<(), ApiError>;
    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, ApiError>;
    async fn list_published(&self) -> Result<Vec<Course>, ApiError>;
    async fn list_by_educator(&self, educator_id: &str) -> Result<Vec<Course>, ApiError>;
    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>, ApiError>;
    async fn update_course_fields(
        &self,
        id: Uuid,
        input: &UpdateCourseInput,
        thumbnail_url: Option<&str>,
    ) -> Result<(), ApiError>;
    /// Persists the whole content document; nothing else on the row.
    async fn save_chapters(&self, id: Uuid, chapters: &[Chapter]) -> Result<(), ApiError>;
    async fn set_published(&self, id: Uuid, published: bool) -> Result<(), ApiError>;
    async fn delete_course(&self, id: Uuid) -> Result<(), ApiError>;
    /// Course side of the enrollment pair. Idempotent.
    async fn add_student_to_course(&self, course_id: Uuid, student_id: &str)
        -> Result<(), ApiError>;

    // ratings
    async fn upsert_rating(
        &self,
        course_id: Uuid,
        student_id: &str,
        value: i32,
    ) -> Result<(), ApiError>;

    // purchases
    async fn insert_purchase(&self, purchase: &Purchase) -> Result<(), ApiError>;
    async fn get_purchase(&self, id: Uuid) -> Result<Option<Purchase>, ApiError>;
    /// Transitions out of `pending` only; a terminal row is left alone.
    async fn set_purchase_status(&self, id: Uuid, status: PurchaseStatus) -> Result<(), ApiError>;
    async fn completed_purchases_for_courses(
        &self,
        course_ids: &[Uuid],
    ) -> Result<Vec<Purchase>, ApiError>;

    // progress
    async fn mark_lecture_complete(
        &self,
        student_id: &str,
        course_id: Uuid,
        lecture_id: Uuid,
    ) -> Result<(), ApiError>;
    async fn get_progress(
        &self,
        student_id: &str,
        course_id: Uuid,
    ) -> Result<Option<CourseProgress>, ApiError>;
    async fn progress_for_course(&self, course_id: Uuid) -> Result<Vec<CourseProgress>, ApiError>;
}

// ---- Postgres ----

pub struct PgStore {
    pool: Db,
}

impl PgStore {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    /// Loads ratings for a batch of course rows and stitches them in.
    async fn attach_ratings(&self, rows: Vec<CourseRow>) -> Result<Vec<Course>, ApiError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let ratings: Vec<RatingRow> = sqlx::query_as(
            "SELECT course_id, student_id, value FROM ratings WHERE course_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_course: HashMap<Uuid, Vec<Rating>> = HashMap::new();
        for r in ratings {
            by_course
                .entry(r.course_id)
                .or_default()
                .push(Rating { student_id: r.student_id, value: r.value });
        }
        Ok(rows
            .into_iter()
            .map(|row| {
                let ratings = by_course.remove(&row.id).unwrap_or_default();
                row.into_course(ratings)
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    educator_id: String,
    title: String,
    description: String,
    price: f64,
    discount: i32,
    thumbnail_url: Option<String>,
    published: bool,
    chapters: Json<Vec<Chapter>>,
    enrolled_students: Vec<String>,
    created_at: DateTime<Utc>,
}

impl CourseRow {
    fn into_course(self, ratings: Vec<Rating>) -> Course {
        Course {
            id: self.id,
            educator_id: self.educator_id,
            title: self.title,
            description: self.description,
            price: self.price,
            discount: self.discount,
            thumbnail_url: self.thumbnail_url,
            published: self.published,
            chapters: self.chapters.0,
            enrolled_students: self.enrolled_students,
            ratings,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    course_id: Uuid,
    student_id: String,
    value: i32,
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    student_id: String,
    course_id: Uuid,
    amount: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl PurchaseRow {
    fn into_purchase(self) -> Result<Purchase, ApiError> {
        let status = PurchaseStatus::parse(&self.status)
            .ok_or_else(|| ApiError::Dependency(format!("corrupt purchase status {}", self.status)))?;
        Ok(Purchase {
            id: self.id,
            student_id: self.student_id,
            course_id: self.course_id,
            amount: self.amount,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    image_url: String,
    enrolled_courses: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            name: r.name,
            email: r.email,
            image_url: r.image_url,
            enrolled_courses: r.enrolled_courses,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    student_id: String,
    course_id: Uuid,
    completed_lectures: Vec<Uuid>,
}

impl From<ProgressRow> for CourseProgress {
    fn from(r: ProgressRow) -> Self {
        CourseProgress {
            student_id: r.student_id,
            course_id: r.course_id,
            completed_lectures: r.completed_lectures,
        }
    }
}

const SELECT_COURSE: &str = "SELECT id, educator_id, title, description, price, discount, \
     thumbnail_url, published, chapters, enrolled_students, created_at FROM courses";

#[async_trait]
impl CourseStore for PgStore {
    async fn upsert_user(&self, user: &User) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, image_url, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE
             SET name = EXCLUDED.name, email = EXCLUDED.email, image_url = EXCLUDED.image_url",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image_url)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, ApiError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, image_url, enrolled_courses, created_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn get_users(&self, ids: &[String]) -> Result<Vec<User>, ApiError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, name, email, image_url, enrolled_courses, created_at
             FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn add_course_to_student(
        &self,
        student_id: &str,
        course_id: Uuid,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE users SET enrolled_courses = array_append(enrolled_courses, $2)
             WHERE id = $1 AND NOT ($2 = ANY(enrolled_courses))",
        )
        .bind(student_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_course(&self, course: &Course) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO courses (id, educator_id, title, description, price, discount,
                                  thumbnail_url, published, chapters, enrolled_students, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(course.id)
        .bind(&course.educator_id)
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.price)
        .bind(course.discount)
        .bind(&course.thumbnail_url)
        .bind(course.published)
        .bind(Json(&course.chapters))
        .bind(&course.enrolled_students)
        .bind(course.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, ApiError> {
        let row: Option<CourseRow> =
            sqlx::query_as(&format!("{SELECT_COURSE} WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some(row) => Ok(self.attach_ratings(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_published(&self) -> Result<Vec<Course>, ApiError> {
        let rows: Vec<CourseRow> =
            sqlx::query_as(&format!("{SELECT_COURSE} WHERE published ORDER BY created_at DESC"))
                .fetch_all(&self.pool)
                .await?;
        self.attach_ratings(rows).await
    }

    async fn list_by_educator(&self, educator_id: &str) -> Result<Vec<Course>, ApiError> {
        let rows: Vec<CourseRow> = sqlx::query_as(&format!(
            "{SELECT_COURSE} WHERE educator_id = $1 ORDER BY created_at DESC"
        ))
        .bind(educator_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_ratings(rows).await
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>, ApiError> {
        let rows: Vec<CourseRow> = sqlx::query_as(&format!(
            "{SELECT_COURSE} WHERE id = ANY($1) ORDER BY created_at DESC"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        self.attach_ratings(rows).await
    }

    async fn update_course_fields(
        &self,
        id: Uuid,
        input: &UpdateCourseInput,
        thumbnail_url: Option<&str>,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE courses SET
               title = COALESCE($2, title),
               description = COALESCE($3, description),
               price = COALESCE($4, price),
               discount = COALESCE($5, discount),
               thumbnail_url = COALESCE($6, thumbnail_url)
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount)
        .bind(thumbnail_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_chapters(&self, id: Uuid, chapters: &[Chapter]) -> Result<(), ApiError> {
        sqlx::query("UPDATE courses SET chapters = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(chapters))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_published(&self, id: Uuid, published: bool) -> Result<(), ApiError> {
        sqlx::query("UPDATE courses SET published = $2 WHERE id = $1")
            .bind(id)
            .bind(published)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_course(&self, id: Uuid) -> Result<(), ApiError> {
        // ratings and progress rows go with it (FK cascade); purchases
        // stay, they are the ledger.
        sqlx::query("DELETE FROM courses WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn add_student_to_course(
        &self,
        course_id: Uuid,
        student_id: &str,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE courses SET enrolled_students = array_append(enrolled_students, $2)
             WHERE id = $1 AND NOT ($2 = ANY(enrolled_students))",
        )
        .bind(course_id)
        .bind(student_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_rating(
        &self,
        course_id: Uuid,
        student_id: &str,
        value: i32,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO ratings (course_id, student_id, value) VALUES ($1, $2, $3)
             ON CONFLICT (course_id, student_id) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(course_id)
        .bind(student_id)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_purchase(&self, purchase: &Purchase) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO purchases (id, student_id, course_id, amount, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(purchase.id)
        .bind(&purchase.student_id)
        .bind(purchase.course_id)
        .bind(purchase.amount)
        .bind(purchase.status.as_str())
        .bind(purchase.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_purchase(&self, id: Uuid) -> Result<Option<Purchase>, ApiError> {
        let row: Option<PurchaseRow> = sqlx::query_as(
            "SELECT id, student_id, course_id, amount, status, created_at
             FROM purchases WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(PurchaseRow::into_purchase).transpose()
    }

    async fn set_purchase_status(&self, id: Uuid, status: PurchaseStatus) -> Result<(), ApiError> {
        sqlx::query("UPDATE purchases SET status = $2 WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn completed_purchases_for_courses(
        &self,
        course_ids: &[Uuid],
    ) -> Result<Vec<Purchase>, ApiError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            "SELECT id, student_id, course_id, amount, status, created_at
             FROM purchases WHERE course_id = ANY($1) AND status = 'completed'",
        )
        .bind(course_ids)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PurchaseRow::into_purchase).collect()
    }

    async fn mark_lecture_complete(
        &self,
        student_id: &str,
        course_id: Uuid,
        lecture_id: Uuid,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO progress (student_id, course_id, completed_lectures)
             VALUES ($1, $2, ARRAY[$3])
             ON CONFLICT (student_id, course_id) DO UPDATE
             SET completed_lectures = array_append(progress.completed_lectures, $3)
             WHERE NOT ($3 = ANY(progress.completed_lectures))",
        )
        .bind(student_id)
        .bind(course_id)
        .bind(lecture_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_progress(
        &self,
        student_id: &str,
        course_id: Uuid,
    ) -> Result<Option<CourseProgress>, ApiError> {
        let row: Option<ProgressRow> = sqlx::query_as(
            "SELECT student_id, course_id, completed_lectures
             FROM progress WHERE student_id = $1 AND course_id = $2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn progress_for_course(&self, course_id: Uuid) -> Result<Vec<CourseProgress>, ApiError> {
        let rows: Vec<ProgressRow> = sqlx::query_as(
            "SELECT student_id, course_id, completed_lectures
             FROM progress WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// ---- in-memory store for tests ----

#[cfg(test)]
pub mod mem {
    use super::*;
    use tokio::sync::RwLock;

    /// In-memory `CourseStore`. The `fail_*` toggles simulate a
    /// collaborator dying partway through the enrollment unit.
    #[derive(Default)]
    pub struct MemStore {
        users: RwLock<HashMap<String, User>>,
        courses: RwLock<HashMap<Uuid, Course>>,
        purchases: RwLock<HashMap<Uuid, Purchase>>,
        progress: RwLock<HashMap<(String, Uuid), CourseProgress>>,
        pub fail_student_enroll: RwLock<bool>,
    }

    impl MemStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn set_fail_student_enroll(&self, fail: bool) {
            *self.fail_student_enroll.write().await = fail;
        }
    }

    #[async_trait]
    impl CourseStore for MemStore {
        async fn upsert_user(&self, user: &User) -> Result<(), ApiError> {
            let mut users = self.users.write().await;
            match users.get_mut(&user.id) {
                Some(existing) => {
                    existing.name = user.name.clone();
                    existing.email = user.email.clone();
                    existing.image_url = user.image_url.clone();
                }
                None => {
                    users.insert(user.id.clone(), user.clone());
                }
            }
            Ok(())
        }

        async fn get_user(&self, id: &str) -> Result<Option<User>, ApiError> {
            Ok(self.users.read().await.get(id).cloned())
        }

        async fn get_users(&self, ids: &[String]) -> Result<Vec<User>, ApiError> {
            let users = self.users.read().await;
            Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
        }

        async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
            self.users.write().await.remove(id);
            Ok(())
        }

        async fn add_course_to_student(
            &self,
            student_id: &str,
            course_id: Uuid,
        ) -> Result<(), ApiError> {
            if *self.fail_student_enroll.read().await {
                return Err(ApiError::Dependency("student record write failed".into()));
            }
            if let Some(user) = self.users.write().await.get_mut(student_id) {
                if !user.enrolled_courses.contains(&course_id) {
                    user.enrolled_courses.push(course_id);
                }
            }
            Ok(())
        }

        async fn insert_course(&self, course: &Course) -> Result<(), ApiError> {
            self.courses.write().await.insert(course.id, course.clone());
            Ok(())
        }

        async fn get_course(&self, id: Uuid) -> Result<Option<Course>, ApiError> {
            Ok(self.courses.read().await.get(&id).cloned())
        }

        async fn list_published(&self) -> Result<Vec<Course>, ApiError> {
            let mut courses: Vec<Course> =
                self.courses.read().await.values().filter(|c| c.published).cloned().collect();
            courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(courses)
        }

        async fn list_by_educator(&self, educator_id: &str) -> Result<Vec<Course>, ApiError> {
            let mut courses: Vec<Course> = self
                .courses
                .read()
                .await
                .values()
                .filter(|c| c.educator_id == educator_id)
                .cloned()
                .collect();
            courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(courses)
        }

        async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>, ApiError> {
            let courses = self.courses.read().await;
            Ok(ids.iter().filter_map(|id| courses.get(id).cloned()).collect())
        }

        async fn update_course_fields(
            &self,
            id: Uuid,
            input: &UpdateCourseInput,
            thumbnail_url: Option<&str>,
        ) -> Result<(), ApiError> {
            if let Some(course) = self.courses.write().await.get_mut(&id) {
                if let Some(title) = &input.title {
                    course.title = title.clone();
                }
                if let Some(description) = &input.description {
                    course.description = description.clone();
                }
                if let Some(price) = input.price {
                    course.price = price;
                }
                if let Some(discount) = input.discount {
                    course.discount = discount;
                }
                if let Some(url) = thumbnail_url {
                    course.thumbnail_url = Some(url.to_string());
                }
            }
            Ok(())
        }

        async fn save_chapters(&self, id: Uuid, chapters: &[Chapter]) -> Result<(), ApiError> {
            if let Some(course) = self.courses.write().await.get_mut(&id) {
                course.chapters = chapters.to_vec();
            }
            Ok(())
        }

        async fn set_published(&self, id: Uuid, published: bool) -> Result<(), ApiError> {
            if let Some(course) = self.courses.write().await.get_mut(&id) {
                course.published = published;
            }
            Ok(())
        }

        async fn delete_course(&self, id: Uuid) -> Result<(), ApiError> {
            self.courses.write().await.remove(&id);
            self.progress.write().await.retain(|(_, c), _| *c != id);
            Ok(())
        }

        async fn add_student_to_course(
            &self,
            course_id: Uuid,
            student_id: &str,
        ) -> Result<(), ApiError> {
            if let Some(course) = self.courses.write().await.get_mut(&course_id) {
                if !course.enrolled_students.iter().any(|s| s == student_id) {
                    course.enrolled_students.push(student_id.to_string());
                }
            }
            Ok(())
        }

        async fn upsert_rating(
            &self,
            course_id: Uuid,
            student_id: &str,
            value: i32,
        ) -> Result<(), ApiError> {
            if let Some(course) = self.courses.write().await.get_mut(&course_id) {
                match course.ratings.iter_mut().find(|r| r.student_id == student_id) {
                    Some(rating) => rating.value = value,
                    None => course
                        .ratings
                        .push(Rating { student_id: student_id.to_string(), value }),
                }
            }
            Ok(())
        }

        async fn insert_purchase(&self, purchase: &Purchase) -> Result<(), ApiError> {
            self.purchases.write().await.insert(purchase.id, purchase.clone());
            Ok(())
        }

        async fn get_purchase(&self, id: Uuid) -> Result<Option<Purchase>, ApiError> {
            Ok(self.purchases.read().await.get(&id).cloned())
        }

        async fn set_purchase_status(
            &self,
            id: Uuid,
            status: PurchaseStatus,
        ) -> Result<(), ApiError> {
            if let Some(purchase) = self.purchases.write().await.get_mut(&id) {
                if purchase.status == PurchaseStatus::Pending {
                    purchase.status = status;
                }
            }
            Ok(())
        }

        async fn completed_purchases_for_courses(
            &self,
            course_ids: &[Uuid],
        ) -> Result<Vec<Purchase>, ApiError> {
            Ok(self
                .purchases
                .read()
                .await
                .values()
                .filter(|p| {
                    p.status == PurchaseStatus::Completed && course_ids.contains(&p.course_id)
                })
                .cloned()
                .collect())
        }

        async fn mark_lecture_complete(
            &self,
            student_id: &str,
            course_id: Uuid,
            lecture_id: Uuid,
        ) -> Result<(), ApiError> {
            let mut progress = self.progress.write().await;
            let entry = progress
                .entry((student_id.to_string(), course_id))
                .or_insert_with(|| CourseProgress {
                    student_id: student_id.to_string(),
                    course_id,
                    completed_lectures: Vec::new(),
                });
            if !entry.completed_lectures.contains(&lecture_id) {
                entry.completed_lectures.push(lecture_id);
            }
            Ok(())
        }

        async fn get_progress(
            &self,
            student_id: &str,
            course_id: Uuid,
        ) -> Result<Option<CourseProgress>, ApiError> {
            Ok(self
                .progress
                .read()
                .await
                .get(&(student_id.to_string(), course_id))
                .cloned())
        }

        async fn progress_for_course(
            &self,
            course_id: Uuid,
        ) -> Result<Vec<CourseProgress>, ApiError> {
            Ok(self
                .progress
                .read()
                .await
                .values()
                .filter(|p| p.course_id == course_id)
                .cloned()
                .collect())
        }
    }
}
