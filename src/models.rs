use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Rounds a monetary amount to cents.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Lecture {
    pub id: Uuid,
    /// 1-based position among siblings, dense after every mutation.
    pub order: u32,
    pub title: String,
    pub duration_minutes: u32,
    /// Playable content reference on the asset host.
    pub url: String,
    #[serde(default)]
    pub free_preview: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Chapter {
    pub id: Uuid,
    /// 1-based position among siblings, dense after every mutation.
    pub order: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lectures: Vec<Lecture>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Rating {
    pub student_id: String,
    pub value: i32,
}

/// A course document. Nested sequences default to empty so a
/// partially-populated legacy record never breaks a derived computation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Course {
    pub id: Uuid,
    pub educator_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Percentage in [0, 100].
    pub discount: i32,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub enrolled_students: Vec<String>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(educator_id: String, input: CreateCourseInput, thumbnail_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            educator_id,
            title: input.title,
            description: input.description,
            price: input.price,
            discount: input.discount,
            thumbnail_url,
            published: false,
            chapters: Vec::new(),
            enrolled_students: Vec::new(),
            ratings: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Price after discount, rounded to cents. Never negative for a
    /// valid discount.
    pub fn effective_price(&self) -> f64 {
        round2(self.price * (1.0 - f64::from(self.discount) / 100.0))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Failed,
}

impl PurchaseStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PurchaseStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PurchaseStatus::Pending),
            "completed" => Some(PurchaseStatus::Completed),
            "failed" => Some(PurchaseStatus::Failed),
            _ => None,
        }
    }
}

/// One checkout attempt. `amount` is frozen from the course's effective
/// price when the purchase is created and never recomputed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Purchase {
    pub id: Uuid,
    pub student_id: String,
    pub course_id: Uuid,
    pub amount: f64,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
}

/// Local mirror of an identity-provider account.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub enrolled_courses: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Which lectures a student has completed in one course. Analytics only.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CourseProgress {
    pub student_id: String,
    pub course_id: Uuid,
    #[serde(default)]
    pub completed_lectures: Vec<Uuid>,
}

// ---- operation inputs, validated at the boundary ----

fn require_title(title: &str, what: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::Validation(format!("{what} title must not be empty")));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::Validation("price must be a non-negative number".into()));
    }
    Ok(())
}

fn check_discount(discount: i32) -> Result<(), ApiError> {
    if !(0..=100).contains(&discount) {
        return Err(ApiError::Validation("discount must be between 0 and 100".into()));
    }
    Ok(())
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreateCourseInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub discount: i32,
}

impl CreateCourseInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_title(&self.title, "course")?;
        check_price(self.price)?;
        check_discount(self.discount)
    }
}

/// Partial course update; absent fields keep their previous value.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateCourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount: Option<i32>,
}

impl UpdateCourseInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            require_title(title, "course")?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(discount) = self.discount {
            check_discount(discount)?;
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AddChapterInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl AddChapterInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_title(&self.title, "chapter")
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateChapterInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl UpdateChapterInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            require_title(title, "chapter")?;
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AddLectureInput {
    pub title: String,
    pub duration_minutes: u32,
    pub url: String,
    #[serde(default)]
    pub free_preview: bool,
}

impl AddLectureInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_title(&self.title, "lecture")?;
        if self.duration_minutes == 0 {
            return Err(ApiError::Validation("lecture duration must be positive".into()));
        }
        if self.url.trim().is_empty() {
            return Err(ApiError::Validation("lecture content url is required".into()));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateLectureInput {
    pub title: Option<String>,
    pub duration_minutes: Option<u32>,
    pub url: Option<String>,
    pub free_preview: Option<bool>,
}

impl UpdateLectureInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            require_title(title, "lecture")?;
        }
        if self.duration_minutes == Some(0) {
            return Err(ApiError::Validation("lecture duration must be positive".into()));
        }
        if let Some(url) = &self.url {
            if url.trim().is_empty() {
                return Err(ApiError::Validation("lecture content url is required".into()));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct PublishInput {
    pub published: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CheckoutInput {
    pub course_id: Uuid,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProgressInput {
    pub course_id: Uuid,
    pub lecture_id: Uuid,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RatingInput {
    pub course_id: Uuid,
    pub value: i32,
}

impl RatingInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(1..=5).contains(&self.value) {
            return Err(ApiError::Validation("rating must be between 1 and 5".into()));
        }
        Ok(())
    }
}
