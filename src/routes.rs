use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::assets::AssetHost;
use crate::auth;
use crate::catalog;
use crate::config::Config;
use crate::content;
use crate::dashboard;
use crate::error::ApiError;
use crate::identity::{IdentityProvider, ROLE_EDUCATOR};
use crate::models::*;
use crate::payments::{self, CheckoutRequest, PaymentGateway};
use crate::purchase;
use crate::store::CourseStore;
use crate::webhook;

/// Signature header carried by both inbound webhooks.
const SIGNATURE_HEADER: &str = "webhook-signature";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CourseStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub assets: Arc<dyn AssetHost>,
    pub payments: Arc<dyn PaymentGateway>,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // public catalog
        .route("/courses", get(list_courses))
        .route("/courses/:id", get(course_detail))
        // purchase + processor callbacks
        .route("/checkout", post(start_checkout))
        .route("/webhooks/payment", post(payment_webhook))
        .route("/webhooks/identity", post(identity_webhook))
        // student surface
        .route("/users/me", get(current_user))
        .route("/users/me/courses", get(enrolled_courses))
        .route("/users/me/progress", post(record_progress))
        .route("/users/me/progress/:course_id", get(progress_detail))
        .route("/users/me/ratings", post(rate_course))
        // educator surface
        .route("/educator/role", post(become_educator))
        .route("/educator/courses", get(educator_courses).post(create_course))
        .route(
            "/educator/courses/:id",
            get(own_course).put(update_course).delete(delete_course),
        )
        .route("/educator/courses/:id/publish", patch(toggle_publish))
        .route("/educator/courses/:id/chapters", post(add_chapter))
        .route(
            "/educator/courses/:id/chapters/:chapter_id",
            put(update_chapter).delete(delete_chapter),
        )
        .route(
            "/educator/courses/:id/chapters/:chapter_id/lectures",
            post(add_lecture),
        )
        .route(
            "/educator/courses/:id/chapters/:chapter_id/lectures/:lecture_id",
            put(update_lecture).delete(delete_lecture),
        )
        .route("/educator/dashboard", get(educator_dashboard))
        .route("/educator/courses/:id/analytics", get(course_analytics))
        .with_state(state)
}

type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

fn bearer(auth: &BearerHeader) -> Option<&str> {
    auth.as_ref().map(|h| h.0.token())
}

// ---- public catalog ----

async fn list_courses(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let mut courses = state.store.list_published().await?;
    for course in &mut courses {
        catalog::sanitize_for_public(course);
    }
    Ok(Json(json!({ "success": true, "courses": courses })))
}

async fn course_detail(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let mut course = state
        .store
        .get_course(course_id)
        .await?
        .filter(|c| c.published)
        .ok_or_else(|| ApiError::NotFound("course not found".into()))?;
    let summary = catalog::summarize(&course);
    catalog::sanitize_for_public(&mut course);
    Ok(Json(json!({ "success": true, "course": course, "summary": summary })))
}

// ---- checkout + webhooks ----

async fn start_checkout(
    State(state): State<AppState>,
    auth: BearerHeader,
    Json(input): Json<CheckoutInput>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::authenticate(state.identity.as_ref(), bearer(&auth)).await?;
    let course = state
        .store
        .get_course(input.course_id)
        .await?
        .filter(|c| c.published)
        .ok_or_else(|| ApiError::NotFound("course not found".into()))?;
    let student = state
        .store
        .get_user(&actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    if course.enrolled_students.contains(&actor.id)
        || student.enrolled_courses.contains(&course.id)
    {
        return Err(ApiError::Conflict("already enrolled in this course".into()));
    }

    let purchase = purchase::new_pending(&actor.id, &course);
    state.store.insert_purchase(&purchase).await?;

    let request = CheckoutRequest {
        purchase_id: purchase.id,
        amount: purchase.amount,
        currency: state.config.currency.clone(),
        product_name: course.title.clone(),
        success_url: format!("{}/my-enrollments", state.config.public_origin),
        cancel_url: format!("{}/courses/{}", state.config.public_origin, course.id),
    };
    let session = match state.payments.create_checkout_session(request).await {
        Ok(session) => session,
        Err(e) => {
            // The attempt is dead; settle the record so it cannot linger
            // pending forever.
            if let Err(mark) =
                state.store.set_purchase_status(purchase.id, PurchaseStatus::Failed).await
            {
                tracing::error!(purchase_id = %purchase.id, error = %mark,
                    "failed to mark dead checkout attempt as failed");
            }
            return Err(e);
        }
    };

    tracing::info!(purchase_id = %purchase.id, course_id = %course.id, session = %session.id,
        "checkout session created");
    Ok(Json(json!({ "success": true, "redirect_url": session.url })))
}

async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    verify_signature(&headers, &body, &state.config.payment_webhook_secret)?;
    let event = payments::parse_event(&body)?;
    purchase::apply_payment_event(state.store.as_ref(), &event).await?;
    Ok(Json(json!({ "received": true })))
}

#[derive(Deserialize)]
struct IdentityEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: IdentityEventData,
}

#[derive(Deserialize, Default)]
struct IdentityEventData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    image_url: String,
}

async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    verify_signature(&headers, &body, &state.config.identity_webhook_secret)?;
    let event: IdentityEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("undecodable webhook payload: {e}")))?;

    match event.kind.as_str() {
        "user.created" | "user.updated" => {
            if event.data.id.is_empty() {
                return Err(ApiError::Validation("user event carries no id".into()));
            }
            let user = User {
                id: event.data.id,
                name: event.data.name,
                email: event.data.email,
                image_url: event.data.image_url,
                enrolled_courses: Vec::new(),
                created_at: Utc::now(),
            };
            state.store.upsert_user(&user).await?;
        }
        "user.deleted" => {
            if !event.data.id.is_empty() {
                state.store.delete_user(&event.data.id).await?;
            }
        }
        other => {
            tracing::debug!(kind = other, "ignoring unrecognized identity notification");
        }
    }
    Ok(Json(json!({ "received": true })))
}

fn verify_signature(headers: &HeaderMap, body: &[u8], secret: &str) -> Result<(), ApiError> {
    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Authentication("missing webhook signature".into()))?;
    webhook::verify(body, header, secret, Utc::now().timestamp())
        .map_err(|e| ApiError::Authentication(format!("webhook rejected: {e}")))
}

// ---- student surface ----

async fn current_user(
    State(state): State<AppState>,
    auth: BearerHeader,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::authenticate(state.identity.as_ref(), bearer(&auth)).await?;
    let user = state
        .store
        .get_user(&actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    Ok(Json(json!({ "success": true, "user": user })))
}

async fn enrolled_courses(
    State(state): State<AppState>,
    auth: BearerHeader,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::authenticate(state.identity.as_ref(), bearer(&auth)).await?;
    let user = state
        .store
        .get_user(&actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;
    let courses = state.store.list_by_ids(&user.enrolled_courses).await?;
    Ok(Json(json!({ "success": true, "courses": courses })))
}

async fn record_progress(
    State(state): State<AppState>,
    auth: BearerHeader,
    Json(input): Json<ProgressInput>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::authenticate(state.identity.as_ref(), bearer(&auth)).await?;
    let course = state
        .store
        .get_course(input.course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("course not found".into()))?;
    let known = course
        .chapters
        .iter()
        .any(|c| c.lectures.iter().any(|l| l.id == input.lecture_id));
    if !known {
        return Err(ApiError::NotFound("lecture not found".into()));
    }
    state
        .store
        .mark_lecture_complete(&actor.id, input.course_id, input.lecture_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "progress recorded" })))
}

async fn progress_detail(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::authenticate(state.identity.as_ref(), bearer(&auth)).await?;
    let progress = state
        .store
        .get_progress(&actor.id, course_id)
        .await?
        .unwrap_or(CourseProgress {
            student_id: actor.id,
            course_id,
            completed_lectures: Vec::new(),
        });
    Ok(Json(json!({ "success": true, "progress": progress })))
}

async fn rate_course(
    State(state): State<AppState>,
    auth: BearerHeader,
    Json(input): Json<RatingInput>,
) -> Result<Json<Value>, ApiError> {
    input.validate()?;
    let actor = auth::authenticate(state.identity.as_ref(), bearer(&auth)).await?;
    let course = state
        .store
        .get_course(input.course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("course not found".into()))?;
    if !course.enrolled_students.contains(&actor.id) {
        return Err(ApiError::Forbidden("you have not purchased this course".into()));
    }
    state.store.upsert_rating(course.id, &actor.id, input.value).await?;
    Ok(Json(json!({ "success": true, "message": "rating saved" })))
}

// ---- educator surface ----

async fn become_educator(
    State(state): State<AppState>,
    auth: BearerHeader,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::authenticate(state.identity.as_ref(), bearer(&auth)).await?;
    state.identity.set_role(&actor.id, ROLE_EDUCATOR).await?;
    Ok(Json(json!({ "success": true, "message": "you can publish a course now" })))
}

async fn educator_courses(
    State(state): State<AppState>,
    auth: BearerHeader,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let courses = state.store.list_by_educator(&actor.id).await?;
    let summaries: Vec<_> = courses.iter().map(catalog::summarize).collect();
    Ok(Json(json!({ "success": true, "courses": courses, "summaries": summaries })))
}

/// Pulls the `course` JSON field and the optional `thumbnail` file out
/// of a multipart request.
async fn read_course_multipart(
    mut mp: Multipart,
) -> Result<(Option<String>, Option<(String, Vec<u8>)>), ApiError> {
    let mut course_json = None;
    let mut thumbnail = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart request: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "course" {
            course_json = Some(
                field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("unreadable course field: {e}")))?,
            );
        } else if name == "thumbnail" {
            let filename = field.file_name().unwrap_or("thumbnail").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("unreadable thumbnail: {e}")))?;
            thumbnail = Some((filename, bytes.to_vec()));
        }
    }
    Ok((course_json, thumbnail))
}

async fn create_course(
    State(state): State<AppState>,
    auth: BearerHeader,
    mp: Multipart,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let (course_json, thumbnail) = read_course_multipart(mp).await?;
    let course_json =
        course_json.ok_or_else(|| ApiError::Validation("course data is required".into()))?;
    let input: CreateCourseInput = serde_json::from_str(&course_json)
        .map_err(|e| ApiError::Validation(format!("undecodable course data: {e}")))?;
    input.validate()?;
    let (filename, bytes) =
        thumbnail.ok_or_else(|| ApiError::Validation("thumbnail not attached".into()))?;

    // Upload first; the course row only ever carries a live URL.
    let uploaded = state.assets.upload(&filename, bytes).await?;
    let course = Course::new(actor.id, input, Some(uploaded.url));
    state.store.insert_course(&course).await?;

    tracing::info!(course_id = %course.id, educator_id = %course.educator_id, "course created");
    Ok(Json(json!({ "success": true, "course": course })))
}

async fn own_course(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

async fn update_course(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(course_id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;

    let (course_json, thumbnail) = read_course_multipart(mp).await?;
    let input: UpdateCourseInput = match course_json {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| ApiError::Validation(format!("undecodable course data: {e}")))?,
        None => UpdateCourseInput::default(),
    };
    input.validate()?;

    let new_thumbnail = match thumbnail {
        Some((filename, bytes)) => Some(state.assets.upload(&filename, bytes).await?.url),
        None => None,
    };
    state
        .store
        .update_course_fields(course_id, &input, new_thumbnail.as_deref())
        .await?;

    if let (Some(_), Some(old)) = (&new_thumbnail, &course.thumbnail_url) {
        if let Err(e) = state.assets.delete(old).await {
            tracing::warn!(course_id = %course_id, error = %e, "stale thumbnail not deleted");
        }
    }

    let course = state
        .store
        .get_course(course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("course not found".into()))?;
    Ok(Json(json!({ "success": true, "course": course })))
}

async fn delete_course(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    if !course.enrolled_students.is_empty() {
        return Err(ApiError::Conflict(
            "course has enrolled students; unpublish it instead of deleting".into(),
        ));
    }
    state.store.delete_course(course_id).await?;
    if let Some(thumbnail) = &course.thumbnail_url {
        if let Err(e) = state.assets.delete(thumbnail).await {
            tracing::warn!(course_id = %course_id, error = %e, "thumbnail not deleted");
        }
    }
    tracing::info!(course_id = %course_id, "course deleted");
    Ok(Json(json!({ "success": true, "message": "course deleted" })))
}

async fn toggle_publish(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(course_id): Path<Uuid>,
    Json(input): Json<PublishInput>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let mut course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    if input.published && !content::has_playable_content(&course.chapters) {
        return Err(ApiError::Validation(
            "course needs at least one chapter with a lecture before publishing".into(),
        ));
    }
    state.store.set_published(course_id, input.published).await?;
    course.published = input.published;
    Ok(Json(json!({ "success": true, "course": course })))
}

// ---- chapter & lecture editing ----

async fn add_chapter(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(course_id): Path<Uuid>,
    Json(input): Json<AddChapterInput>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let mut course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    content::add_chapter(&mut course.chapters, input)?;
    state.store.save_chapters(course_id, &course.chapters).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

async fn update_chapter(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((course_id, chapter_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateChapterInput>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let mut course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    content::update_chapter(&mut course.chapters, chapter_id, input)?;
    state.store.save_chapters(course_id, &course.chapters).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

async fn delete_chapter(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((course_id, chapter_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let mut course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    content::delete_chapter(&mut course.chapters, chapter_id)?;
    state.store.save_chapters(course_id, &course.chapters).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

async fn add_lecture(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((course_id, chapter_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<AddLectureInput>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let mut course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    content::add_lecture(&mut course.chapters, chapter_id, input)?;
    state.store.save_chapters(course_id, &course.chapters).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

async fn update_lecture(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((course_id, chapter_id, lecture_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(input): Json<UpdateLectureInput>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let mut course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    content::update_lecture(&mut course.chapters, chapter_id, lecture_id, input)?;
    state.store.save_chapters(course_id, &course.chapters).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

async fn delete_lecture(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path((course_id, chapter_id, lecture_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let mut course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    content::delete_lecture(&mut course.chapters, chapter_id, lecture_id)?;
    state.store.save_chapters(course_id, &course.chapters).await?;
    Ok(Json(json!({ "success": true, "course": course })))
}

// ---- rollups ----

async fn educator_dashboard(
    State(state): State<AppState>,
    auth: BearerHeader,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let data = dashboard::educator_dashboard(state.store.as_ref(), &actor.id).await?;
    Ok(Json(json!({ "success": true, "dashboard": data })))
}

async fn course_analytics(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let actor = auth::require_educator(state.identity.as_ref(), bearer(&auth)).await?;
    let course = auth::authorize_owner(state.store.as_ref(), &actor, course_id).await?;
    let analytics = dashboard::course_analytics(state.store.as_ref(), &course).await?;
    Ok(Json(json!({ "success": true, "analytics": analytics })))
}
