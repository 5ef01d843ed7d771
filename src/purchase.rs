//! Purchase lifecycle. A purchase is created `pending` at checkout with
//! its amount frozen, and is settled exactly once by an asynchronous
//! processor notification. Notifications are at-least-once and may
//! arrive out of order, so every transition is guarded by the current
//! status and re-delivery of a settled purchase is a no-op.

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Course, Purchase, PurchaseStatus};
use crate::payments::{PaymentEvent, PaymentEventKind};
use crate::store::CourseStore;

/// Creates the pending record for a checkout attempt, freezing the
/// amount at the course's current effective price.
pub fn new_pending(student_id: &str, course: &Course) -> Purchase {
    Purchase {
        id: Uuid::new_v4(),
        student_id: student_id.to_string(),
        course_id: course.id,
        amount: course.effective_price(),
        status: PurchaseStatus::Pending,
        created_at: Utc::now(),
    }
}

/// What a notification means for a purchase in its current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Complete,
    Fail,
    /// The purchase is already terminal; re-delivery changes nothing.
    AlreadySettled,
    /// Unknown notification kind; tolerated, not an error.
    Unrecognized,
}

pub fn settlement(current: PurchaseStatus, kind: &PaymentEventKind) -> Settlement {
    match kind {
        PaymentEventKind::Succeeded | PaymentEventKind::Failed if current.is_terminal() => {
            Settlement::AlreadySettled
        }
        PaymentEventKind::Succeeded => Settlement::Complete,
        PaymentEventKind::Failed => Settlement::Fail,
        PaymentEventKind::Other(_) => Settlement::Unrecognized,
    }
}

/// Applies one processor notification. On success the enrollment unit
/// runs as course write, student write, then the purchase status last,
/// so a partial failure leaves the purchase pending and the next
/// delivery retries the idempotent side writes.
pub async fn apply_payment_event(
    store: &dyn CourseStore,
    event: &PaymentEvent,
) -> Result<(), ApiError> {
    if let PaymentEventKind::Other(kind) = &event.kind {
        tracing::debug!(kind, "ignoring unrecognized payment notification");
        return Ok(());
    }

    let purchase_id = event
        .purchase_id
        .ok_or_else(|| ApiError::Validation("notification carries no purchase reference".into()))?;
    let purchase = store
        .get_purchase(purchase_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("purchase not found".into()))?;

    match settlement(purchase.status, &event.kind) {
        Settlement::AlreadySettled => {
            tracing::info!(%purchase_id, status = purchase.status.as_str(), "purchase already settled, ignoring re-delivery");
            Ok(())
        }
        Settlement::Unrecognized => Ok(()),
        Settlement::Fail => {
            store.set_purchase_status(purchase_id, PurchaseStatus::Failed).await?;
            tracing::info!(%purchase_id, "purchase failed");
            Ok(())
        }
        Settlement::Complete => {
            store
                .add_student_to_course(purchase.course_id, &purchase.student_id)
                .await
                .map_err(|e| {
                    tracing::error!(%purchase_id, course_id = %purchase.course_id, error = %e,
                        "enrollment failed before any write; purchase left pending for retry");
                    e
                })?;
            store
                .add_course_to_student(&purchase.student_id, purchase.course_id)
                .await
                .map_err(|e| {
                    tracing::error!(%purchase_id, student_id = %purchase.student_id, error = %e,
                        "partial enrollment: course updated but student record was not; purchase left pending for retry");
                    e
                })?;
            store.set_purchase_status(purchase_id, PurchaseStatus::Completed).await?;
            tracing::info!(%purchase_id, course_id = %purchase.course_id,
                student_id = %purchase.student_id, "purchase completed, student enrolled");
            Ok(())
        }
    }
}
