//! Read-side derived metrics. All of these are pure and tolerate
//! missing/empty nested sequences by returning a zero-equivalent.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{round2, Chapter, Course};

/// Mean rating floored to an integer; 0 when unrated.
pub fn average_rating(course: &Course) -> i32 {
    if course.ratings.is_empty() {
        return 0;
    }
    let total: i64 = course.ratings.iter().map(|r| i64::from(r.value)).sum();
    (total / course.ratings.len() as i64) as i32
}

/// Formats a minute count as an hour/minute string.
pub fn format_duration(minutes: u64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

pub fn chapter_minutes(chapter: &Chapter) -> u64 {
    chapter.lectures.iter().map(|l| u64::from(l.duration_minutes)).sum()
}

pub fn chapter_duration(chapter: &Chapter) -> String {
    format_duration(chapter_minutes(chapter))
}

pub fn course_minutes(course: &Course) -> u64 {
    course.chapters.iter().map(chapter_minutes).sum()
}

pub fn course_duration(course: &Course) -> String {
    format_duration(course_minutes(course))
}

pub fn lecture_count(course: &Course) -> usize {
    course.chapters.iter().map(|c| c.lectures.len()).sum()
}

/// Current enrollment times current effective price. A display
/// approximation; the ledger-accurate figure lives in the dashboard
/// rollup and sums completed purchase amounts instead.
pub fn course_earnings(course: &Course) -> f64 {
    round2(course.enrolled_students.len() as f64 * course.effective_price())
}

/// Display metrics for one course, the numbers a course card shows.
#[derive(Debug, Serialize)]
pub struct CourseSummary {
    pub course_id: Uuid,
    pub effective_price: f64,
    pub average_rating: i32,
    pub total_lectures: usize,
    pub duration: String,
    pub chapter_durations: Vec<String>,
    pub enrolled_count: usize,
    /// Enrollment times current effective price, see `course_earnings`.
    pub earnings: f64,
}

pub fn summarize(course: &Course) -> CourseSummary {
    CourseSummary {
        course_id: course.id,
        effective_price: course.effective_price(),
        average_rating: average_rating(course),
        total_lectures: lecture_count(course),
        duration: course_duration(course),
        chapter_durations: course.chapters.iter().map(chapter_duration).collect(),
        enrolled_count: course.enrolled_students.len(),
        earnings: course_earnings(course),
    }
}

/// Strips paid lecture URLs for the public read path; free-preview
/// lectures keep theirs.
pub fn sanitize_for_public(course: &mut Course) {
    for chapter in &mut course.chapters {
        for lecture in &mut chapter.lectures {
            if !lecture.free_preview {
                lecture.url.clear();
            }
        }
    }
}
