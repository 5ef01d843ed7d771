//! Educator-facing rollups. Earnings here are ledger-accurate sums of
//! completed purchase amounts; the per-card figure in `catalog` is a
//! different, deliberate approximation and the two are never mixed.

use serde::Serialize;
use uuid::Uuid;

use crate::catalog;
use crate::error::ApiError;
use crate::models::{round2, Course};
use crate::store::CourseStore;

#[derive(Debug, Clone, Serialize)]
pub struct StudentRef {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledStudentEntry {
    pub course_title: String,
    pub student: StudentRef,
}

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub total_courses: usize,
    /// Sum of completed purchase amounts across owned courses.
    pub total_earnings: f64,
    pub enrolled_students: Vec<EnrolledStudentEntry>,
}

pub async fn educator_dashboard(
    store: &dyn CourseStore,
    educator_id: &str,
) -> Result<DashboardData, ApiError> {
    let courses = store.list_by_educator(educator_id).await?;
    let course_ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();

    let purchases = store.completed_purchases_for_courses(&course_ids).await?;
    let total_earnings = round2(purchases.iter().map(|p| p.amount).sum());

    let mut enrolled_students = Vec::new();
    for course in &courses {
        let students = store.get_users(&course.enrolled_students).await?;
        for student in students {
            enrolled_students.push(EnrolledStudentEntry {
                course_title: course.title.clone(),
                student: StudentRef {
                    id: student.id,
                    name: student.name,
                    image_url: student.image_url,
                },
            });
        }
    }

    Ok(DashboardData { total_courses: courses.len(), total_earnings, enrolled_students })
}

#[derive(Debug, Serialize)]
pub struct StudentProgressEntry {
    pub student: StudentRef,
    pub completed_lectures: usize,
    pub completion_percent: f64,
}

#[derive(Debug, Serialize)]
pub struct CourseAnalytics {
    pub course_id: Uuid,
    pub title: String,
    pub enrolled_count: usize,
    pub average_rating: i32,
    pub total_lectures: usize,
    pub students: Vec<StudentProgressEntry>,
}

pub async fn course_analytics(
    store: &dyn CourseStore,
    course: &Course,
) -> Result<CourseAnalytics, ApiError> {
    let total_lectures = catalog::lecture_count(course);
    let progress = store.progress_for_course(course.id).await?;
    let students = store.get_users(&course.enrolled_students).await?;

    let entries = students
        .into_iter()
        .map(|student| {
            let completed = progress
                .iter()
                .find(|p| p.student_id == student.id)
                .map(|p| p.completed_lectures.len())
                .unwrap_or(0);
            let completion_percent = if total_lectures == 0 {
                0.0
            } else {
                round2(completed as f64 / total_lectures as f64 * 100.0)
            };
            StudentProgressEntry {
                student: StudentRef {
                    id: student.id,
                    name: student.name,
                    image_url: student.image_url,
                },
                completed_lectures: completed,
                completion_percent,
            }
        })
        .collect();

    Ok(CourseAnalytics {
        course_id: course.id,
        title: course.title.clone(),
        enrolled_count: course.enrolled_students.len(),
        average_rating: catalog::average_rating(course),
        total_lectures,
        students: entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content;
    use crate::models::{
        AddChapterInput, AddLectureInput, CreateCourseInput, Purchase, PurchaseStatus, User,
    };
    use chrono::Utc;

    fn course(educator: &str, title: &str, price: f64) -> Course {
        Course::new(
            educator.into(),
            CreateCourseInput {
                title: title.into(),
                description: String::new(),
                price,
                discount: 0,
            },
            None,
        )
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.into(),
            name: name.into(),
            email: format!("{id}@example.com"),
            image_url: format!("https://assets.example.com/{id}.png"),
            enrolled_courses: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn completed_purchase(course_id: Uuid, student: &str, amount: f64) -> Purchase {
        Purchase {
            id: Uuid::new_v4(),
            student_id: student.into(),
            course_id,
            amount,
            status: PurchaseStatus::Completed,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dashboard_sums_completed_purchases_only() {
        let store = crate::store::mem::MemStore::new();
        let mut a = course("edu_1", "A", 100.0);
        a.enrolled_students = vec!["stu_1".into()];
        let b = course("edu_1", "B", 50.0);
        let foreign = course("edu_2", "C", 10.0);
        for c in [&a, &b, &foreign] {
            store.insert_course(c).await.unwrap();
        }
        store.upsert_user(&user("stu_1", "Ada")).await.unwrap();

        store.insert_purchase(&completed_purchase(a.id, "stu_1", 80.0)).await.unwrap();
        store.insert_purchase(&completed_purchase(b.id, "stu_2", 50.0)).await.unwrap();
        // Pending purchases never count.
        let mut pending = completed_purchase(a.id, "stu_3", 999.0);
        pending.status = PurchaseStatus::Pending;
        store.insert_purchase(&pending).await.unwrap();
        // Foreign course revenue never counts.
        store.insert_purchase(&completed_purchase(foreign.id, "stu_1", 10.0)).await.unwrap();

        let data = educator_dashboard(&store, "edu_1").await.unwrap();
        assert_eq!(data.total_courses, 2);
        assert_eq!(data.total_earnings, 130.0);
        assert_eq!(data.enrolled_students.len(), 1);
        assert_eq!(data.enrolled_students[0].course_title, "A");
        assert_eq!(data.enrolled_students[0].student.name, "Ada");
    }

    #[tokio::test]
    async fn analytics_completion_guards_zero_lectures() {
        let store = crate::store::mem::MemStore::new();
        let mut empty = course("edu_1", "Empty", 10.0);
        empty.enrolled_students = vec!["stu_1".into()];
        store.insert_course(&empty).await.unwrap();
        store.upsert_user(&user("stu_1", "Ada")).await.unwrap();

        let analytics = course_analytics(&store, &empty).await.unwrap();
        assert_eq!(analytics.total_lectures, 0);
        assert_eq!(analytics.students.len(), 1);
        assert_eq!(analytics.students[0].completion_percent, 0.0);
    }

    #[tokio::test]
    async fn analytics_computes_completion_percent() {
        let store = crate::store::mem::MemStore::new();
        let mut c = course("edu_1", "Rust", 10.0);
        let ch = content::add_chapter(
            &mut c.chapters,
            AddChapterInput { title: "Intro".into(), description: None },
        )
        .unwrap();
        let mut lecture_ids = Vec::new();
        for i in 0..4 {
            lecture_ids.push(
                content::add_lecture(
                    &mut c.chapters,
                    ch,
                    AddLectureInput {
                        title: format!("l{i}"),
                        duration_minutes: 10,
                        url: "https://assets.example.com/v.mp4".into(),
                        free_preview: false,
                    },
                )
                .unwrap(),
            );
        }
        c.enrolled_students = vec!["stu_1".into()];
        store.insert_course(&c).await.unwrap();
        store.upsert_user(&user("stu_1", "Ada")).await.unwrap();
        store.mark_lecture_complete("stu_1", c.id, lecture_ids[0]).await.unwrap();
        store.mark_lecture_complete("stu_1", c.id, lecture_ids[1]).await.unwrap();
        store.mark_lecture_complete("stu_1", c.id, lecture_ids[1]).await.unwrap();

        let analytics = course_analytics(&store, &c).await.unwrap();
        assert_eq!(analytics.total_lectures, 4);
        assert_eq!(analytics.students[0].completed_lectures, 2);
        assert_eq!(analytics.students[0].completion_percent, 50.0);
    }
}
