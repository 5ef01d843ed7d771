//! Course content editing. Chapters and lectures are addressed by their
//! stable ids, never by array position; `order` is derived and renumbered
//! to a dense 1..N after every structural change.

use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    AddChapterInput, AddLectureInput, Chapter, Lecture, UpdateChapterInput, UpdateLectureInput,
};

fn renumber_chapters(chapters: &mut [Chapter]) {
    for (i, chapter) in chapters.iter_mut().enumerate() {
        chapter.order = i as u32 + 1;
    }
}

fn renumber_lectures(lectures: &mut [Lecture]) {
    for (i, lecture) in lectures.iter_mut().enumerate() {
        lecture.order = i as u32 + 1;
    }
}

fn chapter_mut(chapters: &mut [Chapter], chapter_id: Uuid) -> Result<&mut Chapter, ApiError> {
    chapters
        .iter_mut()
        .find(|c| c.id == chapter_id)
        .ok_or_else(|| ApiError::NotFound("chapter not found".into()))
}

/// Appends a new chapter and returns its id.
pub fn add_chapter(chapters: &mut Vec<Chapter>, input: AddChapterInput) -> Result<Uuid, ApiError> {
    input.validate()?;
    let id = Uuid::new_v4();
    chapters.push(Chapter {
        id,
        order: chapters.len() as u32 + 1,
        title: input.title,
        description: input.description,
        lectures: Vec::new(),
    });
    Ok(id)
}

/// Applies the provided fields to the chapter with the given id. `order`
/// is not settable through this path.
pub fn update_chapter(
    chapters: &mut [Chapter],
    chapter_id: Uuid,
    input: UpdateChapterInput,
) -> Result<(), ApiError> {
    input.validate()?;
    let chapter = chapter_mut(chapters, chapter_id)?;
    if let Some(title) = input.title {
        chapter.title = title;
    }
    if let Some(description) = input.description {
        chapter.description = Some(description);
    }
    Ok(())
}

/// Removes a chapter and its lectures as a unit, then closes the gap in
/// the remaining chapters' order values.
pub fn delete_chapter(chapters: &mut Vec<Chapter>, chapter_id: Uuid) -> Result<(), ApiError> {
    let before = chapters.len();
    chapters.retain(|c| c.id != chapter_id);
    if chapters.len() == before {
        return Err(ApiError::NotFound("chapter not found".into()));
    }
    renumber_chapters(chapters);
    Ok(())
}

/// Appends a new lecture to the given chapter and returns its id.
pub fn add_lecture(
    chapters: &mut [Chapter],
    chapter_id: Uuid,
    input: AddLectureInput,
) -> Result<Uuid, ApiError> {
    input.validate()?;
    let chapter = chapter_mut(chapters, chapter_id)?;
    let id = Uuid::new_v4();
    chapter.lectures.push(Lecture {
        id,
        order: chapter.lectures.len() as u32 + 1,
        title: input.title,
        duration_minutes: input.duration_minutes,
        url: input.url,
        free_preview: input.free_preview,
    });
    Ok(id)
}

pub fn update_lecture(
    chapters: &mut [Chapter],
    chapter_id: Uuid,
    lecture_id: Uuid,
    input: UpdateLectureInput,
) -> Result<(), ApiError> {
    input.validate()?;
    let chapter = chapter_mut(chapters, chapter_id)?;
    let lecture = chapter
        .lectures
        .iter_mut()
        .find(|l| l.id == lecture_id)
        .ok_or_else(|| ApiError::NotFound("lecture not found".into()))?;
    if let Some(title) = input.title {
        lecture.title = title;
    }
    if let Some(duration) = input.duration_minutes {
        lecture.duration_minutes = duration;
    }
    if let Some(url) = input.url {
        lecture.url = url;
    }
    if let Some(free_preview) = input.free_preview {
        lecture.free_preview = free_preview;
    }
    Ok(())
}

pub fn delete_lecture(
    chapters: &mut [Chapter],
    chapter_id: Uuid,
    lecture_id: Uuid,
) -> Result<(), ApiError> {
    let chapter = chapter_mut(chapters, chapter_id)?;
    let before = chapter.lectures.len();
    chapter.lectures.retain(|l| l.id != lecture_id);
    if chapter.lectures.len() == before {
        return Err(ApiError::NotFound("lecture not found".into()));
    }
    renumber_lectures(&mut chapter.lectures);
    Ok(())
}

/// Publish precondition: at least one chapter containing at least one
/// lecture.
pub fn has_playable_content(chapters: &[Chapter]) -> bool {
    chapters.iter().any(|c| !c.lectures.is_empty())
}
