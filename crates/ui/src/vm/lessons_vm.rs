use services::CatalogService;
use services::api::LessonListing;
use wordiamo_core::model::{Lesson, LessonAccess, LessonId, Level, LevelId};

use crate::state::ViewError;

#[derive(Clone, Debug, PartialEq)]
pub struct LevelCardVm {
    pub id: LevelId,
    pub name: String,
    pub description: String,
    pub lesson_count: u32,
}

impl From<&Level> for LevelCardVm {
    fn from(level: &Level) -> Self {
        Self {
            id: level.id,
            name: level.name.clone(),
            description: level.description.clone().unwrap_or_default(),
            lesson_count: level.lesson_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LessonCardVm {
    pub id: LessonId,
    pub name: String,
    pub description: String,
    pub order: u32,
    pub meta: String,
    pub average_score: Option<String>,
    pub locked: bool,
    pub lock_reason: Option<String>,
}

impl From<&Lesson> for LessonCardVm {
    fn from(lesson: &Lesson) -> Self {
        let mut meta = format!("{} questions", lesson.question_count);
        if let Some(minutes) = lesson.estimated_minutes {
            meta.push_str(&format!(" · ~{minutes} min"));
        }
        let lock_reason = match &lesson.access {
            LessonAccess::Locked { reason } => reason.clone(),
            _ => None,
        };
        Self {
            id: lesson.id,
            name: lesson.name.clone(),
            description: lesson.description.clone().unwrap_or_default(),
            order: lesson.order,
            meta,
            average_score: lesson.average_score.map(|score| format!("{score:.0}%")),
            locked: lesson.access.is_locked(),
            lock_reason,
        }
    }
}

/// Lessons of one level with a free-text filter.
#[derive(Clone, Debug, PartialEq)]
pub struct LessonListVm {
    pub level: LevelCardVm,
    lessons: Vec<LessonCardVm>,
    query: String,
}

impl LessonListVm {
    #[must_use]
    pub fn new(listing: &LessonListing) -> Self {
        let mut lessons: Vec<LessonCardVm> =
            listing.lessons.iter().map(LessonCardVm::from).collect();
        lessons.sort_by_key(|lesson| lesson.order);
        Self {
            level: LevelCardVm::from(&listing.level),
            lessons,
            query: String::new(),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Lessons whose name or description contains the query, ignoring case.
    #[must_use]
    pub fn visible(&self) -> Vec<&LessonCardVm> {
        let needle = self.query.trim().to_lowercase();
        self.lessons
            .iter()
            .filter(|lesson| {
                needle.is_empty()
                    || lesson.name.to_lowercase().contains(&needle)
                    || lesson.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    #[must_use]
    pub fn empty_message(&self) -> Option<&'static str> {
        if self.lessons.is_empty() {
            Some("No lessons available for this level yet.")
        } else if self.visible().is_empty() {
            Some("No lessons match your search.")
        } else {
            None
        }
    }

    #[must_use]
    pub fn lesson(&self, id: LessonId) -> Option<&LessonCardVm> {
        self.lessons.iter().find(|lesson| lesson.id == id)
    }
}

/// # Errors
///
/// Returns the mapped `ViewError` if the levels cannot be fetched.
pub async fn load_levels(catalog: &CatalogService) -> Result<Vec<LevelCardVm>, ViewError> {
    let levels = catalog.levels().await?;
    Ok(levels.iter().map(LevelCardVm::from).collect())
}

/// # Errors
///
/// Returns the mapped `ViewError` if the listing or an access check fails.
pub async fn load_lessons(
    catalog: &CatalogService,
    level_id: LevelId,
) -> Result<LessonListVm, ViewError> {
    let listing = catalog.lessons_with_access(level_id).await?;
    Ok(LessonListVm::new(&listing))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: u64, order: u32, name: &str, access: LessonAccess) -> Lesson {
        Lesson {
            id: LessonId::new(id),
            level_id: LevelId::new(1),
            name: name.into(),
            description: Some(format!("About {name}")),
            order,
            estimated_minutes: Some(10),
            question_count: 5,
            average_score: None,
            access,
        }
    }

    fn listing() -> LessonListing {
        LessonListing {
            level: Level {
                id: LevelId::new(1),
                name: "Beginner".into(),
                description: None,
                order: 1,
                lesson_count: 3,
            },
            lessons: vec![
                lesson(3, 3, "Food", LessonAccess::Open),
                lesson(1, 1, "Greetings", LessonAccess::Open),
                lesson(
                    2,
                    2,
                    "Numbers",
                    LessonAccess::Locked {
                        reason: Some("Complete Greetings first".into()),
                    },
                ),
            ],
        }
    }

    #[test]
    fn lessons_are_ordered_and_locks_come_from_the_server() {
        let vm = LessonListVm::new(&listing());
        let names: Vec<_> = vm.visible().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Greetings", "Numbers", "Food"]);

        let numbers = vm.lesson(LessonId::new(2)).unwrap();
        assert!(numbers.locked);
        assert_eq!(numbers.lock_reason.as_deref(), Some("Complete Greetings first"));
        assert_eq!(numbers.meta, "5 questions · ~10 min");
        assert!(!vm.lesson(LessonId::new(3)).unwrap().locked);
    }

    #[test]
    fn search_matches_name_or_description() {
        let mut vm = LessonListVm::new(&listing());
        vm.set_query("  GREET ");
        assert_eq!(vm.visible().len(), 1);

        vm.set_query("about food");
        assert_eq!(vm.visible()[0].id, LessonId::new(3));

        vm.set_query("verbs");
        assert_eq!(vm.empty_message(), Some("No lessons match your search."));
    }
}
