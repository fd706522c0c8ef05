//! Process-local resource store.
//!
//! Every collection lives behind one mutex, so each port call is atomic with
//! respect to the others. That matches the single-record atomicity the
//! orchestrators rely on and nothing stronger: no call spans two records
//! except through the orchestrator's own sequencing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    CategoryRepository, CourseProgressRepository, CourseRepository, MembershipChange,
    RecordedEnrollment, ResourceStoreError, SectionRepository, SubSectionRepository,
    UserRepository,
};
use crate::domain::{
    Category, CategoryId, Course, CourseId, CourseProgress, CourseProgressId, Section, SectionId,
    SubSection, SubSectionId, User, UserId, pull, push_unique,
};

#[derive(Debug, Default)]
struct Collections {
    courses: HashMap<CourseId, Course>,
    sections: HashMap<SectionId, Section>,
    sub_sections: HashMap<SubSectionId, SubSection>,
    users: HashMap<UserId, User>,
    progress: HashMap<CourseProgressId, CourseProgress>,
    categories: HashMap<CategoryId, Category>,
}

/// Record counts per collection, for assertions and sweeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    /// Stored courses.
    pub courses: usize,
    /// Stored sections.
    pub sections: usize,
    /// Stored sub-sections.
    pub sub_sections: usize,
    /// Stored users.
    pub users: usize,
    /// Stored progress records.
    pub progress: usize,
    /// Stored categories.
    pub categories: usize,
}

/// In-memory implementation of every repository port.
///
/// Share one instance behind an `Arc` and hand it to each port slot.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    collections: Mutex<Collections>,
}

impl InMemoryResourceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, ResourceStoreError> {
        self.collections
            .lock()
            .map_err(|_| ResourceStoreError::connection("in-memory store lock poisoned"))
    }

    /// Current record counts.
    pub fn counts(&self) -> Result<StoreCounts, ResourceStoreError> {
        let guard = self.lock()?;
        Ok(StoreCounts {
            courses: guard.courses.len(),
            sections: guard.sections.len(),
            sub_sections: guard.sub_sections.len(),
            users: guard.users.len(),
            progress: guard.progress.len(),
            categories: guard.categories.len(),
        })
    }

    /// Sections whose parent course no longer exists.
    pub fn orphaned_sections(&self) -> Result<Vec<SectionId>, ResourceStoreError> {
        let guard = self.lock()?;
        Ok(guard
            .sections
            .values()
            .filter(|section| !guard.courses.contains_key(&section.course_id))
            .map(|section| section.id)
            .collect())
    }
}

fn membership(added: bool) -> MembershipChange {
    if added {
        MembershipChange::Added
    } else {
        MembershipChange::AlreadyPresent
    }
}

#[async_trait]
impl CourseRepository for InMemoryResourceStore {
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, ResourceStoreError> {
        Ok(self.lock()?.courses.get(id).cloned())
    }

    async fn save(&self, course: &Course) -> Result<(), ResourceStoreError> {
        self.lock()?.courses.insert(course.id, course.clone());
        Ok(())
    }

    async fn add_student(
        &self,
        id: &CourseId,
        user_id: &UserId,
    ) -> Result<Option<MembershipChange>, ResourceStoreError> {
        let mut guard = self.lock()?;
        Ok(guard
            .courses
            .get_mut(id)
            .map(|course| membership(course.enroll_student(*user_id))))
    }

    async fn delete(&self, id: &CourseId) -> Result<bool, ResourceStoreError> {
        Ok(self.lock()?.courses.remove(id).is_some())
    }
}

#[async_trait]
impl SectionRepository for InMemoryResourceStore {
    async fn find_by_id(&self, id: &SectionId) -> Result<Option<Section>, ResourceStoreError> {
        Ok(self.lock()?.sections.get(id).cloned())
    }

    async fn save(&self, section: &Section) -> Result<(), ResourceStoreError> {
        self.lock()?.sections.insert(section.id, section.clone());
        Ok(())
    }

    async fn delete(&self, id: &SectionId) -> Result<bool, ResourceStoreError> {
        Ok(self.lock()?.sections.remove(id).is_some())
    }
}

#[async_trait]
impl SubSectionRepository for InMemoryResourceStore {
    async fn find_by_id(
        &self,
        id: &SubSectionId,
    ) -> Result<Option<SubSection>, ResourceStoreError> {
        Ok(self.lock()?.sub_sections.get(id).cloned())
    }

    async fn save(&self, sub_section: &SubSection) -> Result<(), ResourceStoreError> {
        self.lock()?
            .sub_sections
            .insert(sub_section.id, sub_section.clone());
        Ok(())
    }

    async fn delete(&self, id: &SubSectionId) -> Result<bool, ResourceStoreError> {
        Ok(self.lock()?.sub_sections.remove(id).is_some())
    }
}

#[async_trait]
impl UserRepository for InMemoryResourceStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, ResourceStoreError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    async fn save(&self, user: &User) -> Result<(), ResourceStoreError> {
        self.lock()?.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn record_enrollment(
        &self,
        id: &UserId,
        course_id: &CourseId,
        progress_id: &CourseProgressId,
    ) -> Result<Option<RecordedEnrollment>, ResourceStoreError> {
        let mut guard = self.lock()?;
        Ok(guard.users.get_mut(id).map(|user| {
            let course = membership(user.enroll(*course_id, *progress_id));
            RecordedEnrollment {
                user: user.clone(),
                course,
            }
        }))
    }

    async fn add_course(
        &self,
        id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<MembershipChange>, ResourceStoreError> {
        let mut guard = self.lock()?;
        Ok(guard
            .users
            .get_mut(id)
            .map(|user| membership(push_unique(&mut user.courses, *course_id))))
    }

    async fn withdraw_course(
        &self,
        id: &UserId,
        course_id: &CourseId,
        progress_id: Option<CourseProgressId>,
    ) -> Result<bool, ResourceStoreError> {
        let mut guard = self.lock()?;
        Ok(guard
            .users
            .get_mut(id)
            .map(|user| {
                user.withdraw(course_id, progress_id.as_ref());
            })
            .is_some())
    }
}

#[async_trait]
impl CourseProgressRepository for InMemoryResourceStore {
    async fn find_for(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
    ) -> Result<Option<CourseProgress>, ResourceStoreError> {
        Ok(self
            .lock()?
            .progress
            .values()
            .find(|record| record.course_id == *course_id && record.user_id == *user_id)
            .cloned())
    }

    async fn create_or_get(
        &self,
        candidate: CourseProgress,
    ) -> Result<CourseProgress, ResourceStoreError> {
        let mut guard = self.lock()?;
        if let Some(existing) = guard.progress.values().find(|record| {
            record.course_id == candidate.course_id && record.user_id == candidate.user_id
        }) {
            return Ok(existing.clone());
        }
        guard.progress.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    async fn delete(&self, id: &CourseProgressId) -> Result<bool, ResourceStoreError> {
        Ok(self.lock()?.progress.remove(id).is_some())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryResourceStore {
    async fn find_by_id(&self, id: &CategoryId) -> Result<Option<Category>, ResourceStoreError> {
        Ok(self.lock()?.categories.get(id).cloned())
    }

    async fn save(&self, category: &Category) -> Result<(), ResourceStoreError> {
        self.lock()?.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn attach_course(
        &self,
        id: &CategoryId,
        course_id: &CourseId,
    ) -> Result<Option<MembershipChange>, ResourceStoreError> {
        let mut guard = self.lock()?;
        Ok(guard
            .categories
            .get_mut(id)
            .map(|category| membership(push_unique(&mut category.courses, *course_id))))
    }

    async fn detach_course(
        &self,
        id: &CategoryId,
        course_id: &CourseId,
    ) -> Result<bool, ResourceStoreError> {
        let mut guard = self.lock()?;
        Ok(guard
            .categories
            .get_mut(id)
            .map(|category| {
                pull(&mut category.courses, course_id);
            })
            .is_some())
    }
}
