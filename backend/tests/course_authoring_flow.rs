//! Course creation over the in-memory adapters, followed by the flows that
//! consume the new course.

use std::sync::Arc;

use async_trait::async_trait;
use course_backend::domain::ports::{CourseRepository, MembershipChange, ResourceStoreError};
use course_backend::domain::{
    CategoryId, Course, CourseAuthoringConfig, CourseAuthoringPorts, CourseAuthoringService,
    CourseId, CourseStatus, ErrorCode, NewCourse, UserId,
};
use course_backend::test_support::{FixedClock, Marketplace, seeded_at};
use rstest::{fixture, rstest};

/// Course store whose writes always fail.
struct ReadOnlyCourses;

#[async_trait]
impl CourseRepository for ReadOnlyCourses {
    async fn find_by_id(&self, _id: &CourseId) -> Result<Option<Course>, ResourceStoreError> {
        Ok(None)
    }

    async fn save(&self, _course: &Course) -> Result<(), ResourceStoreError> {
        Err(ResourceStoreError::connection("replica is read-only"))
    }

    async fn add_student(
        &self,
        _id: &CourseId,
        _user_id: &UserId,
    ) -> Result<Option<MembershipChange>, ResourceStoreError> {
        Ok(None)
    }

    async fn delete(&self, _id: &CourseId) -> Result<bool, ResourceStoreError> {
        Ok(false)
    }
}

#[fixture]
fn marketplace() -> Marketplace {
    Marketplace::new()
}

fn draft(name: &str, category: CategoryId) -> NewCourse {
    NewCourse {
        name: name.to_owned(),
        description: format!("{name} in depth"),
        price: 19_900,
        category,
        status: None,
    }
}

#[rstest]
#[tokio::test]
async fn new_course_is_listed_by_its_instructor_and_category(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let category = marketplace.seed_category("Systems").await;

    let course = marketplace
        .authoring()
        .create_course(instructor.id, draft("Embedded Rust", category.id), b"png".to_vec())
        .await
        .expect("course created");

    assert_eq!(course.status, CourseStatus::Draft);
    assert_eq!(course.created_at, seeded_at());
    assert!(marketplace.media.contains(&course.thumbnail));
    assert_eq!(
        course.thumbnail.object_key().as_deref().map(|key| key.starts_with("course-media/")),
        Some(true)
    );
    assert_eq!(marketplace.course(&course.id).await, Some(course.clone()));
    assert_eq!(marketplace.user(&instructor.id).await.courses, vec![course.id]);
    assert_eq!(marketplace.category(&category.id).await.courses, vec![course.id]);
}

#[rstest]
#[tokio::test]
async fn created_course_can_be_bought_and_deleted_cleanly(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let category = marketplace.seed_category("Systems").await;
    let mut new_course = draft("Embedded Rust", category.id);
    new_course.status = Some(CourseStatus::Published);
    let course = marketplace
        .authoring()
        .create_course(instructor.id, new_course, b"png".to_vec())
        .await
        .expect("course created");

    marketplace
        .enrollment()
        .enroll_one(course.id, student.id)
        .await
        .expect("enrolled");
    let report = marketplace
        .deletion()
        .delete_course(course.id)
        .await
        .expect("course removed")
        .into_result()
        .expect("clean cascade");

    assert_eq!(report.students_withdrawn, 1);
    assert_eq!(report.media_deleted, 1);
    assert!(marketplace.media.is_empty());
    assert!(marketplace.user(&instructor.id).await.courses.is_empty());
    assert!(marketplace.user(&student.id).await.courses.is_empty());
    assert!(marketplace.category(&category.id).await.courses.is_empty());
}

#[rstest]
#[tokio::test]
async fn unknown_instructor_writes_nothing(marketplace: Marketplace) {
    let category = marketplace.seed_category("Systems").await;
    let before = marketplace.store.counts().expect("counts");

    let err = marketplace
        .authoring()
        .create_course(UserId::random(), draft("Orphan", category.id), b"png".to_vec())
        .await
        .expect_err("no instructor");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(marketplace.store.counts().expect("counts"), before);
    assert!(marketplace.media.is_empty());
    assert!(marketplace.category(&category.id).await.courses.is_empty());
}

#[rstest]
#[tokio::test]
async fn failed_course_write_leaves_owners_untouched(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let category = marketplace.seed_category("Systems").await;
    let authoring = CourseAuthoringService::new(
        CourseAuthoringPorts {
            courses: Arc::new(ReadOnlyCourses),
            users: marketplace.store.clone(),
            categories: marketplace.store.clone(),
            media: marketplace.media.clone(),
        },
        Arc::new(FixedClock::new(seeded_at())),
        CourseAuthoringConfig::default(),
    );

    let err = authoring
        .create_course(instructor.id, draft("Doomed", category.id), b"png".to_vec())
        .await
        .expect_err("course write refused");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert!(marketplace.user(&instructor.id).await.courses.is_empty());
    assert!(marketplace.category(&category.id).await.courses.is_empty());
    assert!(marketplace.media.is_empty());
}
