//! Unit tests for the course deletion cascade.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rstest::{fixture, rstest};

use super::{CascadeStep, CourseDeletionConfig, CourseDeletionOrchestrator, CourseDeletionPorts};
use crate::domain::ports::{
    MediaStoreError, MockCategoryRepository, MockCourseProgressRepository, MockCourseRepository,
    MockMediaStore, MockSectionRepository, MockSubSectionRepository, MockUserRepository,
    ResourceStoreError,
};
use crate::domain::{
    CategoryId, Course, CourseId, CourseProgress, CourseStatus, ErrorCode, MediaUrl, Section,
    SectionId, SubSection, SubSectionId, UserId,
};

type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().expect("journal lock").push(entry.into());
}

#[derive(Clone)]
struct Tree {
    course: Course,
    section: Section,
    sub_sections: Vec<SubSection>,
    student: UserId,
    progress: CourseProgress,
}

#[fixture]
fn tree() -> Tree {
    let course_id = CourseId::random();
    let section_id = SectionId::random();
    let student = UserId::random();
    let sub_sections: Vec<SubSection> = (0..2)
        .map(|n| SubSection {
            id: SubSectionId::random(),
            section_id,
            title: format!("Lecture {n}"),
            video: MediaUrl::new(format!("memory://media/course-media/video-{n}.mp4"))
                .expect("valid url"),
            duration_secs: 60,
        })
        .collect();
    Tree {
        course: Course {
            id: course_id,
            name: "Doomed".to_owned(),
            description: "To be deleted".to_owned(),
            price: 100,
            instructor: UserId::random(),
            category: CategoryId::random(),
            content: vec![section_id],
            students_enrolled: vec![student],
            thumbnail: MediaUrl::new("memory://media/course-media/thumb.png").expect("valid url"),
            status: CourseStatus::Published,
            created_at: Utc::now(),
        },
        section: Section {
            id: section_id,
            course_id,
            name: "Intro".to_owned(),
            sub_sections: sub_sections.iter().map(|sub| sub.id).collect(),
        },
        sub_sections,
        student,
        progress: CourseProgress::start(course_id, student, Utc::now()),
    }
}

#[derive(Clone, Default)]
struct Faults {
    thumbnail: Option<MediaStoreError>,
    student_withdrawal: bool,
    progress_lookup: bool,
    section_lookup: bool,
    sub_section_lookup: Option<SubSectionId>,
    course_delete: bool,
}

fn orchestrator(tree: &Tree, faults: Faults, journal: &Journal) -> CourseDeletionOrchestrator {
    let mut courses = MockCourseRepository::new();
    let course = tree.course.clone();
    courses
        .expect_find_by_id()
        .returning(move |id| Ok((*id == course.id).then(|| course.clone())));
    let log = journal.clone();
    let fail_course = faults.course_delete;
    courses.expect_delete().returning(move |id| {
        if fail_course {
            return Err(ResourceStoreError::connection("primary stepped down"));
        }
        record(&log, format!("course:{id}"));
        Ok(true)
    });

    let mut progress = MockCourseProgressRepository::new();
    let stored = tree.progress.clone();
    let fail_progress = faults.progress_lookup;
    progress.expect_find_for().returning(move |_, _| {
        if fail_progress {
            Err(ResourceStoreError::query("cursor expired"))
        } else {
            Ok(Some(stored.clone()))
        }
    });
    let log = journal.clone();
    progress.expect_delete().returning(move |id| {
        record(&log, format!("progress:{id}"));
        Ok(true)
    });

    let mut users = MockUserRepository::new();
    let log = journal.clone();
    let student = tree.student;
    let fail_withdrawal = faults.student_withdrawal;
    users
        .expect_withdraw_course()
        .returning(move |user_id, _, progress_id| {
            if *user_id == student && fail_withdrawal {
                return Err(ResourceStoreError::query("write conflict"));
            }
            record(&log, format!("withdraw:{user_id}:{}", progress_id.is_some()));
            Ok(true)
        });

    let mut categories = MockCategoryRepository::new();
    let log = journal.clone();
    categories.expect_detach_course().returning(move |id, _| {
        record(&log, format!("category:{id}"));
        Ok(true)
    });

    let mut media = MockMediaStore::new();
    let log = journal.clone();
    let thumbnail = tree.course.thumbnail.clone();
    let thumbnail_fault = faults.thumbnail.clone();
    media.expect_delete().returning(move |url| {
        if *url == thumbnail {
            if let Some(fault) = thumbnail_fault.clone() {
                return Err(fault);
            }
        }
        record(&log, format!("media:{url}"));
        Ok(())
    });

    let mut sections = MockSectionRepository::new();
    let section = tree.section.clone();
    let fail_lookup = faults.section_lookup;
    sections.expect_find_by_id().returning(move |_| {
        if fail_lookup {
            Err(ResourceStoreError::connection("socket closed"))
        } else {
            Ok(Some(section.clone()))
        }
    });
    let log = journal.clone();
    sections.expect_delete().returning(move |id| {
        record(&log, format!("section:{id}"));
        Ok(true)
    });

    let mut sub_sections = MockSubSectionRepository::new();
    let subs = tree.sub_sections.clone();
    let unreadable = faults.sub_section_lookup;
    sub_sections.expect_find_by_id().returning(move |id| {
        if unreadable == Some(*id) {
            return Err(ResourceStoreError::connection("node unreachable"));
        }
        Ok(subs.iter().find(|sub| sub.id == *id).cloned())
    });
    let log = journal.clone();
    sub_sections.expect_delete().returning(move |id| {
        record(&log, format!("sub:{id}"));
        Ok(true)
    });

    CourseDeletionOrchestrator::new(
        CourseDeletionPorts {
            courses: Arc::new(courses),
            sections: Arc::new(sections),
            sub_sections: Arc::new(sub_sections),
            users: Arc::new(users),
            progress: Arc::new(progress),
            categories: Arc::new(categories),
            media: Arc::new(media),
        },
        CourseDeletionConfig::default(),
    )
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().expect("journal lock").clone()
}

#[rstest]
#[tokio::test]
async fn unknown_course_is_not_found() {
    let mut courses = MockCourseRepository::new();
    courses.expect_find_by_id().times(1).returning(|_| Ok(None));
    courses.expect_delete().times(0);
    let orchestrator = CourseDeletionOrchestrator::new(
        CourseDeletionPorts {
            courses: Arc::new(courses),
            sections: Arc::new(MockSectionRepository::new()),
            sub_sections: Arc::new(MockSubSectionRepository::new()),
            users: Arc::new(MockUserRepository::new()),
            progress: Arc::new(MockCourseProgressRepository::new()),
            categories: Arc::new(MockCategoryRepository::new()),
            media: Arc::new(MockMediaStore::new()),
        },
        CourseDeletionConfig::default(),
    );

    let err = orchestrator
        .delete_course(CourseId::random())
        .await
        .expect_err("missing course");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn clean_cascade_removes_dependents_before_the_course(tree: Tree) {
    let journal = Journal::default();
    let orchestrator = orchestrator(&tree, Faults::default(), &journal);

    let report = orchestrator
        .delete_course(tree.course.id)
        .await
        .expect("deleted");

    assert!(report.is_clean());
    assert_eq!(report.students_withdrawn, 1);
    assert_eq!(report.progress_records_deleted, 1);
    assert_eq!(report.media_deleted, 3);
    assert_eq!(report.sections_deleted, 1);
    assert_eq!(report.sub_sections_deleted, 2);

    let log = entries(&journal);
    assert_eq!(log.last(), Some(&format!("course:{}", tree.course.id)));
    assert!(log.contains(&format!("withdraw:{}:true", tree.student)));
    assert!(log.contains(&format!("withdraw:{}:false", tree.course.instructor)));
    assert!(log.contains(&format!("category:{}", tree.course.category)));

    let section_at = log
        .iter()
        .position(|entry| entry.starts_with("section:"))
        .expect("section deleted");
    let last_sub_at = log
        .iter()
        .rposition(|entry| entry.starts_with("sub:"))
        .expect("sub-sections deleted");
    assert!(last_sub_at < section_at);
}

#[rstest]
#[tokio::test]
async fn media_failure_is_reported_but_not_fatal(tree: Tree) {
    let journal = Journal::default();
    let faults = Faults {
        thumbnail: Some(MediaStoreError::transport("connection reset")),
        ..Faults::default()
    };
    let orchestrator = orchestrator(&tree, faults, &journal);

    let report = orchestrator
        .delete_course(tree.course.id)
        .await
        .expect("course still deleted");

    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].step,
        CascadeStep::DeleteMedia {
            url: tree.course.thumbnail.clone()
        }
    );
    assert_eq!(report.failures[0].error.code(), ErrorCode::ExternalServiceError);
    assert_eq!(report.sub_sections_deleted, 2);
    assert!(entries(&journal).contains(&format!("course:{}", tree.course.id)));

    let err = report.into_result().expect_err("partial failure");
    assert_eq!(err.code(), ErrorCode::PartialFailure);
}

#[rstest]
#[tokio::test]
async fn absent_media_counts_as_removed(tree: Tree) {
    let journal = Journal::default();
    let faults = Faults {
        thumbnail: Some(MediaStoreError::not_found("memory://media/course-media/thumb.png")),
        ..Faults::default()
    };
    let orchestrator = orchestrator(&tree, faults, &journal);

    let report = orchestrator
        .delete_course(tree.course.id)
        .await
        .expect("deleted");

    assert!(report.is_clean());
    assert_eq!(report.media_deleted, 2);
}

#[rstest]
#[tokio::test]
async fn failed_withdrawal_keeps_the_progress_record(tree: Tree) {
    let journal = Journal::default();
    let faults = Faults {
        student_withdrawal: true,
        ..Faults::default()
    };
    let orchestrator = orchestrator(&tree, faults, &journal);

    let report = orchestrator
        .delete_course(tree.course.id)
        .await
        .expect("course still deleted");

    assert_eq!(report.students_withdrawn, 0);
    assert_eq!(report.progress_records_deleted, 0);
    assert_eq!(
        report.failures[0].step,
        CascadeStep::WithdrawStudent {
            user_id: tree.student
        }
    );
    assert!(
        !entries(&journal)
            .iter()
            .any(|entry| entry.starts_with("progress:"))
    );
}

#[rstest]
#[tokio::test]
async fn unreadable_section_is_left_for_a_sweep(tree: Tree) {
    let journal = Journal::default();
    let faults = Faults {
        section_lookup: true,
        ..Faults::default()
    };
    let orchestrator = orchestrator(&tree, faults, &journal);

    let report = orchestrator
        .delete_course(tree.course.id)
        .await
        .expect("course still deleted");

    assert_eq!(report.sections_deleted, 0);
    assert_eq!(report.sub_sections_deleted, 0);
    assert_eq!(
        report.failures[0].step,
        CascadeStep::LoadSection {
            section_id: tree.section.id
        }
    );
    assert_eq!(report.failures[0].error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn failing_course_delete_is_fatal_and_carries_dependent_failures(tree: Tree) {
    let journal = Journal::default();
    let faults = Faults {
        thumbnail: Some(MediaStoreError::rejected("quota")),
        course_delete: true,
        ..Faults::default()
    };
    let orchestrator = orchestrator(&tree, faults, &journal);

    let err = orchestrator
        .delete_course(tree.course.id)
        .await
        .expect_err("course delete failed");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    let details = err.details().expect("dependent failures attached");
    assert_eq!(details["dependentFailures"][0]["step"]["step"], "deleteMedia");
}

#[rstest]
#[tokio::test]
async fn unreadable_sub_section_keeps_its_section(tree: Tree) {
    let journal = Journal::default();
    let unreadable = tree.sub_sections[0].id;
    let faults = Faults {
        sub_section_lookup: Some(unreadable),
        ..Faults::default()
    };
    let orchestrator = orchestrator(&tree, faults, &journal);

    let report = orchestrator
        .delete_course(tree.course.id)
        .await
        .expect("course still deleted");

    assert_eq!(report.sub_sections_deleted, 1);
    assert_eq!(report.sections_deleted, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].step,
        CascadeStep::LoadSubSection {
            sub_section_id: unreadable
        }
    );
    assert_eq!(report.failures[0].error.code(), ErrorCode::ServiceUnavailable);

    let log = entries(&journal);
    assert!(!log.iter().any(|entry| entry.starts_with("section:")));
    assert!(!log.contains(&format!("sub:{unreadable}")));
    assert!(!log.contains(&format!("media:{}", tree.sub_sections[0].video)));
    assert!(log.contains(&format!("sub:{}", tree.sub_sections[1].id)));
    assert!(log.contains(&format!("course:{}", tree.course.id)));
}

#[rstest]
#[tokio::test]
async fn unreadable_progress_still_withdraws_the_student(tree: Tree) {
    let journal = Journal::default();
    let faults = Faults {
        progress_lookup: true,
        ..Faults::default()
    };
    let orchestrator = orchestrator(&tree, faults, &journal);

    let report = orchestrator
        .delete_course(tree.course.id)
        .await
        .expect("course still deleted");

    assert_eq!(report.students_withdrawn, 1);
    assert_eq!(report.progress_records_deleted, 0);
    assert_eq!(
        report.failures[0].step,
        CascadeStep::LoadProgress {
            user_id: tree.student
        }
    );

    let log = entries(&journal);
    assert!(log.contains(&format!("withdraw:{}:false", tree.student)));
    assert!(!log.iter().any(|entry| entry.starts_with("progress:")));
}
