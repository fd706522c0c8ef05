//! In-memory marketplace wiring with seeding helpers.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::ports::{
    CategoryRepository, CourseRepository, FixturePaymentGateway, MediaStore, Notifier,
    PaymentGateway, SectionRepository, SubSectionRepository, UserRepository,
};
use crate::domain::{
    Category, CategoryId, Course, CourseAuthoringConfig, CourseAuthoringPorts,
    CourseAuthoringService, CourseDeletionConfig, CourseDeletionOrchestrator,
    CourseDeletionPorts, CourseId, CourseQueryService, CourseStatus, EnrollmentConfig,
    EnrollmentOrchestrator, EnrollmentPorts, PaymentConfirmation, PaymentSignatureVerifier,
    Section, SectionId, SubSection, SubSectionId, User, UserId,
};
use crate::outbound::memory::{InMemoryMediaStore, InMemoryOutbox, InMemoryResourceStore};

use super::FixedClock;

/// Shared gateway secret used by [`Marketplace`] orchestrators.
pub const TEST_PAYMENT_SECRET: &str = "marketplace-test-secret";

const MEDIA_FOLDER: &str = "course-media";

/// Timestamp every seeded record and fixed clock reports.
pub fn seeded_at() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).single() {
        Some(at) => at,
        None => panic!("valid seed timestamp"),
    }
}

/// Records written by [`Marketplace::seed_course`].
#[derive(Debug, Clone)]
pub struct SeededCourse {
    /// The stored course.
    pub course: Course,
    /// Its sections in display order.
    pub sections: Vec<Section>,
    /// Every lecture across all sections.
    pub sub_sections: Vec<SubSection>,
}

/// In-memory adapters plus factories for the orchestrators.
pub struct Marketplace {
    /// Every repository.
    pub store: Arc<InMemoryResourceStore>,
    /// Uploaded thumbnails and videos.
    pub media: Arc<InMemoryMediaStore>,
    /// Emails sent through the default notifier.
    pub outbox: Arc<InMemoryOutbox>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new()
    }
}

impl Marketplace {
    /// Empty adapters with the fixture gateway and the outbox notifier.
    pub fn new() -> Self {
        let outbox = Arc::new(InMemoryOutbox::new());
        Self {
            store: Arc::new(InMemoryResourceStore::new()),
            media: Arc::new(InMemoryMediaStore::new()),
            notifier: outbox.clone(),
            outbox,
            gateway: Arc::new(FixturePaymentGateway),
        }
    }

    /// Replace the mail transport, for example with a failing double.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Enrollment orchestrator keyed with [`TEST_PAYMENT_SECRET`] and a clock
    /// fixed at [`seeded_at`].
    pub fn enrollment(&self) -> EnrollmentOrchestrator {
        EnrollmentOrchestrator::new(
            EnrollmentPorts::new(
                self.store.clone(),
                self.store.clone(),
                self.store.clone(),
                self.gateway.clone(),
                self.notifier.clone(),
            ),
            verifier(),
            Arc::new(FixedClock::new(seeded_at())),
            EnrollmentConfig::default(),
        )
    }

    /// Authoring service uploading into the same folder as [`Self::seed_course`].
    pub fn authoring(&self) -> CourseAuthoringService {
        CourseAuthoringService::new(
            CourseAuthoringPorts {
                courses: self.store.clone(),
                users: self.store.clone(),
                categories: self.store.clone(),
                media: self.media.clone(),
            },
            Arc::new(FixedClock::new(seeded_at())),
            CourseAuthoringConfig {
                media_folder: MEDIA_FOLDER.to_owned(),
            },
        )
    }

    /// Seed an empty category.
    pub async fn seed_category(&self, name: &str) -> Category {
        let category = Category {
            id: CategoryId::random(),
            name: name.to_owned(),
            description: format!("{name} courses"),
            courses: Vec::new(),
        };
        self.must(CategoryRepository::save(&*self.store, &category).await);
        category
    }

    /// Load a category, panicking when it is missing.
    pub async fn category(&self, id: &CategoryId) -> Category {
        match CategoryRepository::find_by_id(&*self.store, id).await {
            Ok(Some(category)) => category,
            Ok(None) => panic!("category {id} missing"),
            Err(error) => panic!("load category: {error}"),
        }
    }

    /// Deletion orchestrator with default fan-out.
    pub fn deletion(&self) -> CourseDeletionOrchestrator {
        CourseDeletionOrchestrator::new(
            CourseDeletionPorts {
                courses: self.store.clone(),
                sections: self.store.clone(),
                sub_sections: self.store.clone(),
                users: self.store.clone(),
                progress: self.store.clone(),
                categories: self.store.clone(),
                media: self.media.clone(),
            },
            CourseDeletionConfig::default(),
        )
    }

    /// Read-side course queries.
    pub fn queries(&self) -> CourseQueryService {
        CourseQueryService::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
        )
    }

    /// Seed a user with no courses; the email is derived from `first_name`.
    pub async fn seed_user(&self, first_name: &str) -> User {
        let user = User {
            id: UserId::random(),
            email: format!("{}@example.test", first_name.to_lowercase()),
            first_name: first_name.to_owned(),
            courses: Vec::new(),
            course_progress: Vec::new(),
        };
        if let Err(error) = UserRepository::save(&*self.store, &user).await {
            panic!("seed user: {error}");
        }
        user
    }

    /// Seed a published course whose sections hold lectures of the given
    /// durations, uploading a thumbnail and one video per lecture.
    pub async fn seed_course(
        &self,
        instructor: &User,
        name: &str,
        price: u64,
        lecture_secs: &[&[u64]],
    ) -> SeededCourse {
        let course_id = CourseId::random();
        let category = Category {
            id: CategoryId::random(),
            name: "Programming".to_owned(),
            description: "Code and craft".to_owned(),
            courses: vec![course_id],
        };
        self.must(CategoryRepository::save(&*self.store, &category).await);

        let mut sections = Vec::with_capacity(lecture_secs.len());
        let mut sub_sections = Vec::new();
        for (index, durations) in lecture_secs.iter().enumerate() {
            let section_id = SectionId::random();
            let mut lecture_ids = Vec::with_capacity(durations.len());
            for duration_secs in durations.iter() {
                let sub_section = SubSection {
                    id: SubSectionId::random(),
                    section_id,
                    title: format!("Lecture {}", sub_sections.len() + 1),
                    video: self.upload().await,
                    duration_secs: *duration_secs,
                };
                self.must(SubSectionRepository::save(&*self.store, &sub_section).await);
                lecture_ids.push(sub_section.id);
                sub_sections.push(sub_section);
            }
            let section = Section {
                id: section_id,
                course_id,
                name: format!("Section {}", index + 1),
                sub_sections: lecture_ids,
            };
            self.must(SectionRepository::save(&*self.store, &section).await);
            sections.push(section);
        }

        let course = Course {
            id: course_id,
            name: name.to_owned(),
            description: format!("{name} from first principles"),
            price,
            instructor: instructor.id,
            category: category.id,
            content: sections.iter().map(|section| section.id).collect(),
            students_enrolled: Vec::new(),
            thumbnail: self.upload().await,
            status: CourseStatus::Published,
            created_at: seeded_at(),
        };
        self.must(CourseRepository::save(&*self.store, &course).await);

        let mut owner = self.user(&instructor.id).await;
        owner.courses.push(course_id);
        self.must(UserRepository::save(&*self.store, &owner).await);

        SeededCourse {
            course,
            sections,
            sub_sections,
        }
    }

    /// Load a user, panicking when it is missing.
    pub async fn user(&self, id: &UserId) -> User {
        match UserRepository::find_by_id(&*self.store, id).await {
            Ok(Some(user)) => user,
            Ok(None) => panic!("user {id} missing"),
            Err(error) => panic!("load user: {error}"),
        }
    }

    /// Load a course if it still exists.
    pub async fn course(&self, id: &CourseId) -> Option<Course> {
        match CourseRepository::find_by_id(&*self.store, id).await {
            Ok(course) => course,
            Err(error) => panic!("load course: {error}"),
        }
    }

    async fn upload(&self) -> crate::domain::MediaUrl {
        match self.media.upload(b"media".to_vec(), MEDIA_FOLDER).await {
            Ok(url) => url,
            Err(error) => panic!("seed media: {error}"),
        }
    }

    fn must<E: std::fmt::Display>(&self, result: Result<(), E>) {
        if let Err(error) = result {
            panic!("seed record: {error}");
        }
    }
}

/// Verifier keyed with [`TEST_PAYMENT_SECRET`].
pub fn verifier() -> PaymentSignatureVerifier {
    match PaymentSignatureVerifier::new(TEST_PAYMENT_SECRET) {
        Ok(verifier) => verifier,
        Err(error) => panic!("test verifier: {error}"),
    }
}

/// A confirmation signed the way the gateway would sign it.
pub fn signed_confirmation(order_id: &str, payment_id: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        order_id: order_id.to_owned(),
        payment_id: payment_id.to_owned(),
        signature: verifier().expected_signature(order_id, payment_id),
    }
}
