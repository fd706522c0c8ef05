//! End-to-end purchase scenarios over the in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use course_backend::domain::ports::{
    CourseProgressRepository, EmailMessage, FixturePaymentGateway, MembershipChange, Notifier,
    NotifierError, RecordedEnrollment, ResourceStoreError, UserRepository,
};
use course_backend::domain::{
    CourseId, CourseProgressId, EnrollmentConfig, EnrollmentOrchestrator, EnrollmentPorts,
    ErrorCode, PaymentConfirmation, User, UserId,
};
use course_backend::outbound::mail::TracingNotifier;
use course_backend::outbound::memory::InMemoryResourceStore;
use course_backend::test_support::{
    FixedClock, Marketplace, seeded_at, signed_confirmation, verifier,
};
use rstest::{fixture, rstest};

struct RejectingNotifier;

#[async_trait]
impl Notifier for RejectingNotifier {
    async fn send(&self, _message: &EmailMessage) -> Result<(), NotifierError> {
        Err(NotifierError::delivery("relay refused connection"))
    }
}

/// Delays user reads so concurrent callers load the same snapshot.
struct SlowUserReads(Arc<InMemoryResourceStore>);

#[async_trait]
impl UserRepository for SlowUserReads {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, ResourceStoreError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        UserRepository::find_by_id(&*self.0, id).await
    }

    async fn save(&self, user: &User) -> Result<(), ResourceStoreError> {
        UserRepository::save(&*self.0, user).await
    }

    async fn record_enrollment(
        &self,
        id: &UserId,
        course_id: &CourseId,
        progress_id: &CourseProgressId,
    ) -> Result<Option<RecordedEnrollment>, ResourceStoreError> {
        self.0.record_enrollment(id, course_id, progress_id).await
    }

    async fn add_course(
        &self,
        id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<MembershipChange>, ResourceStoreError> {
        self.0.add_course(id, course_id).await
    }

    async fn withdraw_course(
        &self,
        id: &UserId,
        course_id: &CourseId,
        progress_id: Option<CourseProgressId>,
    ) -> Result<bool, ResourceStoreError> {
        self.0.withdraw_course(id, course_id, progress_id).await
    }
}

#[fixture]
fn marketplace() -> Marketplace {
    Marketplace::new()
}

#[rstest]
#[tokio::test]
async fn purchase_enrolls_pairs_progress_and_emails(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let rust = marketplace
        .seed_course(&instructor, "Rust", 49_900, &[&[60, 90]])
        .await;
    let go = marketplace
        .seed_course(&instructor, "Go", 29_900, &[&[30]])
        .await;
    let course_ids = vec![rust.course.id, go.course.id];
    let enrollment = marketplace.enrollment();

    let order = enrollment
        .capture_payment(&course_ids, &student.id)
        .await
        .expect("order opened");
    assert_eq!(order.amount_minor_units, 79_800);
    assert_eq!(order.currency, "INR");

    let report = enrollment
        .verify_and_enroll(
            signed_confirmation(&order.id, "pay_001"),
            course_ids.clone(),
            student.id,
        )
        .await
        .expect("verified")
        .into_result()
        .expect("every course enrolled");

    let stored = marketplace.user(&student.id).await;
    assert_eq!(stored.courses, course_ids);
    assert_eq!(stored.course_progress.len(), 2);
    for enrolled in report.enrolled() {
        assert!(enrolled.notified);
        assert!(stored.course_progress.contains(&enrolled.progress_id));
        let course = marketplace
            .course(&enrolled.course_id)
            .await
            .expect("course exists");
        assert!(course.has_student(&student.id));
    }

    let sent = marketplace.outbox.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, "Successfully Enrolled into Rust");
    assert_eq!(sent[1].subject, "Successfully Enrolled into Go");
}

#[rstest]
#[tokio::test]
async fn forged_confirmation_changes_nothing(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let seeded = marketplace
        .seed_course(&instructor, "Rust", 100, &[&[60]])
        .await;
    let before = marketplace.store.counts().expect("counts");

    let mut confirmation = signed_confirmation("order_x", "pay_x");
    confirmation.order_id = "order_other".to_owned();
    let err = marketplace
        .enrollment()
        .verify_and_enroll(confirmation, vec![seeded.course.id], student.id)
        .await
        .expect_err("forged");

    assert_eq!(err.code(), ErrorCode::PaymentVerificationFailed);
    assert_eq!(marketplace.store.counts().expect("counts"), before);
    assert!(marketplace.user(&student.id).await.courses.is_empty());
    assert!(marketplace.outbox.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn missing_course_is_reported_while_the_rest_enroll(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let seeded = marketplace
        .seed_course(&instructor, "Rust", 100, &[&[60]])
        .await;
    let missing = CourseId::random();

    let report = marketplace
        .enrollment()
        .verify_and_enroll(
            signed_confirmation("order_1", "pay_1"),
            vec![seeded.course.id, missing],
            student.id,
        )
        .await
        .expect("verified");

    assert_eq!(report.enrolled().count(), 1);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].course_id, missing);
    assert_eq!(failed[0].error.code(), ErrorCode::NotFound);
    assert_eq!(
        marketplace.user(&student.id).await.courses,
        vec![seeded.course.id]
    );
}

#[rstest]
#[tokio::test]
async fn second_capture_for_an_owned_course_is_refused(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let seeded = marketplace
        .seed_course(&instructor, "Rust", 100, &[&[60]])
        .await;
    let enrollment = marketplace.enrollment();

    enrollment
        .enroll_one(seeded.course.id, student.id)
        .await
        .expect("enrolled");
    let err = enrollment
        .capture_payment(&[seeded.course.id], &student.id)
        .await
        .expect_err("already enrolled");

    assert_eq!(err.code(), ErrorCode::AlreadyEnrolled);
}

#[rstest]
#[tokio::test]
async fn replayed_confirmation_is_idempotent(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let seeded = marketplace
        .seed_course(&instructor, "Rust", 100, &[&[60]])
        .await;
    let enrollment = marketplace.enrollment();
    let confirmation: PaymentConfirmation = signed_confirmation("order_r", "pay_r");

    let first = enrollment
        .verify_and_enroll(confirmation.clone(), vec![seeded.course.id], student.id)
        .await
        .expect("first attempt");
    let second = enrollment
        .verify_and_enroll(confirmation, vec![seeded.course.id], student.id)
        .await
        .expect("replay");

    let first = first.enrolled().next().expect("enrolled").clone();
    let second = second.enrolled().next().expect("enrolled").clone();
    assert_eq!(first.progress_id, second.progress_id);
    assert!(second.already_enrolled);

    let stored = marketplace.user(&student.id).await;
    assert_eq!(stored.courses, vec![seeded.course.id]);
    assert_eq!(stored.course_progress, vec![first.progress_id]);
    let course = marketplace
        .course(&seeded.course.id)
        .await
        .expect("course exists");
    assert_eq!(course.students_enrolled, vec![student.id]);
    assert_eq!(marketplace.outbox.sent().len(), 1);
    assert_eq!(marketplace.store.counts().expect("counts").progress, 1);
}

#[rstest]
#[tokio::test]
async fn mail_outage_does_not_undo_enrollment() {
    let marketplace = Marketplace::new().with_notifier(Arc::new(RejectingNotifier));
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let seeded = marketplace
        .seed_course(&instructor, "Rust", 100, &[&[60]])
        .await;

    let report = marketplace
        .enrollment()
        .verify_and_enroll(
            signed_confirmation("order_m", "pay_m"),
            vec![seeded.course.id],
            student.id,
        )
        .await
        .expect("verified");

    assert!(report.is_complete());
    assert!(!report.enrolled().next().expect("enrolled").notified);
    assert_eq!(
        marketplace.user(&student.id).await.courses,
        vec![seeded.course.id]
    );

    let err = marketplace
        .enrollment()
        .send_payment_receipt(&student.id, "order_m", "pay_m", 100)
        .await
        .expect_err("receipt delivery fails");
    assert_eq!(err.code(), ErrorCode::ExternalServiceError);
}

#[rstest]
#[tokio::test]
async fn progress_records_take_the_clock_time(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let seeded = marketplace
        .seed_course(&instructor, "Rust", 100, &[&[60]])
        .await;

    marketplace
        .enrollment()
        .enroll_one(seeded.course.id, student.id)
        .await
        .expect("enrolled");

    let progress = CourseProgressRepository::find_for(
        &*marketplace.store,
        &seeded.course.id,
        &student.id,
    )
    .await
    .expect("store reachable")
    .expect("progress recorded");
    assert_eq!(progress.created_at, seeded_at());
    assert!(progress.completed_videos.is_empty());

    let full = marketplace
        .queries()
        .full_course_details(&seeded.course.id, &student.id)
        .await
        .expect("details");
    assert!(full.completed_videos.is_empty());
}

#[rstest]
#[tokio::test]
async fn log_transport_counts_as_notified() {
    let marketplace = Marketplace::new().with_notifier(Arc::new(TracingNotifier));
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let seeded = marketplace
        .seed_course(&instructor, "Rust", 100, &[&[60]])
        .await;

    let enrolled = marketplace
        .enrollment()
        .enroll_one(seeded.course.id, student.id)
        .await
        .expect("enrolled");

    assert!(enrolled.notified);
    assert!(marketplace.outbox.sent().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_replays_send_one_email(marketplace: Marketplace) {
    let instructor = marketplace.seed_user("Ines").await;
    let student = marketplace.seed_user("Sam").await;
    let seeded = marketplace
        .seed_course(&instructor, "Rust", 100, &[&[60]])
        .await;
    let enrollment = EnrollmentOrchestrator::new(
        EnrollmentPorts::new(
            marketplace.store.clone(),
            Arc::new(SlowUserReads(marketplace.store.clone())),
            marketplace.store.clone(),
            Arc::new(FixturePaymentGateway),
            marketplace.outbox.clone(),
        ),
        verifier(),
        Arc::new(FixedClock::new(seeded_at())),
        EnrollmentConfig::default(),
    );
    let confirmation = signed_confirmation("order_c", "pay_c");

    let (first, second) = tokio::join!(
        enrollment.verify_and_enroll(confirmation.clone(), vec![seeded.course.id], student.id),
        enrollment.verify_and_enroll(confirmation, vec![seeded.course.id], student.id),
    );
    let first = first.expect("first replay").into_result().expect("enrolled");
    let second = second.expect("second replay").into_result().expect("enrolled");

    let notified = first
        .enrolled()
        .chain(second.enrolled())
        .filter(|enrolled| enrolled.notified)
        .count();
    assert_eq!(notified, 1);
    assert_eq!(marketplace.outbox.sent().len(), 1);

    let stored = marketplace.user(&student.id).await;
    assert_eq!(stored.courses, vec![seeded.course.id]);
    assert_eq!(stored.course_progress.len(), 1);
    assert_eq!(marketplace.store.counts().expect("counts").progress, 1);
}
