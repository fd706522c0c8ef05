//! Purchase and enrollment orchestration.
//!
//! `capture_payment` is a read-only preflight that prices the requested
//! courses and opens a gateway order. `verify_and_enroll` checks the gateway
//! signature before touching any record, then enrolls each course
//! independently so one bad course never blocks the others.
//!
//! Each per-course enrollment is a sequence of idempotent single-record
//! writes (append-if-absent on the course, create-or-get on the progress
//! record, append-if-absent on the user). Replaying the same confirmation
//! therefore converges on the same state instead of duplicating entries.

use std::sync::Arc;

use futures_util::{StreamExt, stream};
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::error_mapping::{map_gateway_error, map_notifier_error, map_store_error};
use crate::domain::notifications::{course_enrollment_email, payment_success_email};
use crate::domain::payment::generate_receipt;
use crate::domain::ports::{
    CourseProgressRepository, CourseRepository, MembershipChange, Notifier, OrderRequest,
    PaymentGateway, PaymentOrder, UserRepository,
};
use crate::domain::{
    Course, CourseId, CourseProgress, Error, PaymentConfirmation, PaymentSignatureVerifier, User,
    UserId, unique_ids,
};

mod report;

pub use report::{CourseEnrollmentOutcome, EnrolledCourse, EnrollmentReport, FailedCourse};

/// Tunables for [`EnrollmentOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentConfig {
    /// ISO currency code sent with every gateway order.
    pub currency: String,
    /// Maximum number of courses enrolled concurrently.
    pub fan_out: usize,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            currency: "INR".to_owned(),
            fan_out: 4,
        }
    }
}

/// Port bundle required by [`EnrollmentOrchestrator`].
pub struct EnrollmentPorts {
    /// Course documents.
    pub courses: Arc<dyn CourseRepository>,
    /// User documents.
    pub users: Arc<dyn UserRepository>,
    /// Course progress documents.
    pub progress: Arc<dyn CourseProgressRepository>,
    /// Payment gateway used to open orders.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Mail transport.
    pub notifier: Arc<dyn Notifier>,
}

impl EnrollmentPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        users: Arc<dyn UserRepository>,
        progress: Arc<dyn CourseProgressRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            courses,
            users,
            progress,
            gateway,
            notifier,
        }
    }
}

/// Domain-owned purchase workflow.
#[derive(Clone)]
pub struct EnrollmentOrchestrator {
    courses: Arc<dyn CourseRepository>,
    users: Arc<dyn UserRepository>,
    progress: Arc<dyn CourseProgressRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    verifier: PaymentSignatureVerifier,
    clock: Arc<dyn Clock>,
    config: EnrollmentConfig,
}

impl EnrollmentOrchestrator {
    /// Build an orchestrator.
    /// ```rust,ignore
    /// let orchestrator = EnrollmentOrchestrator::new(ports, verifier, clock, config);
    /// ```
    pub fn new(
        ports: EnrollmentPorts,
        verifier: PaymentSignatureVerifier,
        clock: Arc<dyn Clock>,
        config: EnrollmentConfig,
    ) -> Self {
        Self {
            courses: ports.courses,
            users: ports.users,
            progress: ports.progress,
            gateway: ports.gateway,
            notifier: ports.notifier,
            verifier,
            clock,
            config,
        }
    }

    /// Price the requested courses and open a gateway order.
    ///
    /// Performs no writes. Fails with `AlreadyEnrolled` when the user already
    /// holds any of the courses, `NotFound` for unknown courses and
    /// `ExternalServiceError` when the gateway refuses the order.
    pub async fn capture_payment(
        &self,
        course_ids: &[CourseId],
        user_id: &UserId,
    ) -> Result<PaymentOrder, Error> {
        if course_ids.is_empty() {
            return Err(Error::invalid_request("at least one course id is required"));
        }

        let mut amount_minor_units: u64 = 0;
        for course_id in unique_ids(course_ids.iter().copied()) {
            let course = self.load_course(&course_id).await?;
            if course.has_student(user_id) {
                return Err(Error::already_enrolled(format!(
                    "user {user_id} is already enrolled in course {course_id}"
                )));
            }
            amount_minor_units = amount_minor_units
                .checked_add(course.price)
                .ok_or_else(|| Error::invalid_request("order total exceeds the supported range"))?;
        }

        let request = OrderRequest {
            amount_minor_units,
            currency: self.config.currency.clone(),
            receipt: generate_receipt(),
        };
        let order = self
            .gateway
            .create_order(&request)
            .await
            .map_err(map_gateway_error)?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            amount_minor_units,
            "payment order created"
        );
        Ok(order)
    }

    /// Verify a gateway confirmation and enroll the user in every course.
    ///
    /// A malformed or mismatched signature fails before any read or write.
    /// Once verification passes, each distinct course is enrolled
    /// independently and reported in request order. The work runs on its own
    /// task so a caller dropping this future cannot abandon a course halfway
    /// through its write sequence.
    pub async fn verify_and_enroll(
        &self,
        confirmation: PaymentConfirmation,
        course_ids: Vec<CourseId>,
        user_id: UserId,
    ) -> Result<EnrollmentReport, Error> {
        confirmation.validate()?;
        if course_ids.is_empty() {
            return Err(Error::invalid_request("at least one course id is required"));
        }
        if !self.verifier.verify(&confirmation) {
            warn!(
                order_id = %confirmation.order_id,
                user_id = %user_id,
                "payment signature mismatch"
            );
            return Err(Error::payment_verification_failed("payment verification failed"));
        }

        let this = self.clone();
        tokio::spawn(async move { this.enroll_all(confirmation.order_id, course_ids, user_id).await })
            .await
            .map_err(|join_error| {
                Error::internal(format!("enrollment task did not complete: {join_error}"))
            })?
    }

    /// Enroll one user in one course without a payment check.
    ///
    /// Used for retries and administrative grants. Safe to call repeatedly.
    pub async fn enroll_one(
        &self,
        course_id: CourseId,
        user_id: UserId,
    ) -> Result<EnrolledCourse, Error> {
        let user = self.load_user(&user_id).await?;
        self.enroll_user(course_id, &user).await
    }

    /// Email a payment receipt. Performs no store writes.
    pub async fn send_payment_receipt(
        &self,
        user_id: &UserId,
        order_id: &str,
        payment_id: &str,
        amount_minor_units: u64,
    ) -> Result<(), Error> {
        if order_id.trim().is_empty() || payment_id.trim().is_empty() || amount_minor_units == 0 {
            return Err(Error::invalid_request(
                "orderId, paymentId and a non-zero amount are required",
            ));
        }
        let user = self.load_user(user_id).await?;
        let email = payment_success_email(
            &user.email,
            &user.first_name,
            amount_minor_units,
            order_id,
            payment_id,
        )?;
        self.notifier.send(&email).await.map_err(map_notifier_error)?;
        info!(user_id = %user_id, order_id, "payment receipt sent");
        Ok(())
    }

    async fn enroll_all(
        &self,
        order_id: String,
        course_ids: Vec<CourseId>,
        user_id: UserId,
    ) -> Result<EnrollmentReport, Error> {
        let user = self.load_user(&user_id).await?;
        let pending: Vec<_> = unique_ids(course_ids)
            .into_iter()
            .map(|course_id| self.enroll_outcome(course_id, &user))
            .collect();
        let outcomes: Vec<CourseEnrollmentOutcome> = stream::iter(pending)
            .buffered(self.config.fan_out.max(1))
            .collect()
            .await;

        let report = EnrollmentReport {
            user_id,
            order_id,
            outcomes,
        };
        info!(
            order_id = %report.order_id,
            user_id = %user_id,
            enrolled = report.enrolled().count(),
            failed = report.failed().count(),
            "payment enrollment finished"
        );
        Ok(report)
    }

    async fn enroll_outcome(&self, course_id: CourseId, user: &User) -> CourseEnrollmentOutcome {
        match self.enroll_user(course_id, user).await {
            Ok(enrolled) => CourseEnrollmentOutcome::Enrolled(enrolled),
            Err(error) => {
                warn!(
                    course_id = %course_id,
                    user_id = %user.id,
                    code = ?error.code(),
                    error = %error,
                    "course enrollment failed"
                );
                CourseEnrollmentOutcome::Failed(FailedCourse { course_id, error })
            }
        }
    }

    async fn enroll_user(&self, course_id: CourseId, user: &User) -> Result<EnrolledCourse, Error> {
        let course = self.load_course(&course_id).await?;

        let change = self
            .courses
            .add_student(&course_id, &user.id)
            .await
            .map_err(|err| map_store_error("course enrollment", err))?
            .ok_or_else(|| Error::not_found(format!("course {course_id} not found")))?;

        let progress = self
            .progress
            .create_or_get(CourseProgress::start(course_id, user.id, self.clock.utc()))
            .await
            .map_err(|err| map_store_error("progress creation", err))?;

        let recorded = self
            .users
            .record_enrollment(&user.id, &course_id, &progress.id)
            .await
            .map_err(|err| map_store_error("user enrollment", err))?
            .ok_or_else(|| Error::not_found(format!("user {} not found", user.id)))?;

        // Only the write that appended the course id sends the email.
        let notified = match recorded.course {
            MembershipChange::Added => self.notify_enrollment(&recorded.user, &course).await,
            MembershipChange::AlreadyPresent => {
                debug!(
                    course_id = %course_id,
                    user_id = %user.id,
                    course_change = ?change,
                    "enrollment already recorded; skipping email"
                );
                false
            }
        };

        Ok(EnrolledCourse {
            course_id,
            progress_id: progress.id,
            already_enrolled: change == MembershipChange::AlreadyPresent
                && recorded.course == MembershipChange::AlreadyPresent,
            notified,
        })
    }

    async fn notify_enrollment(&self, user: &User, course: &Course) -> bool {
        let email = match course_enrollment_email(&user.email, &user.first_name, &course.name) {
            Ok(email) => email,
            Err(error) => {
                warn!(
                    course_id = %course.id,
                    user_id = %user.id,
                    error = %error,
                    "enrollment email not rendered; enrollment kept"
                );
                return false;
            }
        };
        match self.notifier.send(&email).await {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    course_id = %course.id,
                    user_id = %user.id,
                    error = %error,
                    "enrollment email failed; enrollment kept"
                );
                false
            }
        }
    }

    async fn load_course(&self, course_id: &CourseId) -> Result<Course, Error> {
        self.courses
            .find_by_id(course_id)
            .await
            .map_err(|err| map_store_error("course lookup", err))?
            .ok_or_else(|| Error::not_found(format!("course {course_id} not found")))
    }

    async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(|err| map_store_error("user lookup", err))?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }
}
