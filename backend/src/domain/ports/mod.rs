//! Domain ports for the hexagonal boundary.
//!
//! Four collaborators sit behind these traits: the resource store (one
//! repository per collection), the media store, the payment gateway and the
//! notifier. Orchestrators hold them as `Arc<dyn Port>`.

mod macros;
pub(crate) use macros::define_port_error;

mod media_store;
mod notifier;
mod payment_gateway;
mod resource_store;

#[cfg(test)]
pub use media_store::MockMediaStore;
pub use media_store::{FixtureMediaStore, MediaStore, MediaStoreError};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{EmailMessage, FixtureNotifier, Notifier, NotifierError};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    FixturePaymentGateway, OrderRequest, PaymentGateway, PaymentGatewayError, PaymentOrder,
};
#[cfg(test)]
pub use resource_store::{
    MockCategoryRepository, MockCourseProgressRepository, MockCourseRepository,
    MockSectionRepository, MockSubSectionRepository, MockUserRepository,
};
pub use resource_store::{
    CategoryRepository, CourseProgressRepository, CourseRepository, MembershipChange,
    RecordedEnrollment, ResourceStoreError, SectionRepository, SubSectionRepository,
    UserRepository,
};
