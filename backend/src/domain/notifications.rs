//! Transactional email templates.
//!
//! Bodies are rendered from the HTML templates under `templates/`, which
//! escape every interpolated value.

use askama::Template;

use super::Error;
use super::payment::format_minor_units;
use super::ports::EmailMessage;

#[derive(Template)]
#[template(path = "course_enrollment.html")]
struct CourseEnrollmentBody<'a> {
    first_name: &'a str,
    course_name: &'a str,
}

#[derive(Template)]
#[template(path = "payment_success.html")]
struct PaymentSuccessBody<'a> {
    first_name: &'a str,
    amount: String,
    order_id: &'a str,
    payment_id: &'a str,
}

fn render(template: &impl Template, name: &str) -> Result<String, Error> {
    template
        .render()
        .map_err(|err| Error::internal(format!("{name} email failed to render: {err}")))
}

/// Confirmation sent after a course enrollment is recorded.
pub fn course_enrollment_email(
    to: &str,
    first_name: &str,
    course_name: &str,
) -> Result<EmailMessage, Error> {
    let body = CourseEnrollmentBody {
        first_name,
        course_name,
    };
    Ok(EmailMessage {
        to: to.to_owned(),
        subject: format!("Successfully Enrolled into {course_name}"),
        html_body: render(&body, "enrollment")?,
    })
}

/// Receipt sent once the client reports a completed payment.
pub fn payment_success_email(
    to: &str,
    first_name: &str,
    amount_minor_units: u64,
    order_id: &str,
    payment_id: &str,
) -> Result<EmailMessage, Error> {
    let body = PaymentSuccessBody {
        first_name,
        amount: format_minor_units(amount_minor_units),
        order_id,
        payment_id,
    };
    Ok(EmailMessage {
        to: to.to_owned(),
        subject: "Payment Received".to_owned(),
        html_body: render(&body, "payment receipt")?,
    })
}
