//! SMTP delivery of notices via lettre, rendered with Askama templates.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;

use super::{AssignmentNotice, CompletionNotice, Notice, Notifier, NotifyError};
use crate::config::EmailConfig;

/// HTML template for the technician assignment notice.
#[derive(Template)]
#[template(path = "email/assignment.html")]
struct AssignmentEmailHtml<'a> {
    notice: &'a AssignmentNotice,
}

/// Plain text template for the technician assignment notice.
#[derive(Template)]
#[template(path = "email/assignment.txt")]
struct AssignmentEmailText<'a> {
    notice: &'a AssignmentNotice,
}

/// HTML template for the job completion notice.
#[derive(Template)]
#[template(path = "email/job_completed.html")]
struct JobCompletedEmailHtml<'a> {
    notice: &'a CompletionNotice,
}

/// Plain text template for the job completion notice.
#[derive(Template)]
#[template(path = "email/job_completed.txt")]
struct JobCompletedEmailText<'a> {
    notice: &'a CompletionNotice,
}

/// Rendered email content.
struct RenderedEmail {
    subject: String,
    text: String,
    html: String,
}

fn render(notice: &Notice) -> Result<RenderedEmail, NotifyError> {
    match notice {
        Notice::TechnicianAssignment(n) => Ok(RenderedEmail {
            subject: format!("New service order #{} assigned to you", n.order_id),
            text: AssignmentEmailText { notice: n }.render()?,
            html: AssignmentEmailHtml { notice: n }.render()?,
        }),
        Notice::JobCompleted(n) => Ok(RenderedEmail {
            subject: format!("Job #{} completed by {}", n.order_id, n.technician_name),
            text: JobCompletedEmailText { notice: n }.render()?,
            html: JobCompletedEmailHtml { notice: n }.render()?,
        }),
    }
}

/// Notifier that sends multipart email over SMTP.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    /// Create a notifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    fn build_message(&self, notice: &Notice) -> Result<Message, NotifyError> {
        let (from_name, reply_email) = match notice {
            Notice::TechnicianAssignment(n) => (&n.from_name, &n.reply_email),
            Notice::JobCompleted(n) => (&n.from_name, &n.reply_email),
        };
        let to = notice.to_email();
        let rendered = render(notice)?;

        let from = Mailbox::new(
            Some(from_name.clone()),
            self.from_address
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
        );

        let message = Message::builder()
            .from(from)
            .reply_to(
                reply_email
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(reply_email.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(to.to_string()))?)
            .subject(rendered.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(rendered.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(rendered.html),
                    ),
            )?;

        Ok(message)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notice: &Notice) -> Result<(), NotifyError> {
        let message = self.build_message(notice)?;
        self.mailer.send(message).await?;

        tracing::info!(to = %notice.to_email(), kind = notice.kind(), "Email sent successfully");
        Ok(())
    }
}
