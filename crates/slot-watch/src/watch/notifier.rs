use std::future::Future;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::Serialize;
use tracing::info;

use super::directory::LocationDirectory;
use super::policy::NotificationPayload;

pub const NOTIFICATION_SUBJECT: &str = "Global Entry Interview found";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
}

impl NotificationMessage {
    pub fn render(payload: &NotificationPayload, directory: &LocationDirectory) -> Self {
        let location_name = directory.display_name(&payload.location);
        Self {
            subject: NOTIFICATION_SUBJECT.to_string(),
            body: format!(
                "Found new appointment(s) in location {} on {}!",
                location_name,
                payload.slots.join("\n")
            ),
        }
    }
}

/// Outbound delivery hook for rendered notifications.
pub trait Notifier: Send + Sync {
    fn send(
        &self,
        message: &NotificationMessage,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid email address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("email settings incomplete: {0}")]
    Incomplete(&'static str),
    #[error("unable to build email: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("notification delivery interrupted: {0}")]
    Interrupted(String),
}

/// SMTP account used to deliver notifications.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub password: String,
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sends notifications over implicit-TLS SMTP, logging in as the sender.
#[derive(Clone)]
pub struct EmailNotifier {
    sender: Mailbox,
    recipients: Vec<Mailbox>,
    transport: SmtpTransport,
}

impl EmailNotifier {
    pub fn new(settings: &EmailSettings) -> Result<Self, NotifyError> {
        if settings.recipients.is_empty() {
            return Err(NotifyError::Incomplete("at least one recipient is required"));
        }

        let sender = parse_mailbox(&settings.sender)?;
        let recipients = settings
            .recipients
            .iter()
            .map(|address| parse_mailbox(address))
            .collect::<Result<Vec<_>, _>>()?;

        let credentials = Credentials::new(settings.sender.clone(), settings.password.clone());
        let transport = SmtpTransport::relay(&settings.smtp_host)?
            .credentials(credentials)
            .build();

        Ok(Self {
            sender,
            recipients,
            transport,
        })
    }

    fn build_message(&self, message: &NotificationMessage) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }
        Ok(builder.body(message.body.clone())?)
    }
}

impl Notifier for EmailNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        let email = self.build_message(message)?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|err| NotifyError::Interrupted(err.to_string()))??;

        info!(recipients = self.recipients.len(), "notification email sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|source| NotifyError::Address {
            address: address.to_string(),
            source,
        })
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        info!(subject = %message.subject, body = %message.body, "notification (log only)");
        Ok(())
    }
}

/// Delivery channel chosen at startup.
#[derive(Clone)]
pub enum DeliveryChannel {
    Email(Box<EmailNotifier>),
    Log(LogNotifier),
}

impl DeliveryChannel {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryChannel::Email(_) => "email",
            DeliveryChannel::Log(_) => "log",
        }
    }
}

impl Notifier for DeliveryChannel {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        match self {
            DeliveryChannel::Email(notifier) => notifier.send(message).await,
            DeliveryChannel::Log(notifier) => notifier.send(message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::domain::LocationId;
    use crate::watch::policy::PayloadScope;

    fn settings() -> EmailSettings {
        EmailSettings {
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            sender: "watcher@example.com".to_string(),
            recipients: vec!["me@example.com".to_string(), "partner@example.com".to_string()],
            password: "app-password".to_string(),
        }
    }

    #[test]
    fn render_substitutes_location_name_and_joins_slots() {
        let mut directory = LocationDirectory::default();
        directory.insert(LocationId::from(5140), "JFK International Global Entry EC");
        let payload = NotificationPayload {
            location: LocationId::from(5140),
            scope: PayloadScope::NewlyAppeared,
            slots: vec![
                "Monday, January 05 @ 09:15AM".to_string(),
                "Tuesday, January 06 @ 10:00AM".to_string(),
            ],
        };

        let message = NotificationMessage::render(&payload, &directory);

        assert_eq!(message.subject, NOTIFICATION_SUBJECT);
        assert_eq!(
            message.body,
            "Found new appointment(s) in location JFK International Global Entry EC on \
             Monday, January 05 @ 09:15AM\nTuesday, January 06 @ 10:00AM!"
        );
    }

    #[test]
    fn email_notifier_rejects_bad_addresses() {
        let mut bad = settings();
        bad.recipients.push("not an address".to_string());

        match EmailNotifier::new(&bad) {
            Err(NotifyError::Address { address, .. }) => assert_eq!(address, "not an address"),
            Err(other) => panic!("expected address error, got {other:?}"),
            Ok(_) => panic!("expected address error"),
        }
    }

    #[test]
    fn email_notifier_requires_recipients() {
        let mut empty = settings();
        empty.recipients.clear();
        assert!(matches!(
            EmailNotifier::new(&empty),
            Err(NotifyError::Incomplete(_))
        ));
    }

    #[test]
    fn email_message_addresses_every_recipient() {
        let notifier = EmailNotifier::new(&settings()).expect("notifier builds");
        let message = NotificationMessage {
            subject: NOTIFICATION_SUBJECT.to_string(),
            body: "Found new appointment(s)".to_string(),
        };

        let email = notifier.build_message(&message).expect("message builds");
        let envelope = email.envelope();

        assert_eq!(envelope.to().len(), 2);
        assert_eq!(
            envelope.from().map(|address| address.to_string()),
            Some("watcher@example.com".to_string())
        );
    }

    #[test]
    fn settings_debug_redacts_password() {
        let rendered = format!("{:?}", settings());
        assert!(!rendered.contains("app-password"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let message = NotificationMessage {
            subject: NOTIFICATION_SUBJECT.to_string(),
            body: "body".to_string(),
        };
        DeliveryChannel::Log(LogNotifier)
            .send(&message)
            .await
            .expect("log delivery succeeds");
    }
}
