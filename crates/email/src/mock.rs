//! Mock Email Service Implementation
//!
//! Provides in-memory email capture for testing without external dependencies.
//! Integration tests use it to assert on pledge confirmations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{EmailError, EmailMessage, EmailReceipt, EmailService};

/// Email captured by the mock service
#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub message: EmailMessage,
    pub receipt: EmailReceipt,
    pub captured_at: DateTime<Utc>,
}

impl CapturedEmail {
    /// Pledge id recorded in the message metadata
    pub fn pledge_id(&self) -> Option<Uuid> {
        self.message
            .metadata
            .get("pledge_id")
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}

#[derive(Debug, Default)]
struct Outbox {
    emails: Vec<CapturedEmail>,
    by_recipient: HashMap<String, Vec<CapturedEmail>>,
}

/// Mock email service for testing
#[derive(Debug, Clone)]
pub struct MockEmailService {
    outbox: Arc<Mutex<Outbox>>,
    enabled: bool,
    failing: bool,
    default_from: String,
    app_base_url: String,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self {
            outbox: Arc::new(Mutex::new(Outbox::default())),
            enabled: true,
            failing: false,
            default_from: "pledges@crowdfund.app".to_string(),
            app_base_url: "http://localhost:3000".to_string(),
        }
    }

    /// Create a disabled mock email service (for testing)
    pub fn new_disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// A service whose every send fails, for exercising error paths
    pub fn new_failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    // A poisoned lock only means another test thread panicked mid-send.
    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_all_emails(&self) -> Vec<CapturedEmail> {
        self.outbox().emails.clone()
    }

    pub fn get_emails_for_recipient(&self, email: &str) -> Vec<CapturedEmail> {
        self.outbox()
            .by_recipient
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    /// Confirmation emails sent for one pledge
    pub fn get_pledge_confirmations(&self, pledge_id: Uuid) -> Vec<CapturedEmail> {
        self.outbox()
            .emails
            .iter()
            .filter(|e| e.pledge_id() == Some(pledge_id))
            .cloned()
            .collect()
    }

    pub fn email_count(&self) -> usize {
        self.outbox().emails.len()
    }

    pub fn clear(&self) {
        let mut outbox = self.outbox();
        outbox.emails.clear();
        outbox.by_recipient.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        if self.failing {
            return Err(EmailError::AwsSes("mock delivery failure".to_string()));
        }

        if !self.enabled {
            tracing::warn!("Mock email service disabled, skipping send");
            return Ok(EmailReceipt {
                message_id: format!("disabled-{}", Uuid::new_v4()),
                sent_at: Utc::now(),
                provider: "mock-disabled".to_string(),
                metadata: message.metadata.clone(),
            });
        }

        tracing::info!(to = %message.to, "Mock email service capturing email");

        let receipt = EmailReceipt {
            message_id: format!("mock-{}", Uuid::new_v4()),
            sent_at: Utc::now(),
            provider: "mock".to_string(),
            metadata: message.metadata.clone(),
        };

        let captured = CapturedEmail {
            message: message.clone(),
            receipt: receipt.clone(),
            captured_at: Utc::now(),
        };

        let mut outbox = self.outbox();
        outbox.emails.push(captured.clone());
        outbox
            .by_recipient
            .entry(message.to)
            .or_default()
            .push(captured);

        Ok(receipt)
    }

    fn default_from(&self) -> String {
        self.default_from.clone()
    }

    fn app_base_url(&self) -> &str {
        &self.app_base_url
    }
}
