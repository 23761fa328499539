use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_ATTACHMENT_LEN: usize = 255;

/// A conversation between an employer and a candidate about a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub job_id: Uuid,
    pub employer_id: Uuid,
    pub candidate_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Opens an active conversation between an employer and a candidate
    /// about one job.
    pub fn new(job_id: Uuid, employer_id: Uuid, candidate_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_id,
            employer_id,
            candidate_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A message must carry text, an attachment, or both.
    pub fn new(
        chat_id: Uuid,
        sender_id: Uuid,
        content: Option<String>,
        attachment: Option<String>,
    ) -> Result<Self> {
        let content = content.filter(|c| !c.trim().is_empty());
        let attachment = attachment.filter(|a| !a.trim().is_empty());
        if content.is_none() && attachment.is_none() {
            return Err(PaymentError::ValidationError(
                "Message needs content or an attachment".to_string(),
            ));
        }
        if let Some(attachment) = &attachment
            && attachment.chars().count() > MAX_ATTACHMENT_LEN
        {
            return Err(PaymentError::ValidationError(format!(
                "Attachment reference exceeds {} characters",
                MAX_ATTACHMENT_LEN
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            chat_id,
            sender_id,
            content,
            attachment,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chat_is_active() {
        let chat = Chat::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert!(chat.is_active);
        assert!(!chat.id.is_nil());
    }

    #[test]
    fn test_message_requires_a_body() {
        let chat = Uuid::new_v4();
        let sender = Uuid::new_v4();
        assert!(matches!(
            Message::new(chat, sender, None, Some("  ".to_string())),
            Err(PaymentError::ValidationError(_))
        ));
        let msg = Message::new(chat, sender, Some("hello".to_string()), None).unwrap();
        assert_eq!(msg.content.as_deref(), Some("hello"));
        assert!(msg.attachment.is_none());
    }

    #[test]
    fn test_message_attachment_length() {
        let long = "a".repeat(MAX_ATTACHMENT_LEN + 1);
        assert!(Message::new(Uuid::new_v4(), Uuid::new_v4(), None, Some(long)).is_err());
        let ok = "a".repeat(MAX_ATTACHMENT_LEN);
        assert!(Message::new(Uuid::new_v4(), Uuid::new_v4(), None, Some(ok)).is_ok());
    }
}
