use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail delivery to `{to}` failed: {reason}")]
    Delivery { to: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "mail delivery (simulated)");
        Ok(())
    }
}

pub fn invitation_mail(
    to: &str,
    link: &str,
    projects: &str,
    message: Option<&str>,
) -> OutgoingMail {
    let mut body = format!(
        "You have been invited to collaborate on: {projects}\n\n\
         To accept this invitation and create your account, visit:\n{link}\n\n\
         This invitation link expires in 24 hours.\n"
    );
    if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
        body.push_str(&format!("\nMessage from the administrator:\n{message}\n"));
    }
    OutgoingMail {
        to: to.to_string(),
        subject: format!("Project collaboration invitation - {projects}"),
        body,
    }
}

pub fn access_granted_mail(
    to: &str,
    name: &str,
    projects: &str,
    message: Option<&str>,
    login_url: &str,
) -> OutgoingMail {
    let mut body = format!(
        "Hello {name},\n\nYou have been granted access to: {projects}\n\
         Log in to start working on them:\n{login_url}\n"
    );
    if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
        body.push_str(&format!("\nMessage from the administrator:\n{message}\n"));
    }
    OutgoingMail {
        to: to.to_string(),
        subject: format!("Project access granted - {projects}"),
        body,
    }
}

pub fn welcome_mail(to: &str, name: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Your account is ready".to_string(),
        body: format!("Hello {name},\n\nYour account has been created. You can now log in.\n"),
    }
}

pub fn role_changed_mail(to: &str, name: &str, old_role: &str, new_role: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Your role has been updated".to_string(),
        body: format!("Hello {name},\n\nYour role has changed from {old_role} to {new_role}.\n"),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_mail_carries_link_and_message() {
        let mail = invitation_mail("new@x.com", "http://h/accept?token=t", "good", Some("welcome"));
        assert!(mail.body.contains("http://h/accept?token=t"));
        assert!(mail.body.contains("welcome"));
        assert!(mail.subject.ends_with("good"));
    }

    #[test]
    fn test_blank_message_is_omitted() {
        let mail = access_granted_mail("a@x.com", "A", "good", Some("  "), "http://h/login");
        assert!(!mail.body.contains("administrator"));
    }
}
