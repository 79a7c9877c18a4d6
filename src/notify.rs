//! Out-of-band delivery of verification links and two-factor codes.

use anyhow::Context;
use axum::async_trait;
use tracing::{info, instrument};
use url::Url;

use crate::users::User;

/// A composed email, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_verification(&self, user: &User, token: &str) -> anyhow::Result<()>;
    async fn send_two_factor_code(&self, user: &User, code: &str) -> anyhow::Result<()>;
}

/// Builds message bodies from account data.
#[derive(Debug, Clone)]
pub struct Templates {
    public_base_url: String,
    code_ttl_minutes: i64,
}

impl Templates {
    pub fn new(public_base_url: impl Into<String>, code_ttl_minutes: i64) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            code_ttl_minutes,
        }
    }

    pub fn verification_link(&self, email: &str, token: &str) -> anyhow::Result<Url> {
        let base = self.public_base_url.trim_end_matches('/');
        Url::parse_with_params(
            &format!("{base}/auth/verify-email"),
            &[("token", token), ("email", email)],
        )
        .context("build verification link")
    }

    pub fn verification(&self, user: &User, token: &str) -> anyhow::Result<Message> {
        let link = self.verification_link(&user.email, token)?;
        Ok(Message {
            to: user.email.clone(),
            subject: "Movie Watchlist - Email Verification".into(),
            html: format!(
                "<h1>Hello {name}!</h1>\
                 <p>Please click the link below to verify your email address:</p>\
                 <a href=\"{link}\">Verify Email</a>\
                 <p>If you didn't create an account, you can safely ignore this email.</p>",
                name = escape_html(&user.name),
            ),
        })
    }

    pub fn two_factor_code(&self, user: &User, code: &str) -> Message {
        Message {
            to: user.email.clone(),
            subject: "Movie Watchlist - Two-Factor Authentication Code".into(),
            html: format!(
                "<h1>Hello {name}!</h1>\
                 <p>Your two-factor authentication code is:</p>\
                 <h2>{code}</h2>\
                 <p>This code will expire in {ttl} minutes.</p>\
                 <p>If you didn't request this code, please ignore this email.</p>",
                name = escape_html(&user.name),
                ttl = self.code_ttl_minutes,
            ),
        }
    }
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Records outgoing mail in the log instead of handing it to a mail server.
/// Only recipient and subject are logged; bodies carry codes and tokens.
pub struct LogNotifier {
    templates: Templates,
}

impl LogNotifier {
    pub fn new(templates: Templates) -> Self {
        Self { templates }
    }

    fn deliver(&self, msg: Message) {
        info!(to = %msg.to, subject = %msg.subject, "outgoing email");
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    #[instrument(skip(self, user, token), fields(user_id = %user.id))]
    async fn send_verification(&self, user: &User, token: &str) -> anyhow::Result<()> {
        let msg = self.templates.verification(user, token)?;
        self.deliver(msg);
        Ok(())
    }

    #[instrument(skip(self, user, code), fields(user_id = %user.id))]
    async fn send_two_factor_code(&self, user: &User, code: &str) -> anyhow::Result<()> {
        let msg = self.templates.two_factor_code(user, code);
        self.deliver(msg);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::users::Role;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            email: "a+b@x.com".into(),
            name: "<Ann>".into(),
            password_hash: String::new(),
            role: Role::User,
            is_email_verified: false,
            email_verification_token: None,
            two_factor: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn verification_link_encodes_query() {
        let t = Templates::new("http://localhost:3000/", 10);
        let link = t.verification_link("a+b@x.com", "abc-123").unwrap();
        assert_eq!(link.path(), "/auth/verify-email");
        let pairs: Vec<(String, String)> = link.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("token".to_string(), "abc-123".to_string()),
                ("email".to_string(), "a+b@x.com".to_string()),
            ]
        );
    }

    #[test]
    fn messages_escape_names_and_mention_expiry() {
        let t = Templates::new("http://localhost:3000", 10);
        let msg = t.two_factor_code(&user(), "123456");
        assert_eq!(msg.to, "a+b@x.com");
        assert!(msg.html.contains("123456"));
        assert!(msg.html.contains("10 minutes"));
        assert!(msg.html.contains("&lt;Ann&gt;"));

        let msg = t.verification(&user(), "tok").unwrap();
        assert!(msg.html.contains("token=tok"));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn log_notifier_never_logs_codes_or_tokens() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let notifier = LogNotifier::new(Templates::new("http://localhost:3000", 10));
        notifier.send_two_factor_code(&user(), "482913").await.unwrap();
        notifier
            .send_verification(&user(), "secret-verif-token")
            .await
            .unwrap();

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("outgoing email"));
        assert!(logs.contains("a+b@x.com"));
        assert!(!logs.contains("482913"));
        assert!(!logs.contains("secret-verif-token"));
    }
}
