/// Outbound account emails
///
/// Services never wait on delivery: [`dispatch`] spawns the send on the
/// runtime and logs the outcome. A failed email never fails the request that
/// triggered it; users can always ask for another one.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Error type for notification delivery
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Request never reached the provider or its response was unreadable
    #[error("Notification transport failed: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("Notification rejected (status={status}): {body}")]
    Rejected { status: u16, body: String },
}

/// What a message is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Verification,
    PasswordReset,
}

/// Builds the frontend links embedded in emails
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    frontend_url: String,
}

impl LinkBuilder {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        let frontend_url = frontend_url.into();
        Self {
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{frontend}/verify-email/{token}`
    pub fn verification(&self, token: &str) -> String {
        format!("{}/verify-email/{}", self.frontend_url, token)
    }

    /// `{frontend}/reset-password?token={token}`
    pub fn password_reset(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    pub fn for_kind(&self, kind: NotificationKind, token: &str) -> String {
        match kind {
            NotificationKind::Verification => self.verification(token),
            NotificationKind::PasswordReset => self.password_reset(token),
        }
    }
}

/// Email transport
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), NotifyError>;

    async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), NotifyError>;
}

/// Sends in the background; errors are logged and dropped
pub fn dispatch(notifier: Arc<dyn Notifier>, kind: NotificationKind, to: String, link: String) {
    tokio::spawn(async move {
        let result = match kind {
            NotificationKind::Verification => notifier.send_verification(&to, &link).await,
            NotificationKind::PasswordReset => notifier.send_password_reset(&to, &link).await,
        };

        match result {
            Ok(()) => info!(?kind, "Notification sent"),
            Err(e) => error!(?kind, error = %e, "Notification failed"),
        }
    });
}

/// Development transport: writes the link to the log instead of mailing it
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), NotifyError> {
        info!(to, link, "Verification email (log only)");
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), NotifyError> {
        info!(to, link, "Password reset email (log only)");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
    text: String,
}

/// Resend HTTP API transport
#[derive(Debug, Clone)]
pub struct ResendNotifier {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendNotifier {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }

    async fn send(&self, to: &str, subject: &str, html: String, text: String) -> Result<(), NotifyError> {
        let body = ResendEmail {
            from: &self.from,
            to: [to],
            subject,
            html,
            text,
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn send_verification(&self, to: &str, link: &str) -> Result<(), NotifyError> {
        let (html, text) = render(
            "Confirme seu email",
            "Obrigado por se cadastrar no HolisticMatch. Clique no link abaixo para ativar sua conta. O link expira em 24 horas.",
            link,
        );
        self.send(to, "Confirme seu email - HolisticMatch", html, text).await
    }

    async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), NotifyError> {
        let (html, text) = render(
            "Redefinição de senha",
            "Recebemos um pedido para redefinir sua senha. Se não foi você, ignore este email. O link expira em 24 horas.",
            link,
        );
        self.send(to, "Redefinição de senha - HolisticMatch", html, text).await
    }
}

fn render(title: &str, body: &str, link: &str) -> (String, String) {
    let html = format!(
        "<h2>{title}</h2><p>{body}</p><p><a href=\"{link}\">{link}</a></p>",
        title = title,
        body = body,
        link = link
    );
    let text = format!("{}\n\n{}\n\n{}", title, body, link);

    (html, text)
}
