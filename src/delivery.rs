//! Delivery of the finished digest through the Mailgun messages API.
//!
//! Delivery runs after the artifact is on disk. A failure here is reported
//! but never removes or rebuilds the artifact.

use crate::config::Settings;
use crate::error::DeliveryError;
use crate::outputs::epub::MEDIA_TYPE;
use crate::utils::{format_clock, truncate_for_log};
use chrono::{DateTime, Local};
use itertools::Itertools;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tracing::{info, instrument};

/// One outgoing digest email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub text: String,
    pub html: String,
    /// Recipients, deduplicated, in first-seen order.
    pub to: Vec<String>,
}

impl Message {
    /// Build the message for a digest built at `built_at`.
    ///
    /// Recipients are trimmed; blanks and repeats are dropped.
    pub fn for_digest(built_at: &DateTime<Local>, recipients: &[String]) -> Self {
        let stamp = format_clock(built_at);
        Self {
            subject: format!("News Update ({stamp})"),
            text: format!("Your news update for {stamp}."),
            html: format!("<p>Your news update for {stamp}.</p>"),
            to: recipients
                .iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unique()
                .collect(),
        }
    }
}

/// Send `artifact` to every recipient of `message`.
///
/// The artifact goes out as a single attachment on one Mailgun request; the
/// file itself is left untouched.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `settings` - Supplies the Mailgun endpoint, domain, sender and API key
/// * `message` - Subject, bodies and recipients
/// * `artifact` - Path of the written EPUB
///
/// # Errors
///
/// Returns an error if:
/// - The artifact cannot be read ([`DeliveryError::Attachment`])
/// - The request cannot be built or sent ([`DeliveryError::Request`])
/// - Mailgun answers with a non-2xx status ([`DeliveryError::Status`])
#[instrument(level = "info", skip_all, fields(artifact = %artifact.display(), recipients = message.to.len()))]
pub async fn send_digest(
    client: &reqwest::Client,
    settings: &Settings,
    message: &Message,
    artifact: &Path,
) -> Result<(), DeliveryError> {
    let bytes = tokio::fs::read(artifact)
        .await
        .map_err(|source| DeliveryError::Attachment {
            path: artifact.to_path_buf(),
            source,
        })?;
    let file_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "news_update.epub".to_string());

    let attachment = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(MEDIA_TYPE)
        .map_err(|e| DeliveryError::Request(e.to_string()))?;

    let mut form = Form::new()
        .text("from", settings.mailgun_from.clone())
        .text("subject", message.subject.clone())
        .text("text", message.text.clone())
        .text("html", message.html.clone());
    for recipient in &message.to {
        form = form.text("to", recipient.clone());
    }
    form = form.part("attachment", attachment);

    let url = format!(
        "{}/{}/messages",
        settings.endpoints.mailgun, settings.mailgun_domain
    );
    let resp = client
        .post(&url)
        .basic_auth("api", Some(&settings.mailgun_api_key))
        .multipart(form)
        .send()
        .await
        .map_err(|e| DeliveryError::Request(e.to_string()))?;

    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(DeliveryError::Status {
            status: status.as_u16(),
            body,
        });
    }

    info!(status = status.as_u16(), response = %truncate_for_log(body.trim(), 200), "Digest delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn built_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap()
    }

    fn settings(server: &MockServer) -> Settings {
        let mut settings = Settings::default();
        settings.endpoints.mailgun = format!("{}/v3", server.uri());
        settings.mailgun_domain = "mg.example.com".to_string();
        settings.mailgun_from = "Digest <digest@mg.example.com>".to_string();
        settings.mailgun_api_key = "key-123".to_string();
        settings
    }

    #[test]
    fn test_message_wording_and_recipients() {
        let recipients = vec![
            "a@example.com".to_string(),
            " b@example.com ".to_string(),
            "a@example.com".to_string(),
            "".to_string(),
        ];
        let message = Message::for_digest(&built_at(), &recipients);

        assert_eq!(message.subject, "News Update (03/09, 07:05AM)");
        assert_eq!(message.text, "Your news update for 03/09, 07:05AM.");
        assert_eq!(message.to, vec!["a@example.com", "b@example.com"]);
    }

    #[tokio::test]
    async fn test_send_posts_multipart_with_attachment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mg.example.com/messages"))
            .and(header_exists("authorization"))
            .and(body_string_contains("News Update (03/09, 07:05AM)"))
            .and(body_string_contains("b@example.com"))
            .and(body_string_contains("application/epub+zip"))
            .and(body_string_contains("epub-bytes"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"message":"Queued"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("news_update_1.epub");
        std::fs::write(&artifact, "epub-bytes").unwrap();

        let message = Message::for_digest(
            &built_at(),
            &["a@example.com".to_string(), "b@example.com".to_string()],
        );
        send_digest(&reqwest::Client::new(), &settings(&server), &message, &artifact)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_delivery_reports_status_and_keeps_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("news_update_2.epub");
        std::fs::write(&artifact, "epub-bytes").unwrap();

        let message = Message::for_digest(&built_at(), &["a@example.com".to_string()]);
        let err = send_digest(&reqwest::Client::new(), &settings(&server), &message, &artifact)
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Status { status: 401, ref body } if body == "Forbidden"));
        assert!(artifact.exists());
    }

    #[tokio::test]
    async fn test_missing_artifact_is_attachment_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let message = Message::for_digest(&built_at(), &["a@example.com".to_string()]);

        let err = send_digest(
            &reqwest::Client::new(),
            &settings(&server),
            &message,
            &dir.path().join("missing.epub"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DeliveryError::Attachment { .. }));
    }
}
