//! Report delivery over an HTTP transactional-email API.
//!
//! One JSON POST per report, `api-key` header auth, no retry. Any
//! transport failure or non-2xx response is a `ReportError::Delivery`.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::ReportSummary;
use crate::config::EmailConfig;
use crate::types::ReportError;

#[derive(Debug, Serialize, PartialEq)]
struct Sender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
struct Recipient<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    sender: Sender<'a>,
    to: Vec<Recipient<'a>>,
    subject: &'a str,
    html_content: &'a str,
    text_content: String,
}

/// Sends rendered reports to the configured recipients.
pub struct ReportMailer {
    http: Client,
    api_url: String,
    api_key: SecretString,
    sender_email: String,
    sender_name: String,
    recipients: Vec<String>,
}

impl ReportMailer {
    pub fn new(
        config: &EmailConfig,
        api_key: SecretString,
        timeout: Option<Duration>,
    ) -> Result<Self, ReportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ReportError::Delivery(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key,
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
            recipients: config.recipient_emails.clone(),
        })
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    fn payload<'a>(
        &'a self,
        subject: &'a str,
        html: &'a str,
        summary: &ReportSummary,
    ) -> Payload<'a> {
        Payload {
            sender: Sender {
                name: &self.sender_name,
                email: &self.sender_email,
            },
            to: self
                .recipients
                .iter()
                .map(|email| Recipient {
                    email: email.as_str(),
                })
                .collect(),
            subject,
            html_content: html,
            text_content: plain_text(summary),
        }
    }

    /// Deliver one report.
    pub async fn send(
        &self,
        subject: &str,
        html: &str,
        summary: &ReportSummary,
    ) -> Result<(), ReportError> {
        let payload = self.payload(subject, html, summary);
        debug!(url = %self.api_url, recipients = self.recipients.len(), "Sending report");

        let resp = self
            .http
            .post(&self.api_url)
            .header("api-key", self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| ReportError::Delivery(format!("Request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ReportError::Delivery(format!(
                "Email API returned HTTP {}: {body}",
                status.as_u16()
            )));
        }

        info!(recipients = ?self.recipients, "Report delivered");
        Ok(())
    }
}

/// Fallback body for clients that do not render HTML.
pub fn plain_text(summary: &ReportSummary) -> String {
    format!(
        "Daily Property Investment Report\n\n\
         Total Properties Analyzed: {}\n\
         Recommended Properties: {}\n\n\
         Please view this email in an HTML-capable email client for the full report.\n",
        summary.total, summary.yes
    )
}
