//! Discord webhook notification manager
//!
//! Sends notifications to Discord via webhooks for backup events.

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{NotificationConfig, NotifyEvent};

/// Notification manager for sending Discord webhooks
pub struct NotificationManager {
    config: NotificationConfig,
}

/// Discord embed color codes (decimal)
#[derive(Debug, Clone, Copy)]
pub enum NotificationColor {
    /// Red - for failures
    Failure = 15158332,    // #E74C3C
    /// Green - for success
    Success = 3066993,     // #2ECC71
}

impl NotificationColor {
    fn as_decimal(&self) -> u32 {
        *self as u32
    }
}

/// Notification payload to send
#[derive(Debug, Clone)]
pub struct Notification {
    pub event_type: NotifyEvent,
    /// Job or log set the event is about ("run" for whole-run summaries)
    pub subject: String,
    pub message: String,
    pub error: Option<String>,
    pub duration_secs: Option<u64>,
}

/// Discord webhook payload
#[derive(Debug, Serialize)]
struct DiscordPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<DiscordField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<DiscordFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct DiscordField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct DiscordFooter {
    text: String,
}

impl NotificationManager {
    /// Create a new notification manager
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    /// Check if notifications are enabled for an event type
    pub fn is_enabled(&self, event: &NotifyEvent) -> bool {
        if self.config.discord_webhook_url.is_empty() {
            return false;
        }
        self.config.notify_on.contains(event)
    }

    /// Send a notification if enabled
    pub fn send(&self, notification: Notification) -> Result<()> {
        if !self.is_enabled(&notification.event_type) {
            debug!(
                "Notification type {:?} not enabled, skipping",
                notification.event_type
            );
            return Ok(());
        }

        let payload = self.build_payload(&notification);
        self.send_webhook(&payload)?;

        info!(
            "Sent {:?} notification for '{}'",
            notification.event_type, notification.subject
        );

        Ok(())
    }

    /// Send a failure notification
    pub fn send_failure(&self, subject: &str, error: &str, duration_secs: Option<u64>) -> Result<()> {
        self.send(Notification {
            event_type: NotifyEvent::Failure,
            subject: subject.to_string(),
            message: format!("Backup failed for '{}'", subject),
            error: Some(error.to_string()),
            duration_secs,
        })
    }

    /// Send a success notification
    pub fn send_success(&self, subject: &str, message: &str, duration_secs: u64) -> Result<()> {
        self.send(Notification {
            event_type: NotifyEvent::Success,
            subject: subject.to_string(),
            message: message.to_string(),
            error: None,
            duration_secs: Some(duration_secs),
        })
    }

    /// Build Discord webhook payload
    fn build_payload(&self, notification: &Notification) -> DiscordPayload {
        let (color, emoji) = match notification.event_type {
            NotifyEvent::Failure => (NotificationColor::Failure, "\u{274C}"), // Red X
            NotifyEvent::Success => (NotificationColor::Success, "\u{2705}"), // Green check
        };

        let title = format!("{} Bucket Backup: {:?}", emoji, notification.event_type);

        let mut fields = vec![DiscordField {
            name: "Subject".to_string(),
            value: notification.subject.clone(),
            inline: true,
        }];

        if let Some(duration) = notification.duration_secs {
            fields.push(DiscordField {
                name: "Duration".to_string(),
                value: format_duration(duration),
                inline: true,
            });
        }

        if let Some(ref error) = notification.error {
            // Discord rejects overly long field values
            let error_display = if error.chars().count() > 500 {
                format!("{}...", error.chars().take(497).collect::<String>())
            } else {
                error.clone()
            };
            fields.push(DiscordField {
                name: "Error".to_string(),
                value: format!("```\n{}\n```", error_display),
                inline: false,
            });
        }

        let timestamp = Some(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string());

        let embed = DiscordEmbed {
            title,
            description: Some(notification.message.clone()),
            color: color.as_decimal(),
            fields,
            footer: Some(DiscordFooter {
                text: hostname_footer(),
            }),
            timestamp,
        };

        DiscordPayload {
            username: Some("Bucket Backup".to_string()),
            embeds: vec![embed],
        }
    }

    /// Send webhook to Discord
    fn send_webhook(&self, payload: &DiscordPayload) -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .post(&self.config.discord_webhook_url)
            .json(payload)
            .send()
            .context("Failed to send Discord webhook")?;

        let status = response.status();
        if status.is_success() {
            debug!("Discord webhook sent successfully");
            Ok(())
        } else {
            let body = response.text().unwrap_or_default();
            error!("Discord webhook failed with status {}: {}", status, body);
            anyhow::bail!("Discord webhook failed with status {}: {}", status, body)
        }
    }
}

/// Footer text naming the host the run happened on
fn hostname_footer() -> String {
    match std::env::var("HOSTNAME") {
        Ok(host) if !host.is_empty() => format!("bucket-backup @ {}", host),
        _ => "bucket-backup".to_string(),
    }
}

/// Format duration in human-readable form
fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        let minutes = seconds / 60;
        let secs = seconds % 60;
        if secs == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m {}s", minutes, secs)
        }
    } else {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, minutes)
        }
    }
}
