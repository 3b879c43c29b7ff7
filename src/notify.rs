//! Push notification surface.
//!
//! No producer in this codebase sends pushes yet; the surface exists
//! so a push payload becomes a well-formed notification with `view`
//! and `dismiss` actions, and a click on `view` opens the site root.

use serde::Serialize;

const NOTIFICATION_TITLE: &str = "Nico Küchler Portfolio";
const NOTIFICATION_TAG: &str = "portfolio-notification";
const NOTIFICATION_ICON: &str = "/nklogo.webp";
const DEFAULT_BODY: &str = "Neue Nachricht vom Portfolio";

#[derive(Debug, Clone, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
}

/// Build the notification for a push payload; the payload text becomes
/// the body when present.
pub fn build_notification(payload: Option<&str>) -> Notification {
    Notification {
        title: NOTIFICATION_TITLE.to_string(),
        body: payload.unwrap_or(DEFAULT_BODY).to_string(),
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_ICON.to_string(),
        tag: NOTIFICATION_TAG.to_string(),
        require_interaction: true,
        actions: vec![
            NotificationAction {
                action: "view".to_string(),
                title: "Ansehen".to_string(),
                icon: Some(NOTIFICATION_ICON.to_string()),
            },
            NotificationAction {
                action: "dismiss".to_string(),
                title: "Schließen".to_string(),
                icon: None,
            },
        ],
    }
}

/// What a notification click resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Open this path in a client window.
    Open(String),
    /// Close the notification, nothing else.
    Dismissed,
}

pub fn handle_click(action: &str) -> ClickOutcome {
    match action {
        "view" => ClickOutcome::Open("/".to_string()),
        _ => ClickOutcome::Dismissed,
    }
}
