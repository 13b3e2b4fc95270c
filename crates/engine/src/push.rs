//! Push payload dispatch and notification-click routing.
//!
//! The engine only handles delivery: an inbound payload becomes a
//! display intent for the host's notification facility, and a click on
//! a displayed notification becomes a navigation intent. Rendering is
//! the host's concern.

use serde::Deserialize;

/// Icon shown on every notification.
pub const NOTIFICATION_ICON: &str = "/icons/notify-192.png";
/// Badge for platforms that render one.
pub const NOTIFICATION_BADGE: &str = "/icons/badge-72.png";

const DEFAULT_LOCATION: &str = "/";

/// Wire schema of an inbound push payload.
#[derive(Debug, Deserialize)]
struct PushPayload {
    title: String,
    body: String,
    id: String,
    #[serde(default)]
    actions: Vec<PushAction>,
}

#[derive(Debug, Deserialize)]
struct PushAction {
    id: String,
    #[serde(default)]
    title: Option<String>,
}

/// A display request for the host's notification facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Correlation data retained for click routing.
    pub correlation: String,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub id: String,
    pub title: String,
}

/// Where the host should take the user after a notification click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Focus an already-open client view at this location, or open a
    /// new one if none exists.
    FocusOrOpen(String),
    /// Open a new client view at this location.
    Open(String),
}

/// Convert an inbound push payload into a display intent.
///
/// Missing or malformed payloads are a silent no-op: nothing is shown
/// and nothing is reported upward.
pub fn on_push(payload: &[u8]) -> Option<NotificationIntent> {
    if payload.is_empty() {
        return None;
    }

    let parsed: PushPayload = match serde_json::from_slice(payload) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("ignoring malformed push payload: {e}");
            return None;
        }
    };

    Some(NotificationIntent {
        title: parsed.title,
        body: parsed.body,
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_BADGE.to_string(),
        correlation: parsed.id,
        actions: parsed
            .actions
            .into_iter()
            .map(|a| {
                let title = a.title.unwrap_or_else(|| a.id.clone());
                NotificationAction { id: a.id, title }
            })
            .collect(),
    })
}

/// Route a notification click.
///
/// Without a chosen action the user lands at the default location,
/// reusing an open view when one exists. Known action ids map through a
/// fixed table; unrecognized ids are ignored.
pub fn on_interaction(action: Option<&str>, correlation: &str) -> Option<Navigation> {
    match action {
        None => Some(Navigation::FocusOrOpen(DEFAULT_LOCATION.to_string())),
        Some("open-book") => Some(Navigation::Open(format!("/book/{correlation}"))),
        Some("open-community") => Some(Navigation::Open(format!("/community/{correlation}"))),
        Some(other) => {
            tracing::debug!("ignoring unknown notification action '{other}'");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_is_noop() {
        assert!(on_push(b"").is_none());
    }

    #[test]
    fn test_empty_object_is_noop() {
        assert!(on_push(b"{}").is_none());
    }

    #[test]
    fn test_malformed_json_is_noop() {
        assert!(on_push(b"not json at all").is_none());
    }

    #[test]
    fn test_missing_fields_are_noop() {
        assert!(on_push(br#"{"title":"T"}"#).is_none());
        assert!(on_push(br#"{"title":"T","body":"B"}"#).is_none());
    }

    #[test]
    fn test_valid_payload_carries_correlation() {
        let intent = on_push(br#"{"title":"T","body":"B","id":"42"}"#).unwrap();
        assert_eq!(intent.title, "T");
        assert_eq!(intent.body, "B");
        assert_eq!(intent.correlation, "42");
        assert_eq!(intent.icon, NOTIFICATION_ICON);
        assert!(intent.actions.is_empty());
    }

    #[test]
    fn test_actions_mapped_with_title_fallback() {
        let intent = on_push(
            br#"{"title":"T","body":"B","id":"42","actions":[{"id":"open-book","title":"Open"},{"id":"open-community"}]}"#,
        )
        .unwrap();
        assert_eq!(intent.actions.len(), 2);
        assert_eq!(intent.actions[0].id, "open-book");
        assert_eq!(intent.actions[0].title, "Open");
        assert_eq!(intent.actions[1].title, "open-community");
    }

    #[test]
    fn test_click_without_action_focuses_default_location() {
        let nav = on_interaction(None, "42");
        assert_eq!(nav, Some(Navigation::FocusOrOpen("/".to_string())));
    }

    #[test]
    fn test_click_routes_known_actions() {
        assert_eq!(
            on_interaction(Some("open-book"), "42"),
            Some(Navigation::Open("/book/42".to_string()))
        );
        assert_eq!(
            on_interaction(Some("open-community"), "7"),
            Some(Navigation::Open("/community/7".to_string()))
        );
    }

    #[test]
    fn test_unknown_action_is_noop() {
        assert!(on_interaction(Some("dismiss"), "42").is_none());
        assert!(on_interaction(Some(""), "42").is_none());
    }
}
