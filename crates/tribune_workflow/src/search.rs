//! Locating messages in a fetched listing.

use tribune_discord::Message;
use tribune_error::{WorkflowError, WorkflowErrorKind, WorkflowResult};

/// First message satisfying `predicate`. Listings are newest first, so this is
/// the newest match.
///
/// # Errors
///
/// [`WorkflowErrorKind::MessageNotFound`] naming `description` when nothing matches.
pub fn find_message<'a, P>(
    messages: &'a [Message],
    description: &str,
    predicate: P,
) -> WorkflowResult<&'a Message>
where
    P: Fn(&Message) -> bool,
{
    messages
        .iter()
        .find(|m| predicate(m))
        .ok_or_else(|| WorkflowError::new(WorkflowErrorKind::MessageNotFound(description.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tribune_discord::User;

    fn message(id: &str, author: &str, content: &str) -> Message {
        Message::builder()
            .id(id)
            .author(User::with_id(author))
            .content(content)
            .build()
            .unwrap()
    }

    #[test]
    fn test_returns_first_match() {
        let messages = vec![
            message("3", "500", "newest"),
            message("2", "600", "middle"),
            message("1", "500", "oldest"),
        ];
        let found = find_message(&messages, "operator message", |m| m.is_authored_by("500")).unwrap();
        assert_eq!(found.id(), "3");
    }

    #[test]
    fn test_reports_description_when_missing() {
        let messages = vec![message("1", "600", "hello")];
        let err = find_message(&messages, "pin notice", |m| m.is_authored_by("500")).unwrap_err();
        match err.kind() {
            WorkflowErrorKind::MessageNotFound(what) => assert_eq!(what, "pin notice"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
