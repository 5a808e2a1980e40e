//! Derived values the view renders from.

use darkchat_proto::{DirectoryEntry, Identity, Message, MessageStatus};

/// Sender name the backend uses for the requesting user.
pub const SELF_SENDER: &str = "You";

/// Whether `message` was sent by the signed-in user.
///
/// Messages carry no sender id, only a display name. A message is mine when
/// the sender is the literal [`SELF_SENDER`], or when the first directory
/// entry whose user name equals the sender name is the signed-in user.
///
/// # Failure mode
///
/// When two directory entries share a user name, only the first one counts.
/// Messages from the second user are then shown as mine (if the first is
/// me) or mine are shown as theirs (if the second is me).
pub fn is_mine(message: &Message, identity: Option<&Identity>, directory: &[DirectoryEntry]) -> bool {
    if message.sender_display_name == SELF_SENDER {
        return true;
    }
    let Some(identity) = identity else {
        return false;
    };

    directory
        .iter()
        .find(|entry| entry.user_name == message.sender_display_name)
        .is_some_and(|entry| entry.user_id == identity.user_id)
}

/// Directory without the signed-in user, for the direct-chat picker.
pub fn others<'a>(directory: &'a [DirectoryEntry], identity: Option<&Identity>) -> Vec<&'a DirectoryEntry> {
    directory
        .iter()
        .filter(|entry| identity.is_none_or(|me| me.user_id != entry.user_id))
        .collect()
}

/// Delivery status inferred from the read receipts.
pub fn delivery_status(message: &Message) -> MessageStatus {
    if message.read_count() > 0 { MessageStatus::Read } else { MessageStatus::Sent }
}
