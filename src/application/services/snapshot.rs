use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::models::{GroupMember, RecipientSnapshot};

/// Freeze the group roster for one message. The sender's explicit choice
/// wins over the member's default; members reachable on no channel are
/// carried along but never as recipients.
pub fn snapshot_recipients(
    members: &[GroupMember],
    chosen: &HashMap<Uuid, bool>,
) -> Vec<RecipientSnapshot> {
    members
        .iter()
        .map(|member| {
            let included = chosen
                .get(&member.id)
                .copied()
                .unwrap_or(member.default_recipient);
            RecipientSnapshot {
                member_id: member.id,
                name: member.name.clone(),
                phone: member.phone.clone(),
                email: member.email.clone(),
                bridge_user_id: member.bridge_user_id.clone(),
                notes: member.notes.clone(),
                is_recipient: included && member.has_contact(),
            }
        })
        .collect()
}
