//! Conversion between ZapMeow's bare addresses and WhatsApp JIDs.
//!
//! ZapMeow reports senders and chats as bare numbers ("447906616842"), while
//! the rest of the system keys everything on the full JID
//! ("447906616842@s.whatsapp.net").

/// Domain suffix for one-to-one chats.
pub const INDIVIDUAL_SUFFIX: &str = "@s.whatsapp.net";

/// Domain suffix for group chats.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Phone numbers never exceed this many digits; anything longer is a group id.
const MAX_PHONE_DIGITS: usize = 15;

/// Reconstruct a full JID from a bare address.
///
/// Inputs that already carry a domain are returned unchanged, so the
/// function is safe to apply twice.
pub fn to_jid(bare: &str) -> String {
    if bare.contains('@') {
        return bare.to_string();
    }
    if bare.len() > MAX_PHONE_DIGITS {
        format!("{}{}", bare, GROUP_SUFFIX)
    } else {
        format!("{}{}", bare, INDIVIDUAL_SUFFIX)
    }
}

/// Local part of a JID (everything before the first `@`).
pub fn bare_address(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}

pub fn is_group_jid(jid: &str) -> bool {
    jid.ends_with(GROUP_SUFFIX)
}

/// True for any JID in the WhatsApp address space (group or individual).
pub fn is_whatsapp_jid(jid: &str) -> bool {
    jid.ends_with(GROUP_SUFFIX) || jid.ends_with(INDIVIDUAL_SUFFIX)
}
