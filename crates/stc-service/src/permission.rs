//! Caller authorization for the command channel.

use crate::command::CommandId;

/// Numeric identity of a calling process.
pub type CallerUid = u32;

pub const UID_ROOT: CallerUid = 0;
pub const UID_SYSTEM: CallerUid = 1000;
pub const UID_GRAPHICS: CallerUid = 1003;
pub const UID_MEDIA: CallerUid = 1013;
pub const UID_AUDIO: CallerUid = 1041;
pub const UID_MEDIA_CODEC: CallerUid = 1046;
pub const UID_CAMERASERVER: CallerUid = 1047;

/// Identities allowed to issue calibration commands.
pub const TRUSTED_CALLERS: [CallerUid; 7] = [
    UID_ROOT,
    UID_SYSTEM,
    UID_GRAPHICS,
    UID_MEDIA,
    UID_AUDIO,
    UID_MEDIA_CODEC,
    UID_CAMERASERVER,
];

/// Whether `caller` may issue the command with numeric `code`.
///
/// Client registration is reserved for the graphics identity.
pub fn is_authorized(code: u32, caller: CallerUid) -> bool {
    if code == CommandId::ConnectClient.code() {
        caller == UID_GRAPHICS
    } else {
        TRUSTED_CALLERS.contains(&caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_requires_graphics() {
        let connect = CommandId::ConnectClient.code();
        assert!(is_authorized(connect, UID_GRAPHICS));
        assert!(!is_authorized(connect, UID_SYSTEM));
        assert!(!is_authorized(connect, UID_ROOT));
    }

    #[test]
    fn test_trusted_set_for_other_commands() {
        let code = CommandId::SetGammaConfig.code();
        for uid in TRUSTED_CALLERS {
            assert!(is_authorized(code, uid), "uid {uid}");
        }
        assert!(!is_authorized(code, 10_057));
        assert!(!is_authorized(0x80, 2000));
    }
}
