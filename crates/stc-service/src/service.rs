//! OEM calibration service: authorizes callers, decodes parcels, and routes
//! commands to the connected engine.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use stc_core::error::{STATUS_INVALID, STATUS_NOT_CONNECTED};
use stc_core::{CommandChannel, CommandClient, ConnectError, EngineError};

use crate::command::{self, CommandId};
use crate::parcel::{Parcel, ParcelError};
use crate::permission::{self, CallerUid};

/// Status for codes outside the command range.
pub const STATUS_UNKNOWN_TRANSACTION: i32 = -74;

/// Errors surfaced to the caller of a transaction.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("transaction code {0:#x} is outside the command range")]
    UnknownTransaction(u32),

    #[error("no calibration client connected")]
    NoClient,

    #[error("malformed request: {0}")]
    Parcel(#[from] ParcelError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ServiceError {
    /// Integer status reported to the caller.
    pub const fn code(&self) -> i32 {
        match self {
            Self::UnknownTransaction(_) => STATUS_UNKNOWN_TRANSACTION,
            Self::NoClient => STATUS_NOT_CONNECTED,
            Self::Parcel(_) => STATUS_INVALID,
            Self::Engine(e) => e.code(),
        }
    }
}

/// Command-channel endpoint the engine registers with.
#[derive(Default)]
pub struct OemService {
    client: Mutex<Option<Weak<dyn CommandClient>>>,
}

impl OemService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live client is registered.
    pub fn is_connected(&self) -> bool {
        self.live_client().is_some()
    }

    /// Handle one transaction from `caller`.
    ///
    /// On success, command output is appended to `reply`. `ConnectClient`
    /// only checks the caller; the transport decides what registration
    /// means for its peer.
    pub fn on_transact(
        &self,
        code: u32,
        caller: CallerUid,
        data: &mut Parcel,
        reply: &mut Parcel,
    ) -> Result<(), ServiceError> {
        if !command::in_command_range(code) {
            tracing::warn!("Rejecting transaction code {code:#x} from uid {caller}");
            return Err(ServiceError::UnknownTransaction(code));
        }
        if !permission::is_authorized(code, caller) {
            tracing::warn!("Permission denied: uid {caller} issuing command {code}");
            return Err(EngineError::PermissionDenied(caller).into());
        }
        if code == CommandId::ConnectClient.code() {
            tracing::info!("Client registration accepted from uid {caller}");
            return Ok(());
        }

        let client = self.live_client().ok_or(ServiceError::NoClient)?;
        let request = command::decode_command(code, data)?;
        tracing::debug!("Command {code} from uid {caller}: {request:?}");
        let response = client.notify(request).map_err(|e| {
            tracing::warn!("Command {code} failed: {e}");
            e
        })?;
        command::encode_reply(&response, reply)?;
        Ok(())
    }

    fn live_client(&self) -> Option<Arc<dyn CommandClient>> {
        self.client.lock().as_ref().and_then(|weak| weak.upgrade())
    }
}

impl CommandChannel for OemService {
    fn connect(&self, client: Weak<dyn CommandClient>) -> Result<(), ConnectError> {
        if client.strong_count() == 0 {
            return Err(ConnectError::Unavailable("client already dropped".into()));
        }
        *self.client.lock() = Some(client);
        tracing::info!("Calibration client connected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stc_core::{CapabilityEntry, Command, CommandReply, FeatureId};

    use super::*;
    use crate::permission::{UID_GRAPHICS, UID_SYSTEM};

    #[derive(Default)]
    struct RecordingClient {
        commands: Mutex<Vec<Command>>,
    }

    impl CommandClient for RecordingClient {
        fn notify(&self, command: Command) -> Result<CommandReply, EngineError> {
            self.commands.lock().push(command.clone());
            match command {
                Command::GetCapability(_) => Ok(CommandReply::Capabilities(vec![
                    CapabilityEntry {
                        name: "default".into(),
                        num_entries: 11,
                        entries_width: 64,
                    },
                ])),
                Command::Unknown(code) => Err(EngineError::UnknownCommand(code)),
                _ => Ok(CommandReply::Done),
            }
        }
    }

    fn connected() -> (OemService, Arc<RecordingClient>) {
        let service = OemService::new();
        let client = Arc::new(RecordingClient::default());
        let dyn_client: Arc<dyn CommandClient> = client.clone();
        service.connect(Arc::downgrade(&dyn_client)).unwrap();
        (service, client)
    }

    #[test]
    fn test_out_of_range_codes_rejected() {
        let (service, client) = connected();
        for code in [0, 1, 0xFF, 0x1000] {
            let err = service
                .on_transact(code, UID_SYSTEM, &mut Parcel::new(), &mut Parcel::new())
                .unwrap_err();
            assert_eq!(err.code(), STATUS_UNKNOWN_TRANSACTION);
        }
        assert!(client.commands.lock().is_empty());
    }

    #[test]
    fn test_untrusted_caller_denied_before_decode() {
        let (service, client) = connected();
        let err = service
            .on_transact(
                CommandId::SetGammaConfig.code(),
                10_100,
                &mut Parcel::new(),
                &mut Parcel::new(),
            )
            .unwrap_err();
        assert_eq!(err.code(), -1);
        assert!(client.commands.lock().is_empty());
    }

    #[test]
    fn test_connect_client_reserved_for_graphics() {
        let (service, _client) = connected();
        let code = CommandId::ConnectClient.code();
        assert!(
            service
                .on_transact(code, UID_GRAPHICS, &mut Parcel::new(), &mut Parcel::new())
                .is_ok()
        );
        let err = service
            .on_transact(code, UID_SYSTEM, &mut Parcel::new(), &mut Parcel::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Engine(EngineError::PermissionDenied(UID_SYSTEM))
        ));
    }

    #[test]
    fn test_capability_reply_encoded() {
        let (service, client) = connected();
        let mut reply = Parcel::new();
        service
            .on_transact(
                CommandId::GetColorCorrectionCapability.code(),
                UID_SYSTEM,
                &mut Parcel::new(),
                &mut reply,
            )
            .unwrap();
        assert_eq!(
            client.commands.lock().as_slice(),
            &[Command::GetCapability(FeatureId::ColorCorrection)]
        );
        reply.rewind();
        let entries = command::decode_capabilities(&mut reply).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].num_entries, 11);
    }

    #[test]
    fn test_unrecognized_code_reaches_client() {
        let (service, client) = connected();
        let err = service
            .on_transact(0x42, UID_SYSTEM, &mut Parcel::new(), &mut Parcel::new())
            .unwrap_err();
        assert_eq!(err.code(), STATUS_INVALID);
        assert_eq!(client.commands.lock().as_slice(), &[Command::Unknown(0x42)]);
    }

    #[test]
    fn test_dropped_client_reports_not_connected() {
        let (service, client) = connected();
        drop(client);
        assert!(!service.is_connected());
        let err = service
            .on_transact(
                CommandId::GetGammaCapability.code(),
                UID_SYSTEM,
                &mut Parcel::new(),
                &mut Parcel::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoClient));
        assert_eq!(err.code(), STATUS_NOT_CONNECTED);
    }

    #[test]
    fn test_malformed_request_is_invalid() {
        let (service, client) = connected();
        let mut data = Parcel::new();
        data.write_bool(true);
        let err = service
            .on_transact(
                CommandId::SetColorCorrectionConfig.code(),
                UID_SYSTEM,
                &mut data,
                &mut Parcel::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Parcel(_)));
        assert!(client.commands.lock().is_empty());
    }
}
