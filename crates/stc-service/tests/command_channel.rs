//! End-to-end: parcel requests through the OEM service into a live engine.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use stc_core::{
    Command, CommandChannel, FeatureId, HwConfigList, HwPayload, RefreshTrigger, ScOp, StcEngine,
};
use stc_service::command::{decode_capabilities, encode_command};
use stc_service::ipc::{self, PeerToService, ServiceToPeer};
use stc_service::permission::{UID_GRAPHICS, UID_SYSTEM};
use stc_service::ws_bridge::handle_request;
use stc_service::{OemService, Parcel, RefreshEvent, ScreenRefresh};
use tokio::sync::broadcast;

struct Rig {
    engine: Arc<StcEngine>,
    service: Arc<OemService>,
    frames: broadcast::Receiver<RefreshEvent>,
}

impl Rig {
    fn new() -> Self {
        let service = Arc::new(OemService::new());
        let refresh = ScreenRefresh::new();
        let frames = refresh.subscribe();
        let channel: Arc<dyn CommandChannel> = service.clone();
        let trigger: Arc<dyn RefreshTrigger> = Arc::new(refresh);
        let engine = stc_core::create_interface(2, 0, Some(channel), Some(trigger)).unwrap();
        engine.init("test_panel").unwrap();
        Self {
            engine,
            service,
            frames,
        }
    }

    fn send(&self, command: &Command) -> (i32, Parcel) {
        let mut data = Parcel::new();
        let code = encode_command(command, &mut data).unwrap();
        self.transact(code, &data)
    }

    fn transact(&self, code: u32, data: &Parcel) -> (i32, Parcel) {
        let (reply, _) = handle_request(&self.service, UID_SYSTEM, PeerToService::transact(code, data));
        match reply {
            ServiceToPeer::Reply { status, parcel, .. } => {
                (status, ipc::decode_parcel(&parcel).unwrap())
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }
}

fn channel_lut_file(len: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Entries: {len}").unwrap();
    for channel in 0..3u32 {
        for i in 0..len as u32 {
            writeln!(file, "{}", channel * 1000 + i).unwrap();
        }
    }
    file.flush().unwrap();
    file
}

#[test]
fn engine_registers_with_service_on_init() {
    let rig = Rig::new();
    assert!(rig.service.is_connected());
    drop(rig.engine);
    assert!(!rig.service.is_connected());
}

#[test]
fn color_correction_capability_over_the_wire() {
    let rig = Rig::new();
    let (status, mut reply) = rig.send(&Command::GetCapability(FeatureId::ColorCorrection));
    assert_eq!(status, 0);
    let entries = decode_capabilities(&mut reply).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "default");
    assert_eq!((entries[0].num_entries, entries[0].entries_width), (11, 64));
}

#[test]
fn gamma_lut_flows_into_merged_hw_list() {
    let mut rig = Rig::new();
    let file = channel_lut_file(4);
    let (status, _) = rig.send(&Command::SetGamma {
        enable: true,
        path: Some(file.path().to_path_buf()),
    });
    assert_eq!(status, 0);
    assert_eq!(rig.frames.try_recv().unwrap(), RefreshEvent { enable: true });

    let mut hw_list = HwConfigList::new();
    rig.engine
        .process_ops(ScOp::ModeRenderIntent, &mut hw_list)
        .unwrap();
    let entry = hw_list.find(FeatureId::Gamma).unwrap();
    let HwPayload::Gamma(lut) = entry.payload() else {
        panic!("expected gamma payload, got {:?}", entry.payload());
    };
    assert!(lut.enabled);
    assert_eq!(lut.red, vec![0, 1, 2, 3]);
    assert_eq!(lut.blue, vec![2000, 2001, 2002, 2003]);
}

#[test]
fn missing_lut_file_reports_not_found() {
    let rig = Rig::new();
    let (status, reply) = rig.send(&Command::SetInverseGamma {
        enable: true,
        path: Some(PathBuf::from("/nonexistent/igc.txt")),
    });
    assert_eq!(status, -2);
    assert_eq!(reply.data_size(), 0);
}

#[test]
fn untrusted_identity_never_reaches_engine() {
    let rig = Rig::new();
    let mut data = Parcel::new();
    let code = encode_command(
        &Command::SetColorCorrection {
            enable: true,
            coefficients: vec![1.0; 33],
        },
        &mut data,
    )
    .unwrap();
    let (reply, _) = handle_request(&rig.service, 10_123, PeerToService::transact(code, &data));
    assert!(matches!(reply, ServiceToPeer::Reply { status: -1, .. }));
    assert!(!rig.engine.overrides().color_correction.enabled);
}

#[test]
fn graphics_peer_may_register() {
    let rig = Rig::new();
    let (reply, registered) = handle_request(
        &rig.service,
        UID_GRAPHICS,
        PeerToService::transact(2, &Parcel::new()),
    );
    assert!(registered);
    assert!(matches!(reply, ServiceToPeer::Reply { status: 0, .. }));
}

#[test]
fn calls_after_deinit_are_invalid() {
    let rig = Rig::new();
    rig.engine.deinit().unwrap();
    let (status, _) = rig.send(&Command::GetCapability(FeatureId::Gamma));
    assert_eq!(status, -22);
}
