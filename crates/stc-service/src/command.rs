//! Numeric command codes of the OEM service and their parcel layouts.

use std::path::PathBuf;

use stc_core::{CapabilityEntry, Command, CommandReply, FeatureId};

use crate::parcel::{Parcel, ParcelError};

/// First reserved code; valid commands lie strictly after it.
pub const COMMAND_LIST_START: u32 = 1;
/// Last reserved code; valid commands lie strictly before it.
pub const COMMAND_LIST_END: u32 = 0xFF;

/// Command codes understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandId {
    ConnectClient = 2,
    GetInverseGammaCapability = 3,
    GetGammaCapability = 4,
    SetInverseGammaConfig = 5,
    SetGammaConfig = 6,
    SetColorCorrectionConfig = 7,
    SetGamutConfig = 8,
    GetColorCorrectionCapability = 9,
}

impl CommandId {
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for CommandId {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            2 => Self::ConnectClient,
            3 => Self::GetInverseGammaCapability,
            4 => Self::GetGammaCapability,
            5 => Self::SetInverseGammaConfig,
            6 => Self::SetGammaConfig,
            7 => Self::SetColorCorrectionConfig,
            8 => Self::SetGamutConfig,
            9 => Self::GetColorCorrectionCapability,
            other => return Err(other),
        })
    }
}

/// Errors while building a request parcel.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("{0} capability has no command code")]
    NoCommandCode(FeatureId),

    #[error(transparent)]
    Parcel(#[from] ParcelError),
}

/// Whether `code` lies inside the command range.
pub const fn in_command_range(code: u32) -> bool {
    code > COMMAND_LIST_START && code < COMMAND_LIST_END
}

/// Decode the request body of an engine-bound command.
///
/// `ConnectClient` is handled by the service itself and never reaches here;
/// passing it, or any unrecognized code, yields [`Command::Unknown`].
pub fn decode_command(code: u32, data: &mut Parcel) -> Result<Command, ParcelError> {
    let Ok(id) = CommandId::try_from(code) else {
        return Ok(Command::Unknown(code));
    };
    Ok(match id {
        CommandId::GetInverseGammaCapability => Command::GetCapability(FeatureId::InverseGamma),
        CommandId::GetGammaCapability => Command::GetCapability(FeatureId::Gamma),
        CommandId::GetColorCorrectionCapability => {
            Command::GetCapability(FeatureId::ColorCorrection)
        }
        CommandId::SetInverseGammaConfig => {
            let (enable, path) = read_toggle_path(data, false)?;
            Command::SetInverseGamma { enable, path }
        }
        CommandId::SetGammaConfig => {
            let (enable, path) = read_toggle_path(data, false)?;
            Command::SetGamma { enable, path }
        }
        // The gamut request always carries a path slot, even when disabling.
        CommandId::SetGamutConfig => {
            let (enable, path) = read_toggle_path(data, true)?;
            Command::SetGamut { enable, path }
        }
        CommandId::SetColorCorrectionConfig => {
            let enable = data.read_bool()?;
            let mut coefficients = Vec::new();
            if enable {
                let count = data.read_u32()?;
                for _ in 0..count {
                    coefficients.push(data.read_f64()?);
                }
            }
            Command::SetColorCorrection {
                enable,
                coefficients,
            }
        }
        CommandId::ConnectClient => Command::Unknown(code),
    })
}

fn read_toggle_path(
    data: &mut Parcel,
    path_always_present: bool,
) -> Result<(bool, Option<PathBuf>), ParcelError> {
    let enable = data.read_bool()?;
    let path = if enable || path_always_present {
        Some(PathBuf::from(data.read_cstring()?))
    } else {
        None
    };
    Ok((enable, path))
}

/// Encode the request body for `command`; returns the code to send with it.
pub fn encode_command(command: &Command, data: &mut Parcel) -> Result<u32, EncodeError> {
    let id = match command {
        Command::GetCapability(FeatureId::InverseGamma) => CommandId::GetInverseGammaCapability,
        Command::GetCapability(FeatureId::Gamma) => CommandId::GetGammaCapability,
        Command::GetCapability(FeatureId::ColorCorrection) => {
            CommandId::GetColorCorrectionCapability
        }
        Command::GetCapability(FeatureId::Gamut) => {
            return Err(EncodeError::NoCommandCode(FeatureId::Gamut));
        }
        Command::SetInverseGamma { enable, path } => {
            write_toggle_path(data, *enable, path.as_ref(), false)?;
            CommandId::SetInverseGammaConfig
        }
        Command::SetGamma { enable, path } => {
            write_toggle_path(data, *enable, path.as_ref(), false)?;
            CommandId::SetGammaConfig
        }
        Command::SetGamut { enable, path } => {
            write_toggle_path(data, *enable, path.as_ref(), true)?;
            CommandId::SetGamutConfig
        }
        Command::SetColorCorrection {
            enable,
            coefficients,
        } => {
            data.write_bool(*enable);
            if *enable {
                data.write_u32(coefficients.len() as u32);
                for &c in coefficients {
                    data.write_f64(c);
                }
            }
            CommandId::SetColorCorrectionConfig
        }
        Command::Unknown(code) => return Ok(*code),
    };
    Ok(id.code())
}

fn write_toggle_path(
    data: &mut Parcel,
    enable: bool,
    path: Option<&PathBuf>,
    path_always_present: bool,
) -> Result<(), ParcelError> {
    data.write_bool(enable);
    if enable || path_always_present {
        let path = path.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
        data.write_cstring(&path)?;
    }
    Ok(())
}

/// Write a successful reply body. `Done` carries no body.
pub fn encode_reply(reply: &CommandReply, out: &mut Parcel) -> Result<(), ParcelError> {
    if let CommandReply::Capabilities(entries) = reply {
        out.write_u32(entries.len() as u32);
        for entry in entries {
            out.write_cstring(&entry.name)?;
            out.write_u32(entry.num_entries);
            out.write_u32(entry.entries_width);
        }
    }
    Ok(())
}

/// Read a capability reply body.
pub fn decode_capabilities(reply: &mut Parcel) -> Result<Vec<CapabilityEntry>, ParcelError> {
    let count = reply.read_u32()?;
    let mut entries = Vec::new();
    for _ in 0..count {
        entries.push(CapabilityEntry {
            name: reply.read_cstring()?,
            num_entries: reply.read_u32()?,
            entries_width: reply.read_u32()?,
        });
    }
    Ok(entries)
}
