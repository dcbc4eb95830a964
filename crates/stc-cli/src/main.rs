//! stc-demo-test: issue calibration commands to a running stc-oemservice.
//!
//! Each subcommand becomes one parcel transaction over the WebSocket
//! transport; the status and any capability list are printed.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use futures_util::{SinkExt, StreamExt};
use stc_core::{Command, FeatureId};
use stc_service::command::{decode_capabilities, encode_command};
use stc_service::config::DEFAULT_WS_PORT;
use stc_service::ipc::{self, PeerToService, ServiceToPeer};
use stc_service::Parcel;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing_subscriber::EnvFilter;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for the service to answer.
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "stc-demo-test")]
#[command(author, version, about = "Drive the STC calibration service")]
struct Cli {
    #[command(subcommand)]
    command: Request,

    /// Service WebSocket port
    #[arg(short, long, env = "STC_WS_PORT", default_value_t = DEFAULT_WS_PORT, global = true)]
    port: u16,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Request {
    /// List inverse gamma LUT configurations
    #[command(name = "GET_IGC_CAP")]
    GetIgcCap,

    /// List gamma LUT configurations
    #[command(name = "GET_GC_CAP")]
    GetGcCap,

    /// List color correction configurations
    #[command(name = "GET_PCC_CAP")]
    GetPccCap,

    /// Enable or disable the inverse gamma override
    #[command(name = "SET_IGC_CONFIG")]
    SetIgcConfig {
        state: Toggle,
        /// Channel LUT file (required to enable)
        path: Option<PathBuf>,
    },

    /// Enable or disable the gamma override
    #[command(name = "SET_GC_CONFIG")]
    SetGcConfig {
        state: Toggle,
        /// Channel LUT file (required to enable)
        path: Option<PathBuf>,
    },

    /// Enable or disable the gamut override
    #[command(name = "SET_GAMUT_CONFIG")]
    SetGamutConfig {
        state: Toggle,
        /// Gamut LUT file (required to enable)
        path: Option<PathBuf>,
    },

    /// Enable or disable polynomial color correction
    #[command(name = "SET_PCC_CONFIG")]
    SetPccConfig {
        state: Toggle,
        /// Coefficients: red terms, then green, then blue
        #[arg(allow_negative_numbers = true)]
        coefficients: Vec<f64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Toggle {
    Enable,
    Disable,
}

impl Toggle {
    fn is_enable(self) -> bool {
        self == Self::Enable
    }
}

impl Request {
    /// Build the engine command, checking enable-time arguments.
    fn to_command(&self) -> Result<Command> {
        let lut_path = |state: Toggle, path: &Option<PathBuf>| -> Result<Option<PathBuf>> {
            if state.is_enable() && path.is_none() {
                bail!("a LUT file path is required to enable");
            }
            Ok(path.clone())
        };
        Ok(match self {
            Self::GetIgcCap => Command::GetCapability(FeatureId::InverseGamma),
            Self::GetGcCap => Command::GetCapability(FeatureId::Gamma),
            Self::GetPccCap => Command::GetCapability(FeatureId::ColorCorrection),
            Self::SetIgcConfig { state, path } => Command::SetInverseGamma {
                enable: state.is_enable(),
                path: lut_path(*state, path)?,
            },
            Self::SetGcConfig { state, path } => Command::SetGamma {
                enable: state.is_enable(),
                path: lut_path(*state, path)?,
            },
            Self::SetGamutConfig { state, path } => Command::SetGamut {
                enable: state.is_enable(),
                path: lut_path(*state, path)?,
            },
            Self::SetPccConfig {
                state,
                coefficients,
            } => {
                if state.is_enable() && coefficients.is_empty() {
                    bail!("coefficients are required to enable color correction");
                }
                Command::SetColorCorrection {
                    enable: state.is_enable(),
                    coefficients: coefficients.clone(),
                }
            }
        })
    }

    fn expects_capabilities(&self) -> bool {
        matches!(self, Self::GetIgcCap | Self::GetGcCap | Self::GetPccCap)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let command = cli.command.to_command()?;
    let mut data = Parcel::new();
    let code = encode_command(&command, &mut data).context("failed to encode request")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let (status, mut reply) = rt.block_on(transact(cli.port, code, &data))?;

    if status != 0 {
        bail!("command {code} failed with status {status}");
    }
    if cli.command.expects_capabilities() {
        let entries = decode_capabilities(&mut reply).context("malformed capability reply")?;
        println!("There are {} configs supported:", entries.len());
        for (i, entry) in entries.iter().enumerate() {
            println!(
                "  [{i}] {}: {} entries, {} bits",
                entry.name, entry.num_entries, entry.entries_width
            );
        }
    } else {
        println!("OK");
    }
    Ok(())
}

/// Send one transaction and wait for its reply.
async fn transact(port: u16, code: u32, data: &Parcel) -> Result<(i32, Parcel)> {
    let url = format!("ws://127.0.0.1:{port}");
    let (mut ws, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    tracing::debug!("Connected to {url}");

    let request = serde_json::to_string(&PeerToService::transact(code, data))?;
    ws.send(Message::Text(request.into())).await?;

    let reply = tokio::time::timeout(REPLY_TIMEOUT, read_reply(&mut ws, code))
        .await
        .context("timed out waiting for reply")??;

    let _ = ws.close(None).await;
    Ok(reply)
}

async fn read_reply(ws: &mut WsStream, code: u32) -> Result<(i32, Parcel)> {
    while let Some(msg) = ws.next().await {
        let Message::Text(text) = msg? else {
            continue;
        };
        match serde_json::from_str::<ServiceToPeer>(text.as_str())? {
            ServiceToPeer::Reply {
                code: answered,
                status,
                parcel,
            } if answered == code => {
                return Ok((status, ipc::decode_parcel(&parcel)?));
            }
            ServiceToPeer::Error { message } => bail!("service rejected request: {message}"),
            other => tracing::debug!("Ignoring {other:?}"),
        }
    }
    bail!("service closed the connection")
}
