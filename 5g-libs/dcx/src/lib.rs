//! dcx - wire formats of the UE-to-UE dual connectivity tunnel (DCX)

mod control;
mod error;
mod teid;
mod tunnel;

pub use control::{
    CONTROL_HEADER_LEN, ControlFraming, ControlHeader, ControlMessageType, DcxControlMessage,
    MAX_IES_LENGTH, ProcedureCode, RrcReconfiguration, RrcReconfigurationCompleted,
};
pub use error::{DecodeError, EncodeError};
pub use teid::Teid;
pub use tunnel::{TUNNEL_HEADER_LEN, TunnelHeader, TunnelMessageType};

use serde::Deserialize;

pub const DCX_C_PORT: u16 = 44444;
pub const DCX_U_PORT: u16 = 22152;
pub const X2_C_PORT: u16 = 4444;
pub const X2_U_PORT: u16 = 2152; // TS29.281

/// The kind of inter-node tunnel, which fixes the pair of UDP ports used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunnelKind {
    #[default]
    Dcx,
    X2,
}

impl TunnelKind {
    pub fn control_port(self) -> u16 {
        match self {
            TunnelKind::Dcx => DCX_C_PORT,
            TunnelKind::X2 => X2_C_PORT,
        }
    }

    pub fn user_plane_port(self) -> u16 {
        match self {
            TunnelKind::Dcx => DCX_U_PORT,
            TunnelKind::X2 => X2_U_PORT,
        }
    }
}
