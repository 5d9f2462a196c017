//! Control events delivered by the service manager to a running service.
//!
//! Raw codes follow the Win32 `SERVICE_CONTROL_*` numbering so that the SCM
//! adapter can pass codes straight through; other adapters translate their own
//! signals into the same set.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

pub const SERVICE_CONTROL_STOP: u32 = 0x0000_0001;
pub const SERVICE_CONTROL_PAUSE: u32 = 0x0000_0002;
pub const SERVICE_CONTROL_CONTINUE: u32 = 0x0000_0003;
pub const SERVICE_CONTROL_INTERROGATE: u32 = 0x0000_0004;
pub const SERVICE_CONTROL_SHUTDOWN: u32 = 0x0000_0005;
pub const SERVICE_CONTROL_PARAMCHANGE: u32 = 0x0000_0006;
pub const SERVICE_CONTROL_NETBINDADD: u32 = 0x0000_0007;
pub const SERVICE_CONTROL_NETBINDREMOVE: u32 = 0x0000_0008;
pub const SERVICE_CONTROL_NETBINDENABLE: u32 = 0x0000_0009;
pub const SERVICE_CONTROL_NETBINDDISABLE: u32 = 0x0000_000A;
pub const SERVICE_CONTROL_DEVICEEVENT: u32 = 0x0000_000B;
pub const SERVICE_CONTROL_HARDWAREPROFILECHANGE: u32 = 0x0000_000C;
pub const SERVICE_CONTROL_POWEREVENT: u32 = 0x0000_000D;
pub const SERVICE_CONTROL_SESSIONCHANGE: u32 = 0x0000_000E;
pub const SERVICE_CONTROL_PRESHUTDOWN: u32 = 0x0000_000F;

/// A discrete signal from the service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlEvent {
    Stop,
    Pause,
    Continue,
    Interrogate,
    Shutdown,
    ParamChange,
    NetBindAdd,
    NetBindRemove,
    NetBindEnable,
    NetBindDisable,
    DeviceEvent,
    HardwareProfileChange,
    PowerEvent,
    SessionChange,
    PreShutdown,
    /// Any code outside the known set, carried verbatim
    Unknown(u32),
}

impl ControlEvent {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            SERVICE_CONTROL_STOP => Self::Stop,
            SERVICE_CONTROL_PAUSE => Self::Pause,
            SERVICE_CONTROL_CONTINUE => Self::Continue,
            SERVICE_CONTROL_INTERROGATE => Self::Interrogate,
            SERVICE_CONTROL_SHUTDOWN => Self::Shutdown,
            SERVICE_CONTROL_PARAMCHANGE => Self::ParamChange,
            SERVICE_CONTROL_NETBINDADD => Self::NetBindAdd,
            SERVICE_CONTROL_NETBINDREMOVE => Self::NetBindRemove,
            SERVICE_CONTROL_NETBINDENABLE => Self::NetBindEnable,
            SERVICE_CONTROL_NETBINDDISABLE => Self::NetBindDisable,
            SERVICE_CONTROL_DEVICEEVENT => Self::DeviceEvent,
            SERVICE_CONTROL_HARDWAREPROFILECHANGE => Self::HardwareProfileChange,
            SERVICE_CONTROL_POWEREVENT => Self::PowerEvent,
            SERVICE_CONTROL_SESSIONCHANGE => Self::SessionChange,
            SERVICE_CONTROL_PRESHUTDOWN => Self::PreShutdown,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u32 {
        match self {
            Self::Stop => SERVICE_CONTROL_STOP,
            Self::Pause => SERVICE_CONTROL_PAUSE,
            Self::Continue => SERVICE_CONTROL_CONTINUE,
            Self::Interrogate => SERVICE_CONTROL_INTERROGATE,
            Self::Shutdown => SERVICE_CONTROL_SHUTDOWN,
            Self::ParamChange => SERVICE_CONTROL_PARAMCHANGE,
            Self::NetBindAdd => SERVICE_CONTROL_NETBINDADD,
            Self::NetBindRemove => SERVICE_CONTROL_NETBINDREMOVE,
            Self::NetBindEnable => SERVICE_CONTROL_NETBINDENABLE,
            Self::NetBindDisable => SERVICE_CONTROL_NETBINDDISABLE,
            Self::DeviceEvent => SERVICE_CONTROL_DEVICEEVENT,
            Self::HardwareProfileChange => SERVICE_CONTROL_HARDWAREPROFILECHANGE,
            Self::PowerEvent => SERVICE_CONTROL_POWEREVENT,
            Self::SessionChange => SERVICE_CONTROL_SESSIONCHANGE,
            Self::PreShutdown => SERVICE_CONTROL_PRESHUTDOWN,
            Self::Unknown(raw) => *raw,
        }
    }

    /// The `SERVICE_CONTROL_*` name, or `None` for codes outside the known set.
    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            Self::Stop => "SERVICE_CONTROL_STOP",
            Self::Pause => "SERVICE_CONTROL_PAUSE",
            Self::Continue => "SERVICE_CONTROL_CONTINUE",
            Self::Interrogate => "SERVICE_CONTROL_INTERROGATE",
            Self::Shutdown => "SERVICE_CONTROL_SHUTDOWN",
            Self::ParamChange => "SERVICE_CONTROL_PARAMCHANGE",
            Self::NetBindAdd => "SERVICE_CONTROL_NETBINDADD",
            Self::NetBindRemove => "SERVICE_CONTROL_NETBINDREMOVE",
            Self::NetBindEnable => "SERVICE_CONTROL_NETBINDENABLE",
            Self::NetBindDisable => "SERVICE_CONTROL_NETBINDDISABLE",
            Self::DeviceEvent => "SERVICE_CONTROL_DEVICEEVENT",
            Self::HardwareProfileChange => "SERVICE_CONTROL_HARDWAREPROFILECHANGE",
            Self::PowerEvent => "SERVICE_CONTROL_POWEREVENT",
            Self::SessionChange => "SERVICE_CONTROL_SESSIONCHANGE",
            Self::PreShutdown => "SERVICE_CONTROL_PRESHUTDOWN",
            Self::Unknown(_) => return None,
        };
        Some(name)
    }

    /// True for events after which the service is expected to wind down.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stop | Self::Shutdown | Self::PreShutdown)
    }
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{} (0x{:x})", self.raw(), self.raw()),
        }
    }
}

/// Set of controls a running service accepts, using the Win32
/// `SERVICE_ACCEPT_*` bit values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AcceptedControls(u32);

impl AcceptedControls {
    pub const STOP: Self = Self(0x0000_0001);
    pub const PAUSE_CONTINUE: Self = Self(0x0000_0002);
    pub const SHUTDOWN: Self = Self(0x0000_0004);
    pub const PARAM_CHANGE: Self = Self(0x0000_0008);
    pub const NET_BIND_CHANGE: Self = Self(0x0000_0010);
    pub const HARDWARE_PROFILE_CHANGE: Self = Self(0x0000_0020);
    pub const POWER_EVENT: Self = Self(0x0000_0040);
    pub const SESSION_CHANGE: Self = Self(0x0000_0080);
    pub const PRE_SHUTDOWN: Self = Self(0x0000_0100);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AcceptedControls {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AcceptedControls {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
