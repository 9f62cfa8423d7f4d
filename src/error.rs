use std::{fmt, io};

use thiserror::Error;

use crate::codes::EventType;

/// Terminal failure for one device node.
#[derive(Debug, Error)]
pub enum Error {
    /// The node does not exist (or vanished while it was being queried).
    #[error("device node not found")]
    NotFound,
    /// The caller lacks rights to open or query the node.
    #[error("permission denied")]
    PermissionDenied,
    /// The node exists but cannot be opened or queried right now.
    #[error("device busy")]
    DeviceBusy,
    /// Any other open or control-call failure.
    #[error("{op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Comparable mirror of [`Error`] without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    DeviceBusy,
    Io,
}

impl Error {
    /// Classifies an OS error raised by `op` into the device error taxonomy.
    pub fn from_io(op: &'static str, err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ENOENT | libc::ENODEV | libc::ENXIO) => return Error::NotFound,
            Some(libc::EACCES | libc::EPERM) => return Error::PermissionDenied,
            Some(libc::EBUSY | libc::EAGAIN) => return Error::DeviceBusy,
            _ => {}
        }
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound,
            io::ErrorKind::PermissionDenied => Error::PermissionDenied,
            io::ErrorKind::WouldBlock => Error::DeviceBusy,
            _ => Error::Io { op, source: err },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound => ErrorKind::NotFound,
            Error::PermissionDenied => ErrorKind::PermissionDenied,
            Error::DeviceBusy => ErrorKind::DeviceBusy,
            Error::Io { .. } => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Identity fields that are queried independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Name,
    PhysicalPath,
    UniqueId,
    InputId,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentityField::Name => "name",
            IdentityField::PhysicalPath => "physical path",
            IdentityField::UniqueId => "unique id",
            IdentityField::InputId => "bus/vendor/product/version",
        })
    }
}

/// What part of a record was degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningSubject {
    Identity(IdentityField),
    Codes(EventType),
    AbsAxis(u16),
}

impl fmt::Display for WarningSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningSubject::Identity(field) => write!(f, "{field}"),
            WarningSubject::Codes(ty) => write!(f, "{} codes", ty.name()),
            WarningSubject::AbsAxis(axis) => write!(f, "absolute axis {axis}"),
        }
    }
}

/// A non-fatal query failure carried alongside a successful record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub subject: WarningSubject,
    pub reason: String,
}

impl Warning {
    pub fn new(subject: WarningSubject, cause: &Error) -> Self {
        Self {
            subject,
            reason: cause.to_string(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unavailable: {}", self.subject, self.reason)
    }
}
