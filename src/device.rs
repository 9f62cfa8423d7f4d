//! Open event-device nodes and the raw control calls issued against them.

use std::fs::{File, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use log::debug;

use crate::codes::{ABS_MAX, EV_MAX};
use crate::error::{Error, Result};

/// Bus type, vendor, product and version as reported by `EVIOCGID`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputId {
    pub bus_type: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl From<libc::input_id> for InputId {
    fn from(raw: libc::input_id) -> Self {
        Self {
            bus_type: raw.bustype,
            vendor: raw.vendor,
            product: raw.product,
            version: raw.version,
        }
    }
}

/// Calibration of one absolute axis as reported by `EVIOCGABS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbsInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    /// Noise threshold.
    pub fuzz: i32,
    /// Dead zone.
    pub flat: i32,
    pub resolution: i32,
}

impl AbsInfo {
    /// Minimum above maximum. The kernel does not reject such calibrations.
    pub fn is_inverted(&self) -> bool {
        self.minimum > self.maximum
    }
}

impl From<libc::input_absinfo> for AbsInfo {
    fn from(raw: libc::input_absinfo) -> Self {
        Self {
            value: raw.value,
            minimum: raw.minimum,
            maximum: raw.maximum,
            fuzz: raw.fuzz,
            flat: raw.flat,
            resolution: raw.resolution,
        }
    }
}

/// String-valued identity queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringQuery {
    Name,
    PhysicalPath,
    UniqueId,
}

/// Raw control-call surface of one open device.
///
/// Buffer-filling calls return the number of bytes the kernel wrote, which may be
/// less than the buffer length.
pub trait EventDevice {
    fn read_string(&self, query: StringQuery, buf: &mut [u8]) -> io::Result<usize>;

    fn read_input_id(&self) -> io::Result<InputId>;

    /// `EVIOCGBIT(ev, len)`; `ev == 0` yields the event-type bitmap itself.
    fn read_bits(&self, ev: u16, buf: &mut [u8]) -> io::Result<usize>;

    fn read_abs_info(&self, axis: u16) -> io::Result<AbsInfo>;
}

/// Opens device nodes for introspection.
pub trait Opener {
    type Device: EventDevice;

    fn open(&self, path: &Path) -> Result<Self::Device>;
}

mod ioctl {
    use std::os::unix::io::RawFd;

    use nix::errno::Errno;
    use nix::sys::ioctl::ioctl_num_type;
    use nix::{ioctl_read, ioctl_read_buf, request_code_read};

    ioctl_read!(eviocgid, b'E', 0x02, libc::input_id);
    ioctl_read_buf!(eviocgname, b'E', 0x06, u8);
    ioctl_read_buf!(eviocgphys, b'E', 0x07, u8);
    ioctl_read_buf!(eviocguniq, b'E', 0x08, u8);

    // EVIOCGBIT and EVIOCGABS encode the event type or axis in the request number, so
    // they cannot be generated with a fixed `nr`.

    pub(super) unsafe fn eviocgbit(fd: RawFd, ev: u16, buf: &mut [u8]) -> nix::Result<libc::c_int> {
        let request = request_code_read!(b'E', 0x20 + ev, buf.len());
        let res = unsafe { libc::ioctl(fd, request as ioctl_num_type, buf.as_mut_ptr()) };
        Errno::result(res)
    }

    pub(super) unsafe fn eviocgabs(
        fd: RawFd,
        axis: u16,
        out: *mut libc::input_absinfo,
    ) -> nix::Result<libc::c_int> {
        let request =
            request_code_read!(b'E', 0x40 + axis, std::mem::size_of::<libc::input_absinfo>());
        let res = unsafe { libc::ioctl(fd, request as ioctl_num_type, out) };
        Errno::result(res)
    }
}

/// An open `/dev/input/event*` node. The descriptor is released exactly once, when the
/// node is dropped or explicitly closed.
#[derive(Debug)]
pub struct EventNode {
    file: File,
    path: PathBuf,
}

impl EventNode {
    /// Opens `path` read-only and non-blocking so an abnormal node cannot stall enumeration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_CLOEXEC)
            .open(path)
            .map_err(|e| Error::from_io("open", e))?;
        debug!("opened {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(self) {
        drop(self);
    }

    fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl Drop for EventNode {
    fn drop(&mut self) {
        debug!("closing {}", self.path.display());
    }
}

fn written(res: nix::Result<libc::c_int>) -> io::Result<usize> {
    res.map(|n| n.max(0) as usize).map_err(io::Error::from)
}

impl EventDevice for EventNode {
    fn read_string(&self, query: StringQuery, buf: &mut [u8]) -> io::Result<usize> {
        let res = unsafe {
            match query {
                StringQuery::Name => ioctl::eviocgname(self.fd(), buf),
                StringQuery::PhysicalPath => ioctl::eviocgphys(self.fd(), buf),
                StringQuery::UniqueId => ioctl::eviocguniq(self.fd(), buf),
            }
        };
        written(res)
    }

    fn read_input_id(&self) -> io::Result<InputId> {
        let mut out = MaybeUninit::<libc::input_id>::zeroed();
        unsafe {
            ioctl::eviocgid(self.fd(), out.as_mut_ptr()).map_err(io::Error::from)?;
            Ok(InputId::from(out.assume_init()))
        }
    }

    fn read_bits(&self, ev: u16, buf: &mut [u8]) -> io::Result<usize> {
        if ev > EV_MAX {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("event type {ev:#x} exceeds EV_MAX"),
            ));
        }
        written(unsafe { ioctl::eviocgbit(self.fd(), ev, buf) }).map(|n| n.min(buf.len()))
    }

    fn read_abs_info(&self, axis: u16) -> io::Result<AbsInfo> {
        if axis > ABS_MAX {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("absolute axis {axis:#x} exceeds ABS_MAX"),
            ));
        }
        let mut out = MaybeUninit::<libc::input_absinfo>::zeroed();
        unsafe {
            ioctl::eviocgabs(self.fd(), axis, out.as_mut_ptr()).map_err(io::Error::from)?;
            Ok(AbsInfo::from(out.assume_init()))
        }
    }
}

/// Opens real device nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeOpener;

impl Opener for NodeOpener {
    type Device = EventNode;

    fn open(&self, path: &Path) -> Result<EventNode> {
        EventNode::open(path)
    }
}
