//! Control-call protocol: the four queries issued against an open device, each decoded
//! into owned data with its own failure behavior.

use log::debug;

use crate::bitmask::bitmap_len;
use crate::codes::{EV_MAX, EventType};
use crate::device::{AbsInfo, EventDevice, InputId, StringQuery};
use crate::error::{Error, IdentityField, Result, Warning, WarningSubject};

/// Size of the buffer used for name, physical path and unique id strings.
const STRING_CAPACITY: usize = 256;

/// Who the device says it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Display name, possibly empty.
    pub name: String,
    pub physical_path: Option<String>,
    pub unique_id: Option<String>,
    pub id: InputId,
}

/// Queries every identity field independently. A failing field is left empty and
/// reported as a warning; this never fails as a whole.
pub fn query_identity(dev: &impl EventDevice) -> (Identity, Vec<Warning>) {
    let mut identity = Identity::default();
    let mut warnings = Vec::new();

    match query_string(dev, StringQuery::Name) {
        Ok(name) => identity.name = name,
        Err(e) => warnings.push(Warning::new(WarningSubject::Identity(IdentityField::Name), &e)),
    }
    match query_string(dev, StringQuery::PhysicalPath) {
        Ok(phys) => identity.physical_path = Some(phys).filter(|s| !s.is_empty()),
        Err(e) => warnings.push(Warning::new(
            WarningSubject::Identity(IdentityField::PhysicalPath),
            &e,
        )),
    }
    match query_string(dev, StringQuery::UniqueId) {
        Ok(uniq) => identity.unique_id = Some(uniq).filter(|s| !s.is_empty()),
        Err(e) => warnings.push(Warning::new(
            WarningSubject::Identity(IdentityField::UniqueId),
            &e,
        )),
    }
    match dev.read_input_id() {
        Ok(id) => identity.id = id,
        Err(e) => warnings.push(Warning::new(
            WarningSubject::Identity(IdentityField::InputId),
            &Error::from_io("EVIOCGID", e),
        )),
    }

    (identity, warnings)
}

fn query_string(dev: &impl EventDevice, query: StringQuery) -> Result<String> {
    let op = match query {
        StringQuery::Name => "EVIOCGNAME",
        StringQuery::PhysicalPath => "EVIOCGPHYS",
        StringQuery::UniqueId => "EVIOCGUNIQ",
    };
    let mut buf = [0u8; STRING_CAPACITY];
    let len = dev
        .read_string(query, &mut buf)
        .map_err(|e| Error::from_io(op, e))?;
    Ok(decode_string(&buf[..len.min(buf.len())]))
}

/// Kernel strings are NUL-terminated; anything after the first NUL is stale buffer content.
fn decode_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Reads the event-type bitmap (`EVIOCGBIT(0)`), sized for `EV_MAX`.
pub fn query_event_types(dev: &impl EventDevice) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; bitmap_len(EV_MAX)];
    let len = dev
        .read_bits(0, &mut buf)
        .map_err(|e| Error::from_io("EVIOCGBIT", e))?;
    buf.truncate(len);
    Ok(buf)
}

/// Reads the code bitmap for `ty`, sized for codes `0..=max_code`. The returned buffer is
/// truncated to what the kernel actually wrote.
pub fn query_code_bitmap(dev: &impl EventDevice, ty: EventType, max_code: u16) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; bitmap_len(max_code)];
    let len = dev
        .read_bits(ty.raw(), &mut buf)
        .map_err(|e| Error::from_io("EVIOCGBIT", e))?;
    if len < buf.len() {
        debug!("{ty}: kernel returned {len} of {} bitmap bytes", buf.len());
    }
    buf.truncate(len);
    Ok(buf)
}

pub fn query_abs_info(dev: &impl EventDevice, axis: u16) -> Result<AbsInfo> {
    let info = dev
        .read_abs_info(axis)
        .map_err(|e| Error::from_io("EVIOCGABS", e))?;
    if info.is_inverted() {
        debug!(
            "axis {axis}: minimum {} above maximum {}",
            info.minimum, info.maximum
        );
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::error::ErrorKind;

    /// Answers every call with fixed data or a fixed errno.
    #[derive(Default)]
    struct Scripted {
        name: Option<&'static [u8]>,
        phys: Option<&'static [u8]>,
        uniq: Option<&'static [u8]>,
        id: Option<InputId>,
        bits: Option<Vec<u8>>,
        abs: Option<AbsInfo>,
    }

    fn enotty() -> io::Error {
        io::Error::from_raw_os_error(libc::ENOTTY)
    }

    fn fill(src: &[u8], buf: &mut [u8]) -> usize {
        let n = src.len().min(buf.len());
        buf[..n].copy_from_slice(&src[..n]);
        n
    }

    impl EventDevice for Scripted {
        fn read_string(&self, query: StringQuery, buf: &mut [u8]) -> io::Result<usize> {
            let src = match query {
                StringQuery::Name => self.name,
                StringQuery::PhysicalPath => self.phys,
                StringQuery::UniqueId => self.uniq,
            };
            src.map(|s| fill(s, buf)).ok_or_else(enotty)
        }

        fn read_input_id(&self) -> io::Result<InputId> {
            self.id.ok_or_else(|| io::Error::from_raw_os_error(libc::EACCES))
        }

        fn read_bits(&self, _ev: u16, buf: &mut [u8]) -> io::Result<usize> {
            self.bits.as_deref().map(|s| fill(s, buf)).ok_or_else(enotty)
        }

        fn read_abs_info(&self, _axis: u16) -> io::Result<AbsInfo> {
            self.abs.ok_or_else(|| io::Error::from_raw_os_error(libc::EBUSY))
        }
    }

    #[test]
    fn identity_strings_stop_at_nul() {
        let dev = Scripted {
            name: Some(b"AT Translated Set 2 keyboard\0garbage"),
            phys: Some(b"isa0060/serio0/input0\0"),
            uniq: Some(b"\0"),
            id: Some(InputId {
                bus_type: 0x11,
                vendor: 1,
                product: 1,
                version: 0xab41,
            }),
            ..Default::default()
        };
        let (identity, warnings) = query_identity(&dev);
        assert!(warnings.is_empty());
        assert_eq!(identity.name, "AT Translated Set 2 keyboard");
        assert_eq!(identity.physical_path.as_deref(), Some("isa0060/serio0/input0"));
        assert_eq!(identity.unique_id, None);
        assert_eq!(identity.id.bus_type, 0x11);
    }

    #[test]
    fn identity_field_failures_are_independent() {
        let dev = Scripted {
            name: Some(b"Power Button\0"),
            ..Default::default()
        };
        let (identity, warnings) = query_identity(&dev);
        assert_eq!(identity.name, "Power Button");
        assert_eq!(identity.physical_path, None);
        assert_eq!(identity.id, InputId::default());
        let subjects: Vec<_> = warnings.iter().map(|w| w.subject).collect();
        assert_eq!(
            subjects,
            vec![
                WarningSubject::Identity(IdentityField::PhysicalPath),
                WarningSubject::Identity(IdentityField::UniqueId),
                WarningSubject::Identity(IdentityField::InputId),
            ]
        );
        assert_eq!(warnings[2].reason, "permission denied");
    }

    #[test]
    fn bitmaps_are_truncated_to_kernel_length() {
        let dev = Scripted {
            bits: Some(vec![0b11, 0x80]),
            ..Default::default()
        };
        assert_eq!(query_event_types(&dev).unwrap(), vec![0b11, 0x80]);
        let keys = query_code_bitmap(&dev, EventType::Key, 0x2ff).unwrap();
        assert_eq!(keys, vec![0b11, 0x80]);
        let short = query_code_bitmap(&dev, EventType::Misc, 0x07).unwrap();
        assert_eq!(short, vec![0b11]);
    }

    #[test]
    fn control_call_errors_are_classified() {
        let dev = Scripted::default();
        assert_eq!(query_event_types(&dev).unwrap_err().kind(), ErrorKind::Io);
        assert_eq!(query_abs_info(&dev, 0).unwrap_err().kind(), ErrorKind::DeviceBusy);
    }

    #[test]
    fn inverted_axis_range_is_returned_as_reported() {
        let inverted = AbsInfo {
            value: 3,
            minimum: 7,
            maximum: 0,
            ..AbsInfo::default()
        };
        let dev = Scripted {
            abs: Some(inverted),
            ..Default::default()
        };
        let info = query_abs_info(&dev, 0x28).unwrap();
        assert!(info.is_inverted());
        assert_eq!(info, inverted);
    }
}
