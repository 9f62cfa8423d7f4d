//! Assembly of a complete capability record for one device.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::bitmask::{CodeSet, decode};
use crate::codes::{CodeLimits, EV_MAX, EventType};
use crate::device::{AbsInfo, EventDevice};
use crate::error::{Result, Warning, WarningSubject};
use crate::protocol::{self, Identity};

/// Everything the kernel reported about one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub identity: Identity,
    /// One entry per supported event type. Types without a code bitmap map to an empty set.
    pub codes: BTreeMap<EventType, CodeSet>,
    /// Calibration for every axis in the `EV_ABS` code set.
    pub abs_info: BTreeMap<u16, AbsInfo>,
}

impl DeviceCapabilities {
    pub fn event_types(&self) -> impl Iterator<Item = EventType> + '_ {
        self.codes.keys().copied()
    }

    pub fn supports(&self, ty: EventType) -> bool {
        self.codes.contains_key(&ty)
    }

    pub fn codes(&self, ty: EventType) -> Option<&CodeSet> {
        self.codes.get(&ty)
    }

    /// `EV_*` names of the supported event types, in ascending type order.
    pub fn capability_names(&self) -> Vec<&'static str> {
        self.event_types().map(EventType::name).collect()
    }
}

/// A capability record together with the non-fatal failures hit while building it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceReport {
    pub capabilities: DeviceCapabilities,
    pub warnings: Vec<Warning>,
}

impl DeviceReport {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Builds the capability record for an open device.
///
/// Only a failing event-type query is fatal; every other failure degrades the affected
/// field to its default and is recorded as a warning.
pub fn assemble(dev: &impl EventDevice, limits: &CodeLimits) -> Result<DeviceReport> {
    let (identity, mut warnings) = protocol::query_identity(dev);

    let type_bits = protocol::query_event_types(dev)?;
    let raw_types = decode(&type_bits, EV_MAX);

    let mut codes = BTreeMap::new();
    for raw in raw_types.iter() {
        let Some(ty) = EventType::from_raw(raw) else {
            debug!("ignoring unknown event type {raw:#x}");
            continue;
        };
        let Some(max_code) = limits.max_code(ty) else {
            codes.insert(ty, CodeSet::new());
            continue;
        };
        let set = match protocol::query_code_bitmap(dev, ty, max_code) {
            Ok(bits) => decode(&bits, max_code),
            Err(e) => {
                warn!("{ty} code query failed: {e}");
                warnings.push(Warning::new(WarningSubject::Codes(ty), &e));
                CodeSet::new()
            }
        };
        codes.insert(ty, set);
    }

    let mut abs_info = BTreeMap::new();
    if let Some(axes) = codes.get(&EventType::Absolute) {
        for axis in axes {
            let info = match protocol::query_abs_info(dev, axis) {
                Ok(info) => info,
                Err(e) => {
                    warn!("absolute axis {axis} query failed: {e}");
                    warnings.push(Warning::new(WarningSubject::AbsAxis(axis), &e));
                    AbsInfo::default()
                }
            };
            abs_info.insert(axis, info);
        }
    }

    Ok(DeviceReport {
        capabilities: DeviceCapabilities {
            identity,
            codes,
            abs_info,
        },
        warnings,
    })
}
