use tracing::trace;

use crate::datatypes::{ComFlags, DatapointType, ParamType};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("communication object index {index} is out of range (device has {count})")]
    ComObjectOutOfRange { index: usize, count: u8 },
    #[error("parameter index {index} is out of range (device has {count})")]
    ParameterOutOfRange { index: usize, count: u8 },
    #[error("device has no communication object named `{0}`")]
    UnknownComObject(String),
    #[error("device has no parameter named `{0}`")]
    UnknownParameter(String),
    #[error("no known device matches {0}")]
    UnknownDevice(DeviceIdentity),
    #[error("parameter image must be {expected} bytes long, got {actual}")]
    ImageLength { expected: usize, actual: usize },
    #[error("parameter `{name}` is stored as {expected}, but a {actual} value was given")]
    ValueType {
        name: &'static str,
        expected: ParamType,
        actual: ParamType,
    },
    #[error("could not parse `{1}` as {2}")]
    ParseValue(#[source] std::num::ParseIntError, String, ParamType),
}

/// Identification triple exchanged during the provisioning handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct DeviceIdentity {
    pub manufacturer_id: u16,
    pub device_id: u8,
    pub revision: u8,
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "manufacturer {:#06X}, device {}, revision {}",
            self.manufacturer_id, self.device_id, self.revision
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ComObjectDescriptor {
    pub index: u8,
    pub name: &'static str,
    pub datatype: DatapointType,
    pub flags: ComFlags,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ParameterDescriptor {
    pub index: u8,
    pub name: &'static str,
    pub storage: ParamType,
}

/// Description of one device variant: its identity and its index-addressed tables.
///
/// Construct these with [`device_schema!`](crate::device_schema). The tables are
/// validated during constant evaluation, so a malformed table fails the build.
#[derive(Debug)]
pub struct DeviceSchema {
    name: &'static str,
    identity: DeviceIdentity,
    com_objects: &'static [ComObjectDescriptor],
    parameters: &'static [ParameterDescriptor],
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

impl DeviceSchema {
    pub const fn new(
        name: &'static str,
        identity: DeviceIdentity,
        com_objects: &'static [ComObjectDescriptor],
        parameters: &'static [ParameterDescriptor],
    ) -> Self {
        if com_objects.len() > u8::MAX as usize {
            panic!("too many communication objects for a single byte index");
        }
        if parameters.len() > u8::MAX as usize {
            panic!("too many parameters for a single byte index");
        }
        let mut i = 0;
        while i < com_objects.len() {
            if com_objects[i].index as usize != i {
                panic!("communication object indices must be dense and start at 0");
            }
            let mut j = 0;
            while j < i {
                if str_eq(com_objects[i].name, com_objects[j].name) {
                    panic!("communication object names must be unique");
                }
                j += 1;
            }
            i += 1;
        }
        let mut i = 0;
        while i < parameters.len() {
            if parameters[i].index as usize != i {
                panic!("parameter indices must be dense and start at 0");
            }
            let mut j = 0;
            while j < i {
                if str_eq(parameters[i].name, parameters[j].name) {
                    panic!("parameter names must be unique");
                }
                j += 1;
            }
            i += 1;
        }
        Self {
            name,
            identity,
            com_objects,
            parameters,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    pub fn com_objects(&self) -> &'static [ComObjectDescriptor] {
        self.com_objects
    }

    pub fn parameters(&self) -> &'static [ParameterDescriptor] {
        self.parameters
    }

    pub const fn number_of_com_objects(&self) -> u8 {
        self.com_objects.len() as u8
    }

    pub const fn number_of_params(&self) -> u8 {
        self.parameters.len() as u8
    }

    pub fn com_object(&self, index: usize) -> Result<&'static ComObjectDescriptor, Error> {
        self.com_objects.get(index).ok_or_else(|| {
            trace!(device = self.name, index, "com object lookup out of range");
            Error::ComObjectOutOfRange {
                index,
                count: self.number_of_com_objects(),
            }
        })
    }

    pub fn parameter(&self, index: usize) -> Result<&'static ParameterDescriptor, Error> {
        self.parameters.get(index).ok_or_else(|| {
            trace!(device = self.name, index, "parameter lookup out of range");
            Error::ParameterOutOfRange {
                index,
                count: self.number_of_params(),
            }
        })
    }

    pub fn com_object_by_name(&self, name: &str) -> Result<&'static ComObjectDescriptor, Error> {
        self.com_objects
            .iter()
            .find(|co| co.name == name)
            .ok_or_else(|| Error::UnknownComObject(name.to_string()))
    }

    pub fn parameter_by_name(&self, name: &str) -> Result<&'static ParameterDescriptor, Error> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }

    /// Total number of bytes the parameters occupy in configuration memory.
    pub fn param_memory_size(&self) -> usize {
        self.parameters.iter().map(|p| p.storage.size()).sum()
    }
}

/// Define a [`DeviceSchema`] static from tabulated communication objects and parameters.
///
/// Each row starts with the index the external runtime addresses the entry by. Indices must
/// match declaration order; the counts are derived from the tables. The named module gets a
/// `pub const` index per row, so firmware can address entries without a lookup.
///
/// ```
/// roomsensor_schema::device_schema! {
///     pub static THERMOSTAT = "Thermostat", mod thermostat {
///         manufacturer_id: 0x0001,
///         device_id: 2,
///         revision: 1,
///     }
///     com_objects {
///         0: DPT_9_001, SENSOR, tempValue;
///         1: DPT_1_001, SENSOR, heating;
///     }
///     parameters {
///         0: INT8, tempOffset;
///     }
/// }
///
/// assert_eq!(thermostat::com_objects::heating, 1);
/// assert_eq!(THERMOSTAT.com_object(1).unwrap().name, "heating");
/// assert_eq!(THERMOSTAT.number_of_params(), 1);
/// ```
///
/// Indices that skip or repeat a position are rejected when the crate is built:
///
/// ```compile_fail
/// roomsensor_schema::device_schema! {
///     static BROKEN = "Broken", mod broken {
///         manufacturer_id: 0x0001,
///         device_id: 2,
///         revision: 1,
///     }
///     com_objects {
///         0: DPT_9_001, SENSOR, tempValue;
///         2: DPT_1_001, SENSOR, heating;
///     }
///     parameters {}
/// }
/// # fn main() { let _ = &BROKEN; }
/// ```
///
/// So are duplicate communication object names:
///
/// ```compile_fail
/// roomsensor_schema::device_schema! {
///     static BROKEN = "Broken", mod broken {
///         manufacturer_id: 0x0001,
///         device_id: 2,
///         revision: 1,
///     }
///     com_objects {
///         0: DPT_9_001, SENSOR, tempValue;
///         1: DPT_9_001, SENSOR, tempValue;
///     }
///     parameters {}
/// }
/// # fn main() { let _ = &BROKEN; }
/// ```
///
/// And duplicate parameter names:
///
/// ```compile_fail
/// roomsensor_schema::device_schema! {
///     static BROKEN = "Broken", mod broken {
///         manufacturer_id: 0x0001,
///         device_id: 2,
///         revision: 1,
///     }
///     com_objects {}
///     parameters {
///         0: UINT8, mode;
///         1: UINT16, mode;
///     }
/// }
/// # fn main() { let _ = &BROKEN; }
/// ```
#[macro_export]
macro_rules! device_schema {
    (
        $(#[$meta: meta])*
        $vis: vis static $ident: ident = $name: literal, mod $module: ident {
            manufacturer_id: $manufacturer: expr,
            device_id: $device: expr,
            revision: $revision: expr,
        }
        com_objects {
            $($co_index: literal: $dpt: ident, $flags: ident, $co_name: ident;)*
        }
        parameters {
            $($p_index: literal: $storage: ident, $p_name: ident;)*
        }
    ) => {
        $(#[$meta])*
        $vis static $ident: $crate::schema::DeviceSchema = $crate::schema::DeviceSchema::new(
            $name,
            $crate::schema::DeviceIdentity {
                manufacturer_id: $manufacturer,
                device_id: $device,
                revision: $revision,
            },
            &[$($crate::schema::ComObjectDescriptor {
                index: $co_index,
                name: stringify!($co_name),
                datatype: $crate::datatypes::DatapointType::$dpt,
                flags: $crate::datatypes::ComFlags::$flags,
            }),*],
            &[$($crate::schema::ParameterDescriptor {
                index: $p_index,
                name: stringify!($p_name),
                storage: $crate::datatypes::ParamType::$storage,
            }),*],
        );

        /// Build-time indices of the entries, named as in the tables.
        $vis mod $module {
            pub mod com_objects {
                $(
                    #[allow(non_upper_case_globals)]
                    pub const $co_name: u8 = $co_index;
                )*
                /// Every named index, in declaration order.
                pub const INDICES: &[(&str, u8)] = &[$((stringify!($co_name), $co_index)),*];
            }
            pub mod parameters {
                $(
                    #[allow(non_upper_case_globals)]
                    pub const $p_name: u8 = $p_index;
                )*
                /// Every named index, in declaration order.
                pub const INDICES: &[(&str, u8)] = &[$((stringify!($p_name), $p_index)),*];
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::device_schema! {
        static TINY = "Tiny", mod tiny {
            manufacturer_id: 0x0001,
            device_id: 7,
            revision: 3,
        }
        com_objects {
            0: DPT_1_001, SENSOR, button;
            1: DPT_9_001, SENSOR, temperature;
        }
        parameters {
            0: UINT8, mode;
            1: INT16, offset;
            2: UINT32, interval;
        }
    }

    #[test]
    fn counts_follow_tables() {
        assert_eq!(TINY.number_of_com_objects(), 2);
        assert_eq!(TINY.number_of_params(), 3);
        assert_eq!(TINY.param_memory_size(), 7);
    }

    #[test]
    fn lookup_by_index() {
        let co = TINY.com_object(1).unwrap();
        assert_eq!(co.name, "temperature");
        assert_eq!(co.datatype, DatapointType::ValueTemp);
        assert_eq!(TINY.parameter(2).unwrap().storage, ParamType::Uint32);
    }

    #[test]
    fn lookup_out_of_range() {
        assert_eq!(
            TINY.com_object(2),
            Err(Error::ComObjectOutOfRange { index: 2, count: 2 })
        );
        assert_eq!(
            TINY.parameter(300),
            Err(Error::ParameterOutOfRange { index: 300, count: 3 })
        );
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(TINY.parameter_by_name("offset").unwrap().index, 1);
        assert_eq!(
            TINY.com_object_by_name("missing"),
            Err(Error::UnknownComObject("missing".to_string()))
        );
    }

    #[test]
    fn named_indices() {
        assert_eq!(tiny::com_objects::temperature, 1);
        assert_eq!(tiny::parameters::interval, 2);
        assert_eq!(
            tiny::parameters::INDICES,
            &[("mode", 0), ("offset", 1), ("interval", 2)]
        );
        assert_eq!(TINY.parameter(tiny::parameters::offset.into()).unwrap().name, "offset");
    }

    #[test]
    fn identity_display() {
        assert_eq!(
            TINY.identity().to_string(),
            "manufacturer 0x0001, device 7, revision 3"
        );
    }

    #[test]
    fn const_string_compare() {
        assert!(str_eq("rhValue", "rhValue"));
        assert!(!str_eq("rhValue", "rhValues"));
        assert!(!str_eq("tempValue", "tvocValue"));
    }
}
