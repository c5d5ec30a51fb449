use crate::schema::Error;

/// KNX datapoint types used by the communication objects of the room sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr, strum::VariantArray)]
pub enum DatapointType {
    #[strum(serialize = "DPT_Switch")]
    Switch,
    #[strum(serialize = "DPT_Scaling")]
    Scaling,
    #[strum(serialize = "DPT_Value_Temp")]
    ValueTemp,
    #[strum(serialize = "DPT_Value_Lux")]
    ValueLux,
    #[strum(serialize = "DPT_Value_Pres")]
    ValuePres,
    #[strum(serialize = "DPT_Value_Humidity")]
    ValueHumidity,
    #[strum(serialize = "DPT_Value_AirQuality")]
    ValueAirQuality,
}

impl DatapointType {
    // Aliases by DPT number for the tabulated `device_schema!` definitions.
    pub const DPT_1_001: Self = Self::Switch;
    pub const DPT_5_001: Self = Self::Scaling;
    pub const DPT_9_001: Self = Self::ValueTemp;
    pub const DPT_9_004: Self = Self::ValueLux;
    pub const DPT_9_006: Self = Self::ValuePres;
    pub const DPT_9_007: Self = Self::ValueHumidity;
    pub const DPT_9_008: Self = Self::ValueAirQuality;

    pub const fn main_number(&self) -> u16 {
        match self {
            Self::Switch => 1,
            Self::Scaling => 5,
            Self::ValueTemp
            | Self::ValueLux
            | Self::ValuePres
            | Self::ValueHumidity
            | Self::ValueAirQuality => 9,
        }
    }

    pub const fn sub_number(&self) -> u16 {
        match self {
            Self::Switch | Self::Scaling | Self::ValueTemp => 1,
            Self::ValueLux => 4,
            Self::ValuePres => 6,
            Self::ValueHumidity => 7,
            Self::ValueAirQuality => 8,
        }
    }

    /// Size of the encoded value on the bus.
    pub const fn size_bits(&self) -> u8 {
        match self.main_number() {
            1 => 1,
            5 => 8,
            _ => 16,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Look a datapoint type up by its KNX main and sub number.
    pub fn from_numbers(main: u16, sub: u16) -> Option<Self> {
        <Self as strum::VariantArray>::VARIANTS
            .iter()
            .copied()
            .find(|dpt| dpt.main_number() == main && dpt.sub_number() == sub)
    }
}

impl std::str::FromStr for DatapointType {
    type Err = ();

    /// Parses the `main.sub` notation, e.g. `9.007`.
    fn from_str(s: &str) -> Result<Self, ()> {
        let (main, sub) = s.split_once('.').ok_or(())?;
        let main = main.parse().map_err(|_| ())?;
        let sub = sub.parse().map_err(|_| ())?;
        Self::from_numbers(main, sub).ok_or(())
    }
}

impl std::fmt::Display for DatapointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:03}", self.main_number(), self.sub_number())
    }
}

impl serde::Serialize for DatapointType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Communication object flags byte, as understood by the KNX stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ComFlags(u8);

impl ComFlags {
    pub const I: Self = Self(1 << 0);
    pub const U: Self = Self(1 << 1);
    pub const T: Self = Self(1 << 2);
    pub const W: Self = Self(1 << 3);
    pub const R: Self = Self(1 << 4);
    pub const C: Self = Self(1 << 5);
    /// Communication, read and transmit: a value the device publishes.
    pub const SENSOR: Self = Self(Self::C.0 | Self::R.0 | Self::T.0);

    const LETTERS: [(Self, &'static str); 6] = [
        (Self::C, "C"),
        (Self::R, "R"),
        (Self::W, "W"),
        (Self::T, "T"),
        (Self::U, "U"),
        (Self::I, "I"),
    ];

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::fmt::Display for ComFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (flag, letter) in Self::LETTERS {
            f.write_str(if self.contains(flag) { letter } else { "-" })?;
        }
        Ok(())
    }
}

impl serde::Serialize for ComFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Storage type of a parameter in the persisted configuration memory.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum::IntoStaticStr,
    strum::EnumString,
    strum::VariantArray,
)]
pub enum ParamType {
    #[strum(serialize = "INT8")]
    Int8,
    #[strum(serialize = "UINT8")]
    Uint8,
    #[strum(serialize = "INT16")]
    Int16,
    #[strum(serialize = "UINT16")]
    Uint16,
    #[strum(serialize = "INT32")]
    Int32,
    #[strum(serialize = "UINT32")]
    Uint32,
}

impl ParamType {
    pub const INT8: Self = Self::Int8;
    pub const UINT8: Self = Self::Uint8;
    pub const INT16: Self = Self::Int16;
    pub const UINT16: Self = Self::Uint16;
    pub const INT32: Self = Self::Int32;
    pub const UINT32: Self = Self::Uint32;

    /// Number of bytes the parameter occupies in configuration memory.
    pub const fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 => 4,
        }
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32)
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub const fn min_value(&self) -> ParamValue {
        match self {
            Self::Int8 => ParamValue::I8(i8::MIN),
            Self::Uint8 => ParamValue::U8(u8::MIN),
            Self::Int16 => ParamValue::I16(i16::MIN),
            Self::Uint16 => ParamValue::U16(u16::MIN),
            Self::Int32 => ParamValue::I32(i32::MIN),
            Self::Uint32 => ParamValue::U32(u32::MIN),
        }
    }

    pub const fn max_value(&self) -> ParamValue {
        match self {
            Self::Int8 => ParamValue::I8(i8::MAX),
            Self::Uint8 => ParamValue::U8(u8::MAX),
            Self::Int16 => ParamValue::I16(i16::MAX),
            Self::Uint16 => ParamValue::U16(u16::MAX),
            Self::Int32 => ParamValue::I32(i32::MAX),
            Self::Uint32 => ParamValue::U32(u32::MAX),
        }
    }

    /// Decode a big-endian value from the start of `bs`.
    ///
    /// Returns `None` if `bs` is shorter than [`ParamType::size`].
    pub fn decode(self, bs: &[u8]) -> Option<ParamValue> {
        Some(match self {
            Self::Int8 => ParamValue::I8(i8::from_be_bytes(*bs.first_chunk()?)),
            Self::Uint8 => ParamValue::U8(u8::from_be_bytes(*bs.first_chunk()?)),
            Self::Int16 => ParamValue::I16(i16::from_be_bytes(*bs.first_chunk()?)),
            Self::Uint16 => ParamValue::U16(u16::from_be_bytes(*bs.first_chunk()?)),
            Self::Int32 => ParamValue::I32(i32::from_be_bytes(*bs.first_chunk()?)),
            Self::Uint32 => ParamValue::U32(u32::from_be_bytes(*bs.first_chunk()?)),
        })
    }

    /// Parse a decimal value of this type.
    pub fn parse(self, text: &str) -> Result<ParamValue, Error> {
        let text = text.trim();
        let result = match self {
            Self::Int8 => text.parse().map(ParamValue::I8),
            Self::Uint8 => text.parse().map(ParamValue::U8),
            Self::Int16 => text.parse().map(ParamValue::I16),
            Self::Uint16 => text.parse().map(ParamValue::U16),
            Self::Int32 => text.parse().map(ParamValue::I32),
            Self::Uint32 => text.parse().map(ParamValue::U32),
        };
        result.map_err(|e| Error::ParseValue(e, text.to_string(), self))
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl serde::Serialize for ParamType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamValue {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
}

impl ParamValue {
    pub const fn param_type(&self) -> ParamType {
        match self {
            Self::I8(_) => ParamType::Int8,
            Self::U8(_) => ParamType::Uint8,
            Self::I16(_) => ParamType::Int16,
            Self::U16(_) => ParamType::Uint16,
            Self::I32(_) => ParamType::Int32,
            Self::U32(_) => ParamType::Uint32,
        }
    }

    /// Write the big-endian representation into the start of `dst`.
    ///
    /// Panics if `dst` is shorter than the size of the value's type.
    pub fn write_be(&self, dst: &mut [u8]) {
        match *self {
            Self::I8(v) => dst[..1].copy_from_slice(&v.to_be_bytes()),
            Self::U8(v) => dst[..1].copy_from_slice(&v.to_be_bytes()),
            Self::I16(v) => dst[..2].copy_from_slice(&v.to_be_bytes()),
            Self::U16(v) => dst[..2].copy_from_slice(&v.to_be_bytes()),
            Self::I32(v) => dst[..4].copy_from_slice(&v.to_be_bytes()),
            Self::U32(v) => dst[..4].copy_from_slice(&v.to_be_bytes()),
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::I8(n) => write!(f, "{n}"),
            Self::U8(n) => write!(f, "{n}"),
            Self::I16(n) => write!(f, "{n}"),
            Self::U16(n) => write!(f, "{n}"),
            Self::I32(n) => write!(f, "{n}"),
            Self::U32(n) => write!(f, "{n}"),
        }
    }
}

impl serde::Serialize for ParamValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::I8(n) => serializer.serialize_i8(n),
            Self::U8(n) => serializer.serialize_u8(n),
            Self::I16(n) => serializer.serialize_i16(n),
            Self::U16(n) => serializer.serialize_u16(n),
            Self::I32(n) => serializer.serialize_i32(n),
            Self::U32(n) => serializer.serialize_u32(n),
        }
    }
}
