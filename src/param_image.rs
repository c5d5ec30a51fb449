//! Layout of the parameters in persisted configuration memory.
//!
//! Parameters are stored back to back in index order, each taking as many bytes as its storage
//! type requires. Multi-byte values are big-endian.

use std::ops::Range;

use tracing::trace;

use crate::datatypes::{ParamType, ParamValue};
use crate::schema::{DeviceSchema, Error, ParameterDescriptor};

#[derive(Clone, Debug)]
pub struct ParamLayout {
    schema: &'static DeviceSchema,
    offsets: Vec<usize>,
    size: usize,
}

impl ParamLayout {
    pub fn of(schema: &'static DeviceSchema) -> Self {
        let mut offsets = Vec::with_capacity(schema.parameters().len());
        let mut size = 0;
        for parameter in schema.parameters() {
            offsets.push(size);
            size += parameter.storage.size();
        }
        Self {
            schema,
            offsets,
            size,
        }
    }

    pub fn schema(&self) -> &'static DeviceSchema {
        self.schema
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte range occupied by the parameter at `index`.
    pub fn offset(&self, index: usize) -> Result<Range<usize>, Error> {
        let parameter = self.schema.parameter(index)?;
        let start = self.offsets[index];
        Ok(start..start + parameter.storage.size())
    }

    /// Iterate over all parameters together with their byte ranges.
    pub fn entries(&self) -> impl Iterator<Item = (&'static ParameterDescriptor, Range<usize>)> + '_ {
        self.schema
            .parameters()
            .iter()
            .zip(&self.offsets)
            .map(|(p, &offset)| (p, offset..offset + p.storage.size()))
    }
}

/// A parameter memory image for one device description.
#[derive(Clone, Debug)]
pub struct ParameterImage {
    layout: ParamLayout,
    bytes: Vec<u8>,
}

impl ParameterImage {
    /// An image with every parameter set to zero.
    pub fn new(schema: &'static DeviceSchema) -> Self {
        let layout = ParamLayout::of(schema);
        let bytes = vec![0; layout.size()];
        Self { layout, bytes }
    }

    pub fn from_bytes(schema: &'static DeviceSchema, bytes: Vec<u8>) -> Result<Self, Error> {
        let layout = ParamLayout::of(schema);
        if bytes.len() != layout.size() {
            return Err(Error::ImageLength {
                expected: layout.size(),
                actual: bytes.len(),
            });
        }
        Ok(Self { layout, bytes })
    }

    pub fn layout(&self) -> &ParamLayout {
        &self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get(&self, index: usize) -> Result<ParamValue, Error> {
        let range = self.layout.offset(index)?;
        let storage = self.layout.schema.parameters()[index].storage;
        Ok(self.decode_at(storage, range))
    }

    fn decode_at(&self, storage: ParamType, range: Range<usize>) -> ParamValue {
        let Some(value) = storage.decode(&self.bytes[range]) else {
            unreachable!("parameter ranges are sized by their storage type");
        };
        value
    }

    pub fn set(&mut self, index: usize, value: ParamValue) -> Result<(), Error> {
        let range = self.layout.offset(index)?;
        let parameter = &self.layout.schema.parameters()[index];
        if value.param_type() != parameter.storage {
            return Err(Error::ValueType {
                name: parameter.name,
                expected: parameter.storage,
                actual: value.param_type(),
            });
        }
        trace!(name = parameter.name, %value, ?range, "setting parameter");
        value.write_be(&mut self.bytes[range]);
        Ok(())
    }

    /// Parse `text` according to the parameter's storage type and store it.
    pub fn set_by_name(&mut self, name: &str, text: &str) -> Result<(), Error> {
        let parameter = self.layout.schema.parameter_by_name(name)?;
        let value = parameter.storage.parse(text)?;
        self.set(usize::from(parameter.index), value)
    }

    /// Decode every parameter in index order.
    pub fn values(
        &self,
    ) -> impl Iterator<Item = (&'static ParameterDescriptor, Range<usize>, ParamValue)> + '_ {
        self.layout.entries().map(|(p, range)| {
            let value = self.decode_at(p.storage, range.clone());
            (p, range, value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DEVICES, ROOM_SENSOR_R1, ROOM_SENSOR_R2};

    #[test]
    fn offsets_are_cumulative() {
        let layout = ParamLayout::of(&ROOM_SENSOR_R2);
        assert_eq!(layout.size(), 40);
        assert_eq!(layout.offset(0), Ok(0..1));
        assert_eq!(layout.offset(3), Ok(3..5));
        assert_eq!(layout.offset(9), Ok(13..17));
        assert_eq!(layout.offset(26), Ok(35..39));
        assert_eq!(layout.offset(27), Ok(39..40));
        assert_eq!(
            layout.offset(28),
            Err(Error::ParameterOutOfRange { index: 28, count: 28 })
        );
    }

    #[test]
    fn revisions_differ_in_layout() {
        let r1 = ParamLayout::of(&ROOM_SENSOR_R1);
        assert_eq!(r1.offset(9), Ok(13..15));
        assert_eq!(r1.offset(10), Ok(15..16));
    }

    #[test]
    fn set_and_get() {
        let mut image = ParameterImage::new(&ROOM_SENSOR_R2);
        image.set(9, ParamValue::U32(60_000)).unwrap();
        image.set(11, ParamValue::I8(-10)).unwrap();
        assert_eq!(image.get(9), Ok(ParamValue::U32(60_000)));
        assert_eq!(image.get(11), Ok(ParamValue::I8(-10)));
        assert_eq!(&image.as_bytes()[13..17], &[0x00, 0x00, 0xEA, 0x60]);
        assert_eq!(image.get(0), Ok(ParamValue::U8(0)));
    }

    #[test]
    fn every_parameter_reads_back_extremes() {
        for schema in DEVICES {
            let mut image = ParameterImage::new(schema);
            for (index, p) in schema.parameters().iter().enumerate() {
                image.set(index, p.storage.max_value()).unwrap();
            }
            for (p, _, value) in image.values() {
                assert_eq!(value, p.storage.max_value(), "{}", p.name);
            }
            for (index, p) in schema.parameters().iter().enumerate() {
                image.set(index, p.storage.min_value()).unwrap();
                assert_eq!(image.get(index), Ok(p.storage.min_value()), "{}", p.name);
            }
        }
    }

    #[test]
    fn set_rejects_wrong_type() {
        let mut image = ParameterImage::new(&ROOM_SENSOR_R2);
        assert_eq!(
            image.set(9, ParamValue::U16(1)),
            Err(Error::ValueType {
                name: "bme280PollingIntervalMs",
                expected: ParamType::Uint32,
                actual: ParamType::Uint16,
            })
        );
    }

    #[test]
    fn set_by_name_parses_storage_type() {
        let mut image = ParameterImage::new(&ROOM_SENSOR_R1);
        image.set_by_name("bme280TempMinLimit", "-5").unwrap();
        assert_eq!(image.get(11), Ok(ParamValue::I8(-5)));
        assert!(matches!(
            image.set_by_name("bme280PollingIntervalMs", "70000"),
            Err(Error::ParseValue(..))
        ));
        assert_eq!(
            image.set_by_name("luxValue", "1"),
            Err(Error::UnknownParameter("luxValue".to_string()))
        );
    }

    #[test]
    fn from_bytes_checks_length() {
        assert_eq!(
            ParameterImage::from_bytes(&ROOM_SENSOR_R2, vec![0; 39]).unwrap_err(),
            Error::ImageLength {
                expected: 40,
                actual: 39
            }
        );
        let mut bytes = vec![0; 40];
        bytes[35..39].copy_from_slice(&100_000u32.to_be_bytes());
        let image = ParameterImage::from_bytes(&ROOM_SENSOR_R2, bytes).unwrap();
        let (p, range, value) = image.values().nth(26).unwrap();
        assert_eq!(p.name, "max44009LuxMaxLimit");
        assert_eq!(range, 35..39);
        assert_eq!(value, ParamValue::U32(100_000));
    }
}
