use crate::devices::{self, DEVICE_ID, MANUFACTURER_ID};
use crate::schema::{self, DeviceIdentity, DeviceSchema};

/// Known RoomSensor hardware revisions.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    /// Revision 1: no ambient light sensor, humidity as DPT 5.001.
    R1,
    /// Revision 2: adds the MAX44009 ambient light sensor.
    R2,
}

impl Device {
    pub fn revision(self) -> u8 {
        match self {
            Device::R1 => 1,
            Device::R2 => 2,
        }
    }
}

/// Selects one of the known RoomSensor descriptions.
#[derive(clap::Parser)]
#[group(id = "commands::DeviceArgs")]
pub struct DeviceArgs {
    #[arg(long, short = 'd', value_enum, default_value_t = Device::R2)]
    device: Device,
}

impl DeviceArgs {
    pub fn schema(&self) -> Result<&'static DeviceSchema, schema::Error> {
        devices::find(DeviceIdentity {
            manufacturer_id: MANUFACTURER_ID,
            device_id: DEVICE_ID,
            revision: self.device.revision(),
        })
    }
}

fn is_match(name: &str, index: u8, pattern: &str) -> bool {
    let pattern = pattern.to_lowercase();
    name.to_lowercase().contains(&pattern) || index.to_string() == pattern
}

pub mod devices_list {
    use crate::devices::DEVICES;
    use crate::output::{self, Record};
    use crate::schema::DeviceSchema;

    /// List the known device descriptions.
    #[derive(clap::Parser)]
    pub struct Args {
        #[command(flatten)]
        output: output::Args,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not output the device list")]
        Output(#[from] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct DeviceRecord {
        pub name: &'static str,
        pub manufacturer_id: u16,
        pub device_id: u8,
        pub revision: u8,
        pub com_objects: u8,
        pub parameters: u8,
        pub param_memory_size: usize,
    }

    impl From<&DeviceSchema> for DeviceRecord {
        fn from(schema: &DeviceSchema) -> Self {
            let identity = schema.identity();
            Self {
                name: schema.name(),
                manufacturer_id: identity.manufacturer_id,
                device_id: identity.device_id,
                revision: identity.revision,
                com_objects: schema.number_of_com_objects(),
                parameters: schema.number_of_params(),
                param_memory_size: schema.param_memory_size(),
            }
        }
    }

    impl Record for DeviceRecord {
        const HEADERS: &'static [&'static str] = &[
            "Name",
            "Manufacturer",
            "Device",
            "Revision",
            "Com objects",
            "Parameters",
            "Parameter bytes",
        ];

        fn cells(&self) -> Vec<String> {
            vec![
                self.name.to_string(),
                format!("{:#06X}", self.manufacturer_id),
                self.device_id.to_string(),
                self.revision.to_string(),
                self.com_objects.to_string(),
                self.parameters.to_string(),
                self.param_memory_size.to_string(),
            ]
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let mut output = args.output.to_output::<DeviceRecord>()?;
        for schema in DEVICES {
            output.record(&DeviceRecord::from(*schema))?;
        }
        Ok(output.commit()?)
    }
}

pub mod com_objects {
    use crate::datatypes::{ComFlags, DatapointType};
    use crate::output::{self, Record};
    use crate::schema::{self, ComObjectDescriptor};

    /// List the communication objects of a device.
    #[derive(clap::Parser)]
    pub struct Args {
        #[command(flatten)]
        pub(super) device: super::DeviceArgs,
        #[command(flatten)]
        output: output::Args,
        /// Only show objects whose name contains this text or whose index equals it.
        filter: Option<String>,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not select the device description")]
        Device(#[from] schema::Error),
        #[error("could not output the communication objects")]
        Output(#[from] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct ComObjectRecord {
        pub index: u8,
        pub name: &'static str,
        pub datatype: DatapointType,
        pub datatype_name: &'static str,
        pub size_bits: u8,
        pub flags: ComFlags,
        pub flags_byte: u8,
    }

    impl From<&ComObjectDescriptor> for ComObjectRecord {
        fn from(co: &ComObjectDescriptor) -> Self {
            Self {
                index: co.index,
                name: co.name,
                datatype: co.datatype,
                datatype_name: co.datatype.name(),
                size_bits: co.datatype.size_bits(),
                flags: co.flags,
                flags_byte: co.flags.bits(),
            }
        }
    }

    impl Record for ComObjectRecord {
        const HEADERS: &'static [&'static str] =
            &["Index", "Name", "DPT", "DPT name", "Bits", "Flags", "Flags byte"];

        fn cells(&self) -> Vec<String> {
            vec![
                self.index.to_string(),
                self.name.to_string(),
                self.datatype.to_string(),
                self.datatype_name.to_string(),
                self.size_bits.to_string(),
                self.flags.to_string(),
                format!("{:#04X}", self.flags_byte),
            ]
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let schema = args.device.schema()?;
        let mut output = args.output.to_output::<ComObjectRecord>()?;
        for co in schema.com_objects() {
            if let Some(pattern) = &args.filter {
                if !super::is_match(co.name, co.index, pattern) {
                    continue;
                }
            }
            output.record(&ComObjectRecord::from(co))?;
        }
        Ok(output.commit()?)
    }
}

pub mod params {
    use std::ops::Range;

    use crate::datatypes::ParamType;
    use crate::output::{self, Record};
    use crate::param_image::ParamLayout;
    use crate::schema::{self, ParameterDescriptor};

    /// List the parameters of a device along with their place in configuration memory.
    #[derive(clap::Parser)]
    pub struct Args {
        #[command(flatten)]
        pub(super) device: super::DeviceArgs,
        #[command(flatten)]
        output: output::Args,
        /// Only show parameters whose name contains this text or whose index equals it.
        filter: Option<String>,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not select the device description")]
        Device(#[from] schema::Error),
        #[error("could not output the parameters")]
        Output(#[from] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct ParamRecord {
        pub index: u8,
        pub name: &'static str,
        pub storage: ParamType,
        pub signed: bool,
        pub offset: usize,
        pub size: usize,
    }

    impl ParamRecord {
        pub fn new(p: &ParameterDescriptor, range: Range<usize>) -> Self {
            Self {
                index: p.index,
                name: p.name,
                storage: p.storage,
                signed: p.storage.is_signed(),
                offset: range.start,
                size: range.len(),
            }
        }
    }

    impl Record for ParamRecord {
        const HEADERS: &'static [&'static str] =
            &["Index", "Name", "Type", "Signed", "Offset", "Size"];

        fn cells(&self) -> Vec<String> {
            vec![
                self.index.to_string(),
                self.name.to_string(),
                self.storage.to_string(),
                self.signed.to_string(),
                self.offset.to_string(),
                self.size.to_string(),
            ]
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let layout = ParamLayout::of(args.device.schema()?);
        let mut output = args.output.to_output::<ParamRecord>()?;
        for (p, range) in layout.entries() {
            if let Some(pattern) = &args.filter {
                if !super::is_match(p.name, p.index, pattern) {
                    continue;
                }
            }
            output.record(&ParamRecord::new(p, range))?;
        }
        Ok(output.commit()?)
    }
}

pub mod decode {
    use std::path::PathBuf;

    use tracing::debug;

    use crate::datatypes::{ParamType, ParamValue};
    use crate::output::{self, Record};
    use crate::param_image::ParameterImage;
    use crate::schema;

    /// Decode a parameter memory image read from a file.
    #[derive(clap::Parser)]
    pub struct Args {
        #[command(flatten)]
        pub(super) device: super::DeviceArgs,
        #[command(flatten)]
        output: output::Args,
        /// Raw parameter memory, exactly as many bytes as the device's parameters occupy.
        #[arg(long, short = 'i')]
        input: PathBuf,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("could not read the parameter image at {1:?}")]
        ReadInput(#[source] std::io::Error, PathBuf),
        #[error("could not interpret the parameter image")]
        Schema(#[from] schema::Error),
        #[error("could not output the parameter values")]
        Output(#[from] output::Error),
    }

    #[derive(serde::Serialize)]
    pub struct ValueRecord {
        pub index: u8,
        pub name: &'static str,
        pub storage: ParamType,
        pub offset: usize,
        pub value: ParamValue,
    }

    impl Record for ValueRecord {
        const HEADERS: &'static [&'static str] = &["Index", "Name", "Type", "Offset", "Value"];

        fn cells(&self) -> Vec<String> {
            vec![
                self.index.to_string(),
                self.name.to_string(),
                self.storage.to_string(),
                self.offset.to_string(),
                self.value.to_string(),
            ]
        }
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let schema = args.device.schema()?;
        let bytes =
            std::fs::read(&args.input).map_err(|e| Error::ReadInput(e, args.input.clone()))?;
        debug!(path = ?args.input, length = bytes.len(), "read parameter image");
        let image = ParameterImage::from_bytes(schema, bytes)?;
        let mut output = args.output.to_output::<ValueRecord>()?;
        for (p, range, value) in image.values() {
            output.record(&ValueRecord {
                index: p.index,
                name: p.name,
                storage: p.storage,
                offset: range.start,
                value,
            })?;
        }
        Ok(output.commit()?)
    }
}

pub mod encode {
    use std::io::Write as _;
    use std::path::PathBuf;

    use tracing::info;

    use crate::param_image::ParameterImage;
    use crate::schema;

    /// Build a parameter memory image from `NAME=VALUE` assignments.
    ///
    /// Parameters that are not assigned are zero.
    #[derive(clap::Parser)]
    pub struct Args {
        #[command(flatten)]
        pub(super) device: super::DeviceArgs,
        /// Assign a value to a parameter, e.g. `--set bme280PollingIntervalMs=5000`.
        #[arg(long = "set", short = 's', value_name = "NAME=VALUE")]
        assignments: Vec<String>,
        /// Start from an existing image instead of an all-zero one.
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        #[arg(long, short = 'o')]
        output: PathBuf,
    }

    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        #[error("assignment `{0}` is not of the form NAME=VALUE")]
        MalformedAssignment(String),
        #[error("could not read the parameter image at {1:?}")]
        ReadInput(#[source] std::io::Error, PathBuf),
        #[error("could not build the parameter image")]
        Schema(#[from] schema::Error),
        #[error("could not write the parameter image to {1:?}")]
        WriteOutput(#[source] std::io::Error, PathBuf),
    }

    pub fn run(args: Args) -> Result<(), Error> {
        let schema = args.device.schema()?;
        let mut image = match &args.input {
            None => ParameterImage::new(schema),
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|e| Error::ReadInput(e, path.clone()))?;
                ParameterImage::from_bytes(schema, bytes)?
            }
        };
        for assignment in &args.assignments {
            let Some((name, value)) = assignment.split_once('=') else {
                return Err(Error::MalformedAssignment(assignment.clone()));
            };
            image.set_by_name(name.trim(), value)?;
        }
        let write_error = |e| Error::WriteOutput(e, args.output.clone());
        let mut file = std::fs::File::create(&args.output).map_err(write_error)?;
        file.write_all(image.as_bytes()).map_err(write_error)?;
        info!(
            path = ?args.output,
            length = image.as_bytes().len(),
            assignments = args.assignments.len(),
            "wrote parameter image"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_name_or_index() {
        assert!(is_match("bme280PollingIntervalMs", 9, "polling"));
        assert!(is_match("bme280PollingIntervalMs", 9, "9"));
        assert!(!is_match("ledMode", 0, "9"));
        assert!(!is_match("ledMode", 0, "lux"));
    }

    #[test]
    fn every_device_choice_has_a_schema() {
        for device in <Device as clap::ValueEnum>::value_variants() {
            let schema = DeviceArgs { device: *device }.schema().unwrap();
            assert_eq!(schema.identity().revision, device.revision());
        }
    }

    #[test]
    fn device_flag_spelling() {
        let args = <com_objects::Args as clap::Parser>::try_parse_from([
            "com-objects",
            "--device",
            "r1",
        ])
        .unwrap();
        assert_eq!(args.device.device, Device::R1);
        assert_eq!(args.device.schema().unwrap().number_of_com_objects(), 14);

        let args = <params::Args as clap::Parser>::try_parse_from([
            "params", "-d", "r1", "-f", "csv", "bme280Polling",
        ])
        .unwrap();
        assert_eq!(args.device.device, Device::R1);

        let args = <params::Args as clap::Parser>::try_parse_from(["params"]).unwrap();
        assert_eq!(args.device.device, Device::R2);

        assert!(
            <com_objects::Args as clap::Parser>::try_parse_from(["com-objects", "--device", "r3"])
                .is_err()
        );
    }

    #[test]
    fn encode_then_decode_file() {
        let path = std::env::temp_dir().join(format!(
            "roomsensor-schema-image-{}.bin",
            std::process::id()
        ));
        encode::run(
            <encode::Args as clap::Parser>::try_parse_from([
                "encode",
                "--device",
                "r2",
                "--set",
                "ledMode=2",
                "--set",
                "max44009LuxMaxLimit=120000",
                "--output",
                path.to_str().unwrap(),
            ])
            .unwrap(),
        )
        .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(bytes.len(), 40);
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[35..39], &120_000u32.to_be_bytes());
    }

    #[test]
    fn encode_rejects_malformed_assignment() {
        let args = <encode::Args as clap::Parser>::try_parse_from([
            "encode", "--set", "ledMode", "--output", "unused.bin",
        ])
        .unwrap();
        assert!(matches!(
            encode::run(args),
            Err(encode::Error::MalformedAssignment(a)) if a == "ledMode"
        ));
    }
}
