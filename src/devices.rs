//! Device descriptions of the RoomSensor node.
//!
//! External code addresses communication objects and parameters by their index, so rows must
//! never be reordered or removed. Add new entries to the end of a table, in a new revision.

use tracing::debug;

use crate::device_schema;
use crate::schema::{DeviceIdentity, DeviceSchema, Error};

pub const MANUFACTURER_ID: u16 = 0xDEAD;
pub const DEVICE_ID: u8 = 1;

device_schema! {
    /// First hardware revision: AS312 motion, CCS811 air quality and BME280 climate sensors.
    pub static ROOM_SENSOR_R1 = "RoomSensor", mod room_sensor_r1 {
        manufacturer_id: MANUFACTURER_ID,
        device_id: DEVICE_ID,
        revision: 1,
    }
    com_objects {
        0: DPT_1_001, SENSOR, motion;
        1: DPT_9_008, SENSOR, eco2Value;
        2: DPT_1_001, SENSOR, eco2MaxLimitReached;
        3: DPT_9_008, SENSOR, tvocValue;
        4: DPT_1_001, SENSOR, tvocMaxLimitReached;
        5: DPT_9_001, SENSOR, tempValue;
        6: DPT_1_001, SENSOR, tempMinLimitReached;
        7: DPT_1_001, SENSOR, tempMaxLimitReached;
        8: DPT_5_001, SENSOR, rhValue;
        9: DPT_1_001, SENSOR, rhMinLimitReached;
        10: DPT_1_001, SENSOR, rhMaxLimitReached;
        11: DPT_9_006, SENSOR, pressValue;
        12: DPT_1_001, SENSOR, pressMinLimitReached;
        13: DPT_1_001, SENSOR, pressMaxLimitReached;
    }
    parameters {
        0: UINT8, ledMode;
        1: UINT8, as312TriggerMode;
        2: UINT8, ccs811Mode;
        3: UINT16, ccs811Eco2DiffReportingThreshold;
        4: UINT16, ccs811Eco2MaxLimit;
        5: UINT8, ccs811Eco2MaxTriggeredValue;
        6: UINT16, ccs811TvocDiffReportingThreshold;
        7: UINT16, ccs811TvocMaxLimit;
        8: UINT8, ccs811TvocMaxTriggeredValue;
        9: UINT16, bme280PollingIntervalMs;
        10: UINT8, bme280TempDiffReportingThreshold;
        11: INT8, bme280TempMinLimit;
        12: UINT8, bme280TempMinTriggeredValue;
        13: INT8, bme280TempMaxLimit;
        14: UINT8, bme280TempMaxTriggeredValue;
        15: UINT8, bme280RhDiffReportingThreshold;
        16: UINT8, bme280RhMinLimit;
        17: UINT8, bme280RhMinTriggeredValue;
        18: UINT8, bme280RhMaxLimit;
        19: UINT8, bme280RhMaxTriggeredValue;
        20: UINT8, bme280PressDiffReportingThreshold;
        21: UINT16, bme280PressMinLimit;
        22: UINT8, bme280PressMinTriggeredValue;
        23: UINT16, bme280PressMaxLimit;
        24: UINT8, bme280PressMaxTriggeredValue;
    }
}

device_schema! {
    /// Second hardware revision, adding the MAX44009 ambient light sensor.
    pub static ROOM_SENSOR_R2 = "RoomSensor", mod room_sensor_r2 {
        manufacturer_id: MANUFACTURER_ID,
        device_id: DEVICE_ID,
        revision: 2,
    }
    com_objects {
        0: DPT_1_001, SENSOR, motion;
        1: DPT_9_008, SENSOR, eco2Value;
        2: DPT_1_001, SENSOR, eco2MaxLimitReached;
        3: DPT_9_008, SENSOR, tvocValue;
        4: DPT_1_001, SENSOR, tvocMaxLimitReached;
        5: DPT_9_001, SENSOR, tempValue;
        6: DPT_1_001, SENSOR, tempMinLimitReached;
        7: DPT_1_001, SENSOR, tempMaxLimitReached;
        8: DPT_9_007, SENSOR, rhValue;
        9: DPT_1_001, SENSOR, rhMinLimitReached;
        10: DPT_1_001, SENSOR, rhMaxLimitReached;
        11: DPT_9_006, SENSOR, pressValue;
        12: DPT_1_001, SENSOR, pressMinLimitReached;
        13: DPT_1_001, SENSOR, pressMaxLimitReached;
        14: DPT_9_004, SENSOR, luxValue;
        15: DPT_1_001, SENSOR, luxMaxLimitReached;
    }
    parameters {
        0: UINT8, ledMode;
        1: UINT8, as312TriggerMode;
        2: UINT8, ccs811Mode;
        3: UINT16, ccs811Eco2DiffReportingThreshold;
        4: UINT16, ccs811Eco2MaxLimit;
        5: UINT8, ccs811Eco2MaxTriggeredValue;
        6: UINT16, ccs811TvocDiffReportingThreshold;
        7: UINT16, ccs811TvocMaxLimit;
        8: UINT8, ccs811TvocMaxTriggeredValue;
        9: UINT32, bme280PollingIntervalMs;
        10: UINT8, bme280TempDiffReportingThreshold;
        11: INT8, bme280TempMinLimit;
        12: UINT8, bme280TempMinTriggeredValue;
        13: INT8, bme280TempMaxLimit;
        14: UINT8, bme280TempMaxTriggeredValue;
        15: UINT8, bme280RhDiffReportingThreshold;
        16: UINT8, bme280RhMinLimit;
        17: UINT8, bme280RhMinTriggeredValue;
        18: UINT8, bme280RhMaxLimit;
        19: UINT8, bme280RhMaxTriggeredValue;
        20: UINT8, bme280PressDiffReportingThreshold;
        21: UINT16, bme280PressMinLimit;
        22: UINT8, bme280PressMinTriggeredValue;
        23: UINT16, bme280PressMaxLimit;
        24: UINT8, bme280PressMaxTriggeredValue;
        25: UINT8, max44009LuxDiffReportingThresholdPct;
        26: UINT32, max44009LuxMaxLimit;
        27: UINT8, max44009LuxTriggeredValue;
    }
}

pub static DEVICES: &[&DeviceSchema] = &[&ROOM_SENSOR_R1, &ROOM_SENSOR_R2];

/// Find the description matching the identity a device reported during the handshake.
pub fn find(identity: DeviceIdentity) -> Result<&'static DeviceSchema, Error> {
    let result = DEVICES.iter().copied().find(|d| d.identity() == identity);
    debug!(%identity, found = result.is_some(), "device lookup");
    result.ok_or(Error::UnknownDevice(identity))
}

/// Latest known revision of the RoomSensor.
pub fn latest() -> &'static DeviceSchema {
    &ROOM_SENSOR_R2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{ComFlags, DatapointType, ParamType};

    #[test]
    fn identities_are_unique() {
        let mut identities: Vec<_> = DEVICES.iter().map(|d| d.identity()).collect();
        identities.sort_by_key(|i| (i.manufacturer_id, i.device_id, i.revision));
        identities.dedup();
        assert_eq!(identities.len(), DEVICES.len());
    }

    #[test]
    fn named_indices_match_descriptors() {
        let tables = [
            (
                &ROOM_SENSOR_R1,
                room_sensor_r1::com_objects::INDICES,
                room_sensor_r1::parameters::INDICES,
            ),
            (
                &ROOM_SENSOR_R2,
                room_sensor_r2::com_objects::INDICES,
                room_sensor_r2::parameters::INDICES,
            ),
        ];
        for (schema, com_objects, parameters) in tables {
            assert_eq!(com_objects.len(), schema.com_objects().len());
            for &(name, index) in com_objects {
                assert_eq!(schema.com_object_by_name(name).unwrap().index, index);
            }
            assert_eq!(parameters.len(), schema.parameters().len());
            for &(name, index) in parameters {
                assert_eq!(schema.parameter_by_name(name).unwrap().index, index);
            }
        }
        assert_eq!(room_sensor_r1::com_objects::rhValue, 8);
        assert_eq!(room_sensor_r2::com_objects::luxMaxLimitReached, 15);
        assert_eq!(room_sensor_r2::parameters::bme280PollingIntervalMs, 9);
        assert_eq!(room_sensor_r2::parameters::max44009LuxTriggeredValue, 27);
    }

    #[test]
    fn registry_lookup() {
        let r1 = DeviceIdentity {
            manufacturer_id: 57005,
            device_id: 1,
            revision: 1,
        };
        assert_eq!(find(r1).unwrap().number_of_com_objects(), 14);
        let r2 = DeviceIdentity { revision: 2, ..r1 };
        assert_eq!(find(r2).unwrap().number_of_params(), 28);
        let r3 = DeviceIdentity { revision: 3, ..r1 };
        assert_eq!(find(r3).unwrap_err(), Error::UnknownDevice(r3));
        assert_eq!(latest().identity(), r2);
    }

    #[test]
    fn revision_one_humidity_is_a_percentage() {
        let rh = ROOM_SENSOR_R1.com_object_by_name("rhValue").unwrap();
        assert_eq!(rh.index, 8);
        assert_eq!(rh.datatype, DatapointType::Scaling);
        assert_eq!(rh.datatype.size_bits(), 8);
        assert_eq!(rh.flags, ComFlags::from_bits(0x34));
    }

    #[test]
    fn revision_two_polling_interval_is_u32() {
        let p = ROOM_SENSOR_R2.parameter_by_name("bme280PollingIntervalMs").unwrap();
        assert_eq!(p.index, 9);
        assert_eq!(p.storage, ParamType::Uint32);
        assert_eq!(
            ROOM_SENSOR_R1.parameter(9).unwrap().storage,
            ParamType::Uint16
        );
    }

    #[test]
    fn revision_two_matches_firmware_sizes() {
        let sizes: Vec<usize> =
            ROOM_SENSOR_R2.parameters().iter().map(|p| p.storage.size()).collect();
        assert_eq!(
            sizes,
            [
                1, 1, 1, 2, 2, 1, 2, 2, 1, 4, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 1, 2, 1, 1, 4, 1
            ]
        );
        assert_eq!(ROOM_SENSOR_R2.param_memory_size(), 40);
        assert_eq!(ROOM_SENSOR_R1.param_memory_size(), 32);
    }
}
