use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::field::FieldKind::{Float, I16, I32};
use crate::field::FieldSpec;
use crate::layout::FrameLayout;

/// Protocol variant spoken by a controller firmware build.
///
/// Chosen once per session; there is no in-band negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Variant {
    /// 21-field telemetry, 8 GPIO lines.
    #[default]
    #[serde(rename = "legacy-21", alias = "legacy", alias = "21")]
    Legacy21,
    /// 25-field telemetry with LEDs, ADCs, temperature and shutdown flag.
    #[serde(rename = "extended-25", alias = "extended", alias = "25")]
    Extended25,
}

impl Variant {
    /// Every known variant, in registry order.
    pub const ALL: [Variant; 2] = [Variant::Legacy21, Variant::Extended25];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Variant::Legacy21 => "legacy-21",
            Variant::Extended25 => "extended-25",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = SchemaError;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "legacy-21" | "legacy21" | "legacy" | "21" => Ok(Variant::Legacy21),
            "extended-25" | "extended25" | "extended" | "25" => Ok(Variant::Extended25),
            _ => Err(SchemaError::UnknownVariant(input.to_string())),
        }
    }
}

/// Telemetry and command layouts of one protocol variant.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub variant: Variant,
    /// Controller → console frames.
    pub telemetry: FrameLayout,
    /// Console → controller frames.
    pub command: FrameLayout,
}

impl Schema {
    /// Number of fields in a telemetry frame.
    pub fn field_count(&self) -> usize {
        self.telemetry.field_count()
    }

    /// Telemetry field indices summed into the checksum.
    pub fn checksum_fields(&self) -> &'static [usize] {
        self.telemetry.checksum_fields
    }
}

/// Look up the schema of a protocol variant.
pub fn schema_for(variant: Variant) -> &'static Schema {
    match variant {
        Variant::Legacy21 => &LEGACY_21,
        Variant::Extended25 => &EXTENDED_25,
    }
}

static LEGACY_21: Schema = Schema {
    variant: Variant::Legacy21,
    telemetry: FrameLayout {
        fields: &LEGACY_21_TELEMETRY,
        checksum_fields: &[0, 1, 2, 3, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    },
    command: FrameLayout {
        fields: &LEGACY_21_COMMAND,
        checksum_fields: &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
    },
};

static EXTENDED_25: Schema = Schema {
    variant: Variant::Extended25,
    telemetry: FrameLayout {
        fields: &EXTENDED_25_TELEMETRY,
        checksum_fields: &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16],
    },
    command: FrameLayout {
        fields: &EXTENDED_25_COMMAND,
        checksum_fields: &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    },
};

static LEGACY_21_TELEMETRY: [FieldSpec; 21] = [
    FieldSpec::new(0, "rightRpm", I16),
    FieldSpec::new(1, "leftRpm", I16),
    FieldSpec::new(2, "rightEncoder", I32),
    FieldSpec::new(3, "leftEncoder", I32),
    FieldSpec::new(4, "volt", Float),
    FieldSpec::new(5, "amp", Float),
    FieldSpec::new(6, "estop", I16),
    FieldSpec::new(7, "gpio1", I16),
    FieldSpec::new(8, "gpio2", I16),
    FieldSpec::new(9, "gpio3", I16),
    FieldSpec::new(10, "gpio4", I16),
    FieldSpec::new(11, "gpio5", I16),
    FieldSpec::new(12, "gpio6", I16),
    FieldSpec::new(13, "gpio7", I16),
    FieldSpec::new(14, "gpio8", I16),
    FieldSpec::new(15, "bump", I16),
    FieldSpec::new(16, "cliff", Float),
    FieldSpec::new(17, "ir", Float),
    FieldSpec::new(18, "yawVel", Float),
    FieldSpec::new(19, "yawHeading", Float),
    FieldSpec::new(20, "checksum", I16),
];

static LEGACY_21_COMMAND: [FieldSpec; 12] = [
    FieldSpec::new(0, "rightDesiredRpm", I16),
    FieldSpec::new(1, "leftDesiredRpm", I16),
    FieldSpec::new(2, "estop", I16),
    FieldSpec::new(3, "gpio1", I16),
    FieldSpec::new(4, "gpio2", I16),
    FieldSpec::new(5, "gpio3", I16),
    FieldSpec::new(6, "gpio4", I16),
    FieldSpec::new(7, "gpio5", I16),
    FieldSpec::new(8, "gpio6", I16),
    FieldSpec::new(9, "gpio7", I16),
    FieldSpec::new(10, "gpio8", I16),
    FieldSpec::new(11, "checksum", I16),
];

static EXTENDED_25_TELEMETRY: [FieldSpec; 25] = [
    FieldSpec::new(0, "rightRpm", I16),
    FieldSpec::new(1, "leftRpm", I16),
    FieldSpec::new(2, "rightEncoder", I32),
    FieldSpec::new(3, "leftEncoder", I32),
    FieldSpec::new(4, "led1", I16),
    FieldSpec::new(5, "led2", I16),
    FieldSpec::new(6, "led3", I16),
    FieldSpec::new(7, "led4", I16),
    FieldSpec::new(8, "gpio1", I16),
    FieldSpec::new(9, "gpio2", I16),
    FieldSpec::new(10, "gpio3", I16),
    FieldSpec::new(11, "gpio4", I16),
    FieldSpec::new(12, "adc1", I16),
    FieldSpec::new(13, "adc2", I16),
    FieldSpec::new(14, "estopStatus", I16),
    FieldSpec::new(15, "emergencyShutdown", I16),
    FieldSpec::new(16, "bump", I16),
    FieldSpec::new(17, "temperature", Float),
    FieldSpec::new(18, "volt", Float),
    FieldSpec::new(19, "amp", Float),
    FieldSpec::new(20, "cliff", Float),
    FieldSpec::new(21, "ir", Float),
    FieldSpec::new(22, "yawVel", Float),
    FieldSpec::new(23, "yawHeading", Float),
    FieldSpec::new(24, "checksum", I16),
];

static EXTENDED_25_COMMAND: [FieldSpec; 13] = [
    FieldSpec::new(0, "rightDesiredRpm", I16),
    FieldSpec::new(1, "leftDesiredRpm", I16),
    FieldSpec::new(2, "led1", I16),
    FieldSpec::new(3, "led2", I16),
    FieldSpec::new(4, "led3", I16),
    FieldSpec::new(5, "led4", I16),
    FieldSpec::new(6, "gpio1", I16),
    FieldSpec::new(7, "gpio2", I16),
    FieldSpec::new(8, "gpio3", I16),
    FieldSpec::new(9, "gpio4", I16),
    FieldSpec::new(10, "estop", I16),
    FieldSpec::new(11, "emergencyShutdown", I16),
    FieldSpec::new(12, "checksum", I16),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    #[test]
    fn every_layout_is_well_formed() {
        for variant in Variant::ALL {
            let schema = schema_for(variant);
            assert_eq!(schema.variant, variant);
            schema
                .telemetry
                .check()
                .unwrap_or_else(|err| panic!("{variant} telemetry: {err}"));
            schema
                .command
                .check()
                .unwrap_or_else(|err| panic!("{variant} command: {err}"));
        }
    }

    #[test]
    fn legacy_21_shape() {
        let schema = schema_for(Variant::Legacy21);
        assert_eq!(schema.field_count(), 21);
        assert_eq!(schema.checksum_fields().len(), 14);
        assert_eq!(schema.telemetry.checksum_field().name, "checksum");
        assert_eq!(schema.telemetry.field("bump").unwrap().index, 15);
        assert!(!schema.telemetry.is_summed(4));
        assert!(schema.telemetry.is_summed(15));
        assert_eq!(schema.command.field_count(), 12);
    }

    #[test]
    fn extended_25_shape() {
        let schema = schema_for(Variant::Extended25);
        assert_eq!(schema.field_count(), 25);
        assert_eq!(schema.checksum_fields(), (0..=16).collect::<Vec<usize>>().as_slice());
        assert_eq!(
            schema.telemetry.field("temperature").unwrap().kind,
            FieldKind::Float
        );
        assert_eq!(schema.command.field_count(), 13);
        assert!(schema.command.field("emergencyShutdown").is_some());
    }

    #[test]
    fn command_layouts_sum_every_value_field() {
        for variant in Variant::ALL {
            let command = schema_for(variant).command;
            let expected: Vec<usize> = (0..command.checksum_index()).collect();
            assert_eq!(command.checksum_fields, expected.as_slice());
        }
    }

    #[test]
    fn variant_parsing_accepts_aliases() {
        assert_eq!("legacy-21".parse::<Variant>().unwrap(), Variant::Legacy21);
        assert_eq!("Legacy".parse::<Variant>().unwrap(), Variant::Legacy21);
        assert_eq!("25".parse::<Variant>().unwrap(), Variant::Extended25);
        assert_eq!(
            "v3".parse::<Variant>(),
            Err(SchemaError::UnknownVariant("v3".to_string()))
        );
    }

    #[test]
    fn variant_serde_names() {
        let json = serde_json::to_string(&Variant::Extended25).unwrap();
        assert_eq!(json, "\"extended-25\"");
        let parsed: Variant = serde_json::from_str("\"legacy\"").unwrap();
        assert_eq!(parsed, Variant::Legacy21);
    }

    #[test]
    fn display_matches_name() {
        for variant in Variant::ALL {
            assert_eq!(variant.to_string().parse::<Variant>().unwrap(), variant);
        }
    }
}
