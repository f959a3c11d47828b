//! Case configuration options.
//!
//! Options are persisted as lowercase text (`"textured"`, `"iphone15"`, ...)
//! and parsed at the boundary. A stored value outside its enumeration is a
//! caller contract violation and surfaces as [`ConfigurationError`].

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors raised when a configuration's options cannot be used.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A value is not part of the option's enumeration.
    #[error("invalid {field}: {value:?}")]
    InvalidOption {
        /// Option name (e.g. `finish`).
        field: &'static str,
        /// The rejected value.
        value: String,
    },
    /// A price-relevant option has not been chosen yet.
    #[error("missing {0}")]
    MissingOption(&'static str),
}

macro_rules! case_option {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $text:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// Every variant, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Stored (lowercase) representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// Human-readable label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ConfigurationError::InvalidOption {
                        field: $field,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

case_option! {
    /// Case color.
    CaseColor, "color" {
        Black => "black", "Black";
        Blue => "blue", "Blue";
        Rose => "rose", "Rose";
    }
}

case_option! {
    /// Supported phone model.
    PhoneModel, "model" {
        IphoneX => "iphonex", "iPhone X";
        Iphone11 => "iphone11", "iPhone 11";
        Iphone12 => "iphone12", "iPhone 12";
        Iphone13 => "iphone13", "iPhone 13";
        Iphone14 => "iphone14", "iPhone 14";
        Iphone15 => "iphone15", "iPhone 15";
    }
}

case_option! {
    /// Case material.
    CaseMaterial, "material" {
        Silicone => "silicone", "Silicone";
        Polycarbonate => "polycarbonate", "Soft Polycarbonate";
    }
}

case_option! {
    /// Case surface finish.
    CaseFinish, "finish" {
        Smooth => "smooth", "Smooth Finish";
        Textured => "textured", "Textured Finish";
    }
}

impl CaseColor {
    /// sRGB swatch used when rendering receipts.
    #[must_use]
    pub const fn rgb(self) -> [u8; 3] {
        match self {
            Self::Black => [0x18, 0x18, 0x1b],
            Self::Blue => [0x17, 0x25, 0x54],
            Self::Rose => [0x4c, 0x05, 0x19],
        }
    }
}

/// The price-relevant subset of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceOptions {
    pub material: CaseMaterial,
    pub finish: CaseFinish,
}

impl PriceOptions {
    /// Build price options from stored, possibly absent, text values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingOption`] if material or finish
    /// has not been chosen, or [`ConfigurationError::InvalidOption`] if a
    /// stored value is not a known option.
    pub fn from_stored(
        material: Option<&str>,
        finish: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        let material = material
            .ok_or(ConfigurationError::MissingOption("material"))?
            .parse()?;
        let finish = finish
            .ok_or(ConfigurationError::MissingOption("finish"))?
            .parse()?;
        Ok(Self { material, finish })
    }
}
