//! Price calculation for case configurations.
//!
//! A case costs a fixed base price plus a surcharge for a textured finish and
//! a surcharge for polycarbonate material, never less than a minimum floor.
//! The table is loaded once at startup and passed explicitly.

use serde::{Deserialize, Serialize};

use super::options::{CaseFinish, CaseMaterial, ConfigurationError, PriceOptions};
use super::price::Amount;

/// Static price table, all values in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub base: Amount,
    pub textured_surcharge: Amount,
    pub polycarbonate_surcharge: Amount,
    pub minimum: Amount,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            base: Amount::from_minor(4_000),
            textured_surcharge: Amount::from_minor(4_500),
            polycarbonate_surcharge: Amount::from_minor(20_000),
            minimum: Amount::from_minor(5_000),
        }
    }
}

impl PriceTable {
    /// Compute the price of a configuration.
    ///
    /// Deterministic and side-effect free; the result is never below
    /// [`PriceTable::minimum`].
    #[must_use]
    pub fn compute(&self, options: PriceOptions) -> Amount {
        let mut price = self.base;
        if options.finish == CaseFinish::Textured {
            price = price + self.textured_surcharge;
        }
        if options.material == CaseMaterial::Polycarbonate {
            price = price + self.polycarbonate_surcharge;
        }
        price.max(self.minimum)
    }

    /// Compute the price from stored option text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if material or finish is missing or not
    /// a known option.
    pub fn compute_stored(
        &self,
        material: Option<&str>,
        finish: Option<&str>,
    ) -> Result<Amount, ConfigurationError> {
        PriceOptions::from_stored(material, finish).map(|options| self.compute(options))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn options(material: CaseMaterial, finish: CaseFinish) -> PriceOptions {
        PriceOptions { material, finish }
    }

    #[test]
    fn test_textured_polycarbonate_adds_both_surcharges() {
        let table = PriceTable::default();
        let price = table.compute(options(CaseMaterial::Polycarbonate, CaseFinish::Textured));
        assert_eq!(price, Amount::from_minor(28_500));
    }

    #[test]
    fn test_every_combination_is_base_plus_surcharges_floored() {
        let table = PriceTable::default();
        for material in CaseMaterial::ALL {
            for finish in CaseFinish::ALL {
                let mut expected = table.base.minor();
                if *finish == CaseFinish::Textured {
                    expected += table.textured_surcharge.minor();
                }
                if *material == CaseMaterial::Polycarbonate {
                    expected += table.polycarbonate_surcharge.minor();
                }
                let expected = expected.max(table.minimum.minor());

                let price = table.compute(options(*material, *finish));
                assert_eq!(price.minor(), expected, "{material}/{finish}");
                assert!(price >= table.minimum);
            }
        }
    }

    #[test]
    fn test_minimum_floor_applies_to_plain_case() {
        let table = PriceTable::default();
        let price = table.compute(options(CaseMaterial::Silicone, CaseFinish::Smooth));
        assert_eq!(price, Amount::from_minor(5_000));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let table = PriceTable::default();
        let opts = options(CaseMaterial::Silicone, CaseFinish::Textured);
        assert_eq!(table.compute(opts), table.compute(opts));
    }

    #[test]
    fn test_custom_table_composes_additively() {
        let table = PriceTable {
            base: Amount::from_minor(100),
            textured_surcharge: Amount::from_minor(10),
            polycarbonate_surcharge: Amount::from_minor(1),
            minimum: Amount::from_minor(0),
        };
        let price = table.compute(options(CaseMaterial::Polycarbonate, CaseFinish::Textured));
        assert_eq!(price.minor(), 111);
    }

    #[test]
    fn test_stored_values_are_validated() {
        let table = PriceTable::default();
        assert_eq!(
            table.compute_stored(Some("polycarbonate"), Some("textured")),
            Ok(Amount::from_minor(28_500))
        );
        assert!(matches!(
            table.compute_stored(Some("leather"), Some("textured")),
            Err(ConfigurationError::InvalidOption { field: "material", .. })
        ));
        assert_eq!(
            table.compute_stored(Some("silicone"), None),
            Err(ConfigurationError::MissingOption("finish"))
        );
    }
}
