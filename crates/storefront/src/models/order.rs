//! Order, configuration and address types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use casecrafters_core::{
    AddressId, Amount, CaseColor, ConfigurationError, ConfigurationId, CurrencyCode,
    FulfillmentStatus, OrderId, PhoneModel, Price, PriceOptions, UserId,
};

/// A saved case configuration (read-only at checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub id: ConfigurationId,
    /// Uploaded image width in pixels.
    pub width: i32,
    /// Uploaded image height in pixels.
    pub height: i32,
    pub image_url: String,
    pub cropped_image_url: Option<String>,
    pub color: Option<String>,
    pub model: Option<String>,
    pub material: Option<String>,
    pub finish: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Configuration {
    /// The price-relevant options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if material or finish is missing or unknown.
    pub fn price_options(&self) -> Result<PriceOptions, ConfigurationError> {
        PriceOptions::from_stored(self.material.as_deref(), self.finish.as_deref())
    }

    /// The case color, if chosen.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the stored color is unknown.
    pub fn case_color(&self) -> Result<Option<CaseColor>, ConfigurationError> {
        self.color.as_deref().map(str::parse).transpose()
    }

    /// The phone model, if chosen.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the stored model is unknown.
    pub fn phone_model(&self) -> Result<Option<PhoneModel>, ConfigurationError> {
        self.model.as_deref().map(str::parse).transpose()
    }

    /// Image to show for the finished case: the crop if present, else the upload.
    #[must_use]
    pub fn preview_image_url(&self) -> &str {
        self.cropped_image_url.as_deref().unwrap_or(&self.image_url)
    }
}

/// An order for one configuration by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub configuration_id: ConfigurationId,
    /// Fixed at creation, in minor currency units.
    pub amount: Amount,
    /// Flipped only by the payment confirmation path.
    pub is_paid: bool,
    pub status: FulfillmentStatus,
    pub shipping_address_id: Option<AddressId>,
    pub billing_address_id: Option<AddressId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A shipping or billing address collected by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub state: Option<String>,
    pub phone_number: Option<String>,
}

/// Full view of a paid order: what the thank-you page, the order details page
/// and the receipt render from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProjection {
    #[serde(flatten)]
    pub order: Order,
    /// Amount formatted in the checkout currency (e.g. `₹285.00`).
    pub display_amount: String,
    pub configuration: Configuration,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
}

impl OrderProjection {
    /// Assemble a projection, formatting the amount in `currency`.
    #[must_use]
    pub fn new(
        order: Order,
        configuration: Configuration,
        shipping_address: Option<Address>,
        billing_address: Option<Address>,
        currency: CurrencyCode,
    ) -> Self {
        let display_amount = Price::new(order.amount, currency).display();
        Self {
            order,
            display_amount,
            configuration,
            shipping_address,
            billing_address,
        }
    }
}

/// Dashboard row: a paid order with its configuration and shipping address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub display_amount: String,
    pub status_label: &'static str,
    pub configuration: Configuration,
    pub shipping_address: Option<Address>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn configuration(material: Option<&str>, finish: Option<&str>) -> Configuration {
        Configuration {
            id: ConfigurationId::generate(),
            width: 1080,
            height: 1920,
            image_url: "https://cdn.casecrafters.in/u/original.png".to_string(),
            cropped_image_url: Some("https://cdn.casecrafters.in/u/cropped.png".to_string()),
            color: Some("rose".to_string()),
            model: Some("iphone15".to_string()),
            material: material.map(String::from),
            finish: finish.map(String::from),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn order(configuration: &Configuration, user_id: &UserId, amount: i64) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::generate(),
            user_id: user_id.clone(),
            configuration_id: configuration.id,
            amount: Amount::from_minor(amount),
            is_paid: false,
            status: FulfillmentStatus::AwaitingShipment,
            shipping_address_id: None,
            billing_address_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_configuration_option_accessors() {
        let config = configuration(Some("polycarbonate"), Some("textured"));
        assert_eq!(config.case_color().unwrap(), Some(CaseColor::Rose));
        assert_eq!(config.phone_model().unwrap(), Some(PhoneModel::Iphone15));
        assert!(config.price_options().is_ok());
        assert_eq!(config.preview_image_url(), "https://cdn.casecrafters.in/u/cropped.png");
    }

    #[test]
    fn test_configuration_with_bad_color_is_invalid() {
        let mut config = configuration(Some("silicone"), Some("smooth"));
        config.color = Some("green".to_string());
        assert!(config.case_color().is_err());
    }

    #[test]
    fn test_projection_serializes_flat_camel_case() {
        let config = configuration(Some("polycarbonate"), Some("textured"));
        let order = order(&config, &UserId::new("kp_1"), 28_500);
        let projection = OrderProjection::new(order, config, None, None, CurrencyCode::INR);

        let json = serde_json::to_value(&projection).unwrap();
        assert_eq!(json["amount"], 28_500);
        assert_eq!(json["isPaid"], false);
        assert_eq!(json["status"], "awaiting_shipment");
        assert_eq!(json["displayAmount"], "₹285.00");
        assert_eq!(json["configuration"]["finish"], "textured");

        let back: OrderProjection = serde_json::from_value(json).unwrap();
        assert_eq!(back, projection);
    }
}
