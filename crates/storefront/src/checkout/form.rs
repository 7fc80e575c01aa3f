//! Checkout form and field validation.

use std::collections::BTreeMap;
use std::fmt;

use royshop_core::{PhoneError, PhoneNumber, Price, Wilaya};

use super::cooldown::CooldownStatus;

/// Customer-entered delivery details, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub phone: String,
    /// Province name or code.
    pub wilaya: String,
    pub municipality: String,
    pub address: String,
}

/// A checkout field (or whole-form condition) that can carry an error.
///
/// Ordered in form order so errors render top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckoutField {
    CustomerName,
    Phone,
    Wilaya,
    Municipality,
    Address,
    Cart,
    Cooldown,
}

impl fmt::Display for CheckoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CustomerName => "name",
            Self::Phone => "phone",
            Self::Wilaya => "province",
            Self::Municipality => "municipality",
            Self::Address => "address",
            Self::Cart => "cart",
            Self::Cooldown => "submission",
        };
        f.write_str(label)
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<CheckoutField, String>);

impl FieldErrors {
    fn insert(&mut self, field: CheckoutField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    #[must_use]
    pub fn get(&self, field: CheckoutField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Errors in form order.
    pub fn iter(&self) -> impl Iterator<Item = (CheckoutField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

/// A form that passed validation, with normalised values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCheckout {
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub wilaya: &'static Wilaya,
    pub municipality: String,
    pub address: String,
}

impl ValidatedCheckout {
    /// Flat delivery cost to the chosen province.
    #[must_use]
    pub fn shipping_cost(&self) -> Price {
        self.wilaya.shipping_cost()
    }

    /// Cart total plus delivery.
    #[must_use]
    pub fn grand_total(&self, cart_total: Price) -> Price {
        cart_total.saturating_add(self.shipping_cost())
    }
}

/// Validate a checkout submission.
///
/// Every rule is checked so the customer sees all problems at once. The
/// form itself is never modified.
///
/// # Errors
///
/// Returns the collected [`FieldErrors`] if any rule fails.
pub fn validate(
    form: &CheckoutForm,
    cart_is_empty: bool,
    cooldown: CooldownStatus,
) -> Result<ValidatedCheckout, FieldErrors> {
    let mut errors = FieldErrors::default();

    let customer_name = form.customer_name.trim();
    if customer_name.is_empty() {
        errors.insert(CheckoutField::CustomerName, "Name is required");
    }

    let phone = match PhoneNumber::parse(&form.phone) {
        Ok(phone) => Some(phone),
        Err(PhoneError::Empty) => {
            errors.insert(CheckoutField::Phone, "Phone number is required");
            None
        }
        Err(PhoneError::InvalidFormat) => {
            errors.insert(
                CheckoutField::Phone,
                "Invalid phone format. Must start with 05/06/07 and be 10 digits",
            );
            None
        }
    };

    let wilaya = if form.wilaya.trim().is_empty() {
        errors.insert(CheckoutField::Wilaya, "Province is required");
        None
    } else {
        let found = Wilaya::find(&form.wilaya);
        if found.is_none() {
            errors.insert(
                CheckoutField::Wilaya,
                format!("Unknown province '{}'", form.wilaya.trim()),
            );
        }
        found
    };

    let municipality = form.municipality.trim();
    if municipality.is_empty() {
        errors.insert(CheckoutField::Municipality, "City/Municipality is required");
    }

    let address = form.address.trim();
    if address.is_empty() {
        errors.insert(CheckoutField::Address, "Delivery address is required");
    }

    if cart_is_empty {
        errors.insert(
            CheckoutField::Cart,
            "Cart is empty. Please add items before checkout",
        );
    }

    if let CooldownStatus::Active { remaining_secs } = cooldown {
        errors.insert(
            CheckoutField::Cooldown,
            format!("Please wait {remaining_secs} seconds before placing another order"),
        );
    }

    match (phone, wilaya) {
        (Some(phone), Some(wilaya)) if errors.is_empty() => Ok(ValidatedCheckout {
            customer_name: customer_name.to_string(),
            phone,
            wilaya,
            municipality: municipality.to_string(),
            address: address.to_string(),
        }),
        _ => Err(errors),
    }
}
