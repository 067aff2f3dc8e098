//! Address types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A postal address used for billing or as a shipping destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    /// State/province code (e.g., "CA").
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub postal_code: String,
    /// ISO country code (e.g., "US").
    #[serde(default)]
    pub country: String,
}

/// One editable field of an address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    FirstName,
    LastName,
    Street,
    City,
    Region,
    PostalCode,
    Country,
}

impl AddressField {
    pub const ALL: [AddressField; 7] = [
        AddressField::FirstName,
        AddressField::LastName,
        AddressField::Street,
        AddressField::City,
        AddressField::Region,
        AddressField::PostalCode,
        AddressField::Country,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressField::FirstName => "first name",
            AddressField::LastName => "last name",
            AddressField::Street => "street",
            AddressField::City => "city",
            AddressField::Region => "state",
            AddressField::PostalCode => "postal code",
            AddressField::Country => "country",
        }
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Address {
    /// Create a new address.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        street: impl Into<String>,
        city: impl Into<String>,
        region: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            street: street.into(),
            city: city.into(),
            region: region.into(),
            postal_code: postal_code.into(),
            country: country.into(),
        }
    }

    pub fn get(&self, field: AddressField) -> &str {
        match field {
            AddressField::FirstName => &self.first_name,
            AddressField::LastName => &self.last_name,
            AddressField::Street => &self.street,
            AddressField::City => &self.city,
            AddressField::Region => &self.region,
            AddressField::PostalCode => &self.postal_code,
            AddressField::Country => &self.country,
        }
    }

    pub fn set(&mut self, field: AddressField, value: impl Into<String>) {
        let slot = match field {
            AddressField::FirstName => &mut self.first_name,
            AddressField::LastName => &mut self.last_name,
            AddressField::Street => &mut self.street,
            AddressField::City => &mut self.city,
            AddressField::Region => &mut self.region,
            AddressField::PostalCode => &mut self.postal_code,
            AddressField::Country => &mut self.country,
        };
        *slot = value.into();
    }

    /// Fields that are blank (empty or whitespace only).
    pub fn missing_fields(&self) -> Vec<AddressField> {
        AddressField::ALL
            .into_iter()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }

    /// Check if every field is populated.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// True when no field has been filled in yet.
    pub fn is_blank(&self) -> bool {
        AddressField::ALL
            .into_iter()
            .all(|f| self.get(f).trim().is_empty())
    }

    /// Get full name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Format as single line.
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} {}, {}",
            self.street, self.city, self.region, self.postal_code, self.country
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Address {
        Address::new("Ada", "Lovelace", "1 Main St", "Seattle", "WA", "98101", "US")
    }

    #[test]
    fn test_complete_address() {
        let addr = sample();
        assert!(addr.is_complete());
        assert_eq!(addr.full_name(), "Ada Lovelace");
        assert_eq!(addr.one_line(), "1 Main St, Seattle, WA 98101, US");
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut addr = sample();
        addr.set(AddressField::City, "   ");
        addr.set(AddressField::PostalCode, "");
        assert_eq!(
            addr.missing_fields(),
            vec![AddressField::City, AddressField::PostalCode]
        );
        assert!(!addr.is_complete());
    }

    #[test]
    fn test_blank_default() {
        assert!(Address::default().is_blank());
        assert!(!sample().is_blank());
    }

    #[test]
    fn test_get_set_roundtrip_per_field() {
        let mut addr = Address::default();
        for field in AddressField::ALL {
            addr.set(field, field.as_str());
        }
        assert!(addr.is_complete());
        assert_eq!(addr.get(AddressField::Region), "state");
    }
}
