use super::{required, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[0-9]{11}$").expect("Invalid phone regex"));
static ZIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("Invalid zip regex"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

/// Recipient and address of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

impl Delivery {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        matches("phone", &self.phone, &PHONE, "must be + followed by 11 digits")?;
        matches("zip", &self.zip, &ZIP, "must be 6 digits")?;
        required("city", &self.city)?;
        required("address", &self.address)?;
        required("region", &self.region)?;
        matches("email", &self.email, &EMAIL, "must be a valid email address")?;
        Ok(())
    }
}

fn matches(field: &str, value: &str, pattern: &Regex, reason: &str) -> Result<(), ValidationError> {
    required(field, value)?;
    if !pattern.is_match(value) {
        return Err(ValidationError::new(field, reason));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> Delivery {
        Delivery {
            name: "Test Testov".to_string(),
            phone: "+97200000000".to_string(),
            zip: "263980".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        }
    }

    #[test]
    fn test_valid_delivery() {
        assert!(delivery().validate().is_ok());
    }

    #[test]
    fn test_phone_format() {
        // Only ASCII digits count; Arabic-Indic digits are rejected.
        for phone in [
            "97200000000",
            "+9720000000",
            "+972000000001",
            "+9720000000a",
            "+١٢٣٤٥٦٧٨٩٠١",
        ] {
            let d = Delivery { phone: phone.to_string(), ..delivery() };
            let err = d.validate().unwrap_err();
            assert_eq!(err.field, "phone", "phone {phone:?} should be rejected");
        }
    }

    #[test]
    fn test_zip_and_email_format() {
        let d = Delivery { zip: "12345".to_string(), ..delivery() };
        assert_eq!(d.validate().unwrap_err().field, "zip");

        let d = Delivery { email: "not-an-email".to_string(), ..delivery() };
        assert_eq!(d.validate().unwrap_err().field, "email");
    }

    #[test]
    fn test_blank_fields_rejected() {
        let d = Delivery { region: "  ".to_string(), ..delivery() };
        let err = d.validate().unwrap_err();
        assert_eq!(err.field, "region");
        assert_eq!(err.reason, "cannot be blank");
    }
}
