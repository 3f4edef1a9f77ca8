//! WhatsApp deep-links for customer follow-up.
//!
//! A deep-link opens a chat with the number pre-filled with a message. The
//! browser opens them; nothing is sent from the server.

use serde::{Deserialize, Serialize};

use sejuk_core::{OrderId, PhoneField, normalize_phone};

const WA_ME: &str = "https://wa.me";

/// A deep-link to one customer number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    /// Normalized digits-only number.
    pub number: String,
    pub url: String,
}

/// Follow-up message sent to the customer after a job is completed.
#[must_use]
pub fn completion_message(customer: &str, order_id: OrderId, technician: &str, time: &str) -> String {
    format!(
        "Hi {customer}, job {order_id} has been completed by Technician {technician} at {time}. \
         Please check and leave feedback. Thank you!"
    )
}

/// `wa.me` URL for a normalized number.
#[must_use]
pub fn deep_link_url(number: &str, message: &str) -> String {
    format!("{WA_ME}/{number}?text={}", urlencoding::encode(message))
}

/// One link per contact number that normalizes to something dialable.
#[must_use]
pub fn deep_links(phone: &PhoneField, message: &str, default_country_code: &str) -> Vec<DeepLink> {
    phone
        .contact_numbers()
        .iter()
        .filter_map(|raw| normalize_phone(raw, default_country_code))
        .map(|number| DeepLink {
            url: deep_link_url(&number, message),
            number,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wording() {
        let message = completion_message("Aminah", OrderId::new(7), "ali", "19/10/2026, 3:04:05 pm");
        assert_eq!(
            message,
            "Hi Aminah, job 7 has been completed by Technician ali at 19/10/2026, 3:04:05 pm. \
             Please check and leave feedback. Thank you!"
        );
    }

    #[test]
    fn test_url_is_percent_encoded() {
        assert_eq!(
            deep_link_url("60123456789", "Hi Aminah, done!"),
            "https://wa.me/60123456789?text=Hi%20Aminah%2C%20done%21"
        );
    }

    #[test]
    fn test_one_link_per_usable_number() {
        let phone = PhoneField::Many(vec![
            "012-345 6789".into(),
            "n/a".into(),
            "+44 20 7946 0958".into(),
        ]);
        let links = deep_links(&phone, "hello", "60");

        let numbers: Vec<_> = links.iter().map(|l| l.number.as_str()).collect();
        assert_eq!(numbers, vec!["60123456789", "442079460958"]);
        assert_eq!(links[0].url, "https://wa.me/60123456789?text=hello");
    }

    #[test]
    fn test_blank_phone_yields_nothing() {
        assert!(deep_links(&PhoneField::Single("   ".into()), "hello", "60").is_empty());
    }
}
