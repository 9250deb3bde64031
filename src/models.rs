use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ============================================================================
// Search Request
// ============================================================================

/// One travel search as collected by the (external) form layer.
///
/// The orchestrator does not validate field semantics; everything here only
/// has to flatten into query pairs for the stream URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depart_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
}

impl SearchRequest {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    /// Flat key/value pairs for the stream URL, empty optionals omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("origin", self.origin.clone()),
            ("destination", self.destination.clone()),
        ];
        if let Some(date) = self.depart_date {
            pairs.push(("depart_date", date.to_string()));
        }
        if let Some(date) = self.return_date {
            pairs.push(("return_date", date.to_string()));
        }
        if let Some(budget) = self.budget {
            pairs.push(("budget", budget.to_string()));
        }
        if let Some(preferences) = &self.preferences {
            pairs.push(("preferences", preferences.clone()));
        }
        pairs
    }
}

// ============================================================================
// Flight Offers
// ============================================================================

/// One structured offer extracted from the completion payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub airline: String,
    pub departure: String,
    pub price: String,
}

/// Offer lines look like `- United departing 2026-04-17 02:00 for 1131.0€`.
fn offer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-\s+(.+?)\s+departing\s+(.+?)\s+for\s+(.+?)€").unwrap())
}

/// Pull structured offers out of the completion payload so the rendering
/// layer can show more than raw text. Lines that do not match the offer
/// shape are ignored.
pub fn extract_flight_offers(text: &str) -> Vec<FlightOffer> {
    offer_pattern()
        .captures_iter(text)
        .map(|caps| FlightOffer {
            airline: caps[1].trim().to_string(),
            departure: caps[2].trim().to_string(),
            price: caps[3].trim().to_string(),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_minimal_request() {
        let request = SearchRequest::new("Paris", "Tokyo");
        assert_eq!(
            request.query_pairs(),
            vec![
                ("origin", "Paris".to_string()),
                ("destination", "Tokyo".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_full_request() {
        let request = SearchRequest {
            origin: "Paris".to_string(),
            destination: "Tokyo".to_string(),
            depart_date: "2026-04-17".parse().ok(),
            return_date: "2026-05-02".parse().ok(),
            budget: Some(1200),
            preferences: Some("window seat".to_string()),
        };

        let pairs = request.query_pairs();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.contains(&("depart_date", "2026-04-17".to_string())));
        assert!(pairs.contains(&("budget", "1200".to_string())));
        assert!(pairs.contains(&("preferences", "window seat".to_string())));
    }

    #[test]
    fn test_extract_offers_from_payload() {
        let payload = "<ul>\n\
            <li>- Air Nova departing 2026-04-17 08:15 for 420.0€</li>\n\
            <li>some unrelated line</li>\n\
            <li>- United departing 2026-04-17 02:00 for 1131.0€</li>\n\
            </ul>";

        let offers = extract_flight_offers(payload);
        assert_eq!(
            offers,
            vec![
                FlightOffer {
                    airline: "Air Nova".to_string(),
                    departure: "2026-04-17 08:15".to_string(),
                    price: "420.0".to_string(),
                },
                FlightOffer {
                    airline: "United".to_string(),
                    departure: "2026-04-17 02:00".to_string(),
                    price: "1131.0".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_extract_offers_ignores_plain_text() {
        assert!(extract_flight_offers("no offers were found today").is_empty());
    }
}
