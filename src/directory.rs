//! Emergency contact and university resource lookups shown in the sidebar.

use crate::api::{ContactCategory, ContactsRequest, ContactsResponse, UniversityResponse};
use crate::markdown::{self, MarkdownLine};
use serde_json::Value;

pub const SELECT_LOCATION: &str = "Please select both a country and a city.";
pub const UNIVERSITY_NOT_FOUND: &str = "University not found or no resources available.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Output {
    #[default]
    Empty,
    Loading,
    Message(String),
    Markdown(Vec<MarkdownLine>),
}

impl Output {
    fn markdown(text: &str) -> Self {
        Self::Markdown(markdown::to_lines(text))
    }
}

#[derive(Debug, Default)]
pub struct Directory {
    countries: Vec<String>,
    cities: Vec<String>,
    country: Option<String>,
    city: Option<String>,
    countries_error: Option<String>,
    cities_error: Option<String>,
    contacts: Output,
    contacts_pending: Option<ContactsRequest>,
    pub university_query: String,
    university: Output,
    university_pending: Option<String>,
}

impl Directory {
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn countries_error(&self) -> Option<&str> {
        self.countries_error.as_deref()
    }

    pub fn cities_error(&self) -> Option<&str> {
        self.cities_error.as_deref()
    }

    pub fn contacts(&self) -> &Output {
        &self.contacts
    }

    pub fn university(&self) -> &Output {
        &self.university
    }

    pub fn apply_countries(&mut self, result: Result<Vec<String>, String>) {
        match result {
            Ok(countries) => {
                self.countries = countries;
                self.countries_error = None;
            }
            Err(_) => {
                self.countries.clear();
                self.countries_error = Some("Error loading countries".to_string());
            }
        }
    }

    /// Changes the selected country. Returns the country whose cities must be
    /// fetched, if any.
    pub fn select_country(&mut self, country: Option<String>) -> Option<String> {
        if self.country == country {
            return None;
        }
        self.country = country;
        self.city = None;
        self.cities.clear();
        self.cities_error = None;
        self.clear_contacts();
        self.country.clone()
    }

    pub fn apply_cities(&mut self, country: &str, result: Result<Vec<String>, String>) {
        if self.country.as_deref() != Some(country) {
            return;
        }
        match result {
            Ok(cities) => {
                self.cities = cities;
                self.cities_error = None;
            }
            Err(_) => {
                self.cities.clear();
                self.cities_error = Some("Error loading cities".to_string());
            }
        }
    }

    pub fn select_city(&mut self, city: Option<String>) {
        if self.city == city {
            return;
        }
        self.city = city;
        self.clear_contacts();
    }

    fn clear_contacts(&mut self) {
        self.contacts = Output::Empty;
        self.contacts_pending = None;
    }

    /// Builds the contacts request, or explains what is missing.
    pub fn request_contacts(&mut self, category: ContactCategory) -> Option<ContactsRequest> {
        let (Some(country), Some(city)) = (self.country.clone(), self.city.clone()) else {
            self.contacts = Output::Message(SELECT_LOCATION.to_string());
            self.contacts_pending = None;
            return None;
        };
        let request = ContactsRequest {
            country,
            city,
            category,
        };
        self.contacts = Output::Loading;
        self.contacts_pending = Some(request.clone());
        Some(request)
    }

    /// Shows the reply only if it answers the request still on screen.
    pub fn apply_contacts(
        &mut self,
        request: &ContactsRequest,
        result: Result<ContactsResponse, String>,
    ) {
        if self.contacts_pending.as_ref() != Some(request) {
            tracing::debug!(
                country = %request.country,
                city = %request.city,
                "dropping contacts reply for a previous selection"
            );
            return;
        }
        self.contacts_pending = None;
        self.contacts = match result {
            Ok(ContactsResponse {
                error: Some(error), ..
            }) => Output::Message(format!("Error: {error}")),
            Ok(ContactsResponse {
                contacts_markdown: Some(markdown),
                ..
            }) => Output::markdown(&markdown),
            Ok(_) => Output::Message("No information found.".to_string()),
            Err(_) => Output::Message("Error fetching contacts. Please try again.".to_string()),
        };
    }

    /// Returns the trimmed university name to look up, if any.
    pub fn request_university(&mut self) -> Option<String> {
        let name = self.university_query.trim();
        if name.is_empty() {
            return None;
        }
        let name = name.to_string();
        self.university = Output::Loading;
        self.university_pending = Some(name.clone());
        Some(name)
    }

    /// Matches the reply against the name that was sent, not the editable
    /// query box.
    pub fn apply_university(&mut self, name: &str, result: Result<UniversityResponse, String>) {
        if self.university_pending.as_deref() != Some(name) {
            tracing::debug!(university = %name, "dropping stale university reply");
            return;
        }
        self.university_pending = None;
        self.university = match result {
            Ok(UniversityResponse {
                error: Some(error), ..
            }) => Output::Message(format!("Error: {error}")),
            Ok(response) if response.resources.is_empty() => {
                Output::Message(UNIVERSITY_NOT_FOUND.to_string())
            }
            Ok(response) => Output::markdown(&resources_markdown(name, &response)),
            Err(message) => Output::Message(message),
        };
    }
}

/// Lays out a resources object as a markdown section per key.
fn resources_markdown(name: &str, response: &UniversityResponse) -> String {
    let mut out = format!("### Resources for {name}\n\n");
    for (key, value) in &response.resources {
        let title = key.replace('_', " ");
        match value {
            Value::Array(items) => {
                out.push_str(&format!("**{title}**\n\n"));
                for item in items {
                    out.push_str(&format!("- {}\n", value_text(item)));
                }
                out.push('\n');
            }
            Value::Object(fields) => {
                out.push_str(&format!("**{title}**\n\n"));
                for (field, item) in fields {
                    out.push_str(&format!("- {}: {}\n", field.replace('_', " "), value_text(item)));
                }
                out.push('\n');
            }
            other => out.push_str(&format!("**{title}**: {}\n\n", value_text(other))),
        }
    }
    out
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| format!("{key}: {}", value_text(value)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contacts_require_country_and_city() {
        let mut directory = Directory::default();
        assert!(directory.request_contacts(ContactCategory::Doctors).is_none());
        assert_eq!(
            directory.contacts(),
            &Output::Message(SELECT_LOCATION.to_string())
        );

        directory.select_country(Some("India".to_string()));
        assert!(directory.request_contacts(ContactCategory::Doctors).is_none());

        directory.select_city(Some("Chennai".to_string()));
        let request = directory
            .request_contacts(ContactCategory::Helplines)
            .expect("both selected");
        assert_eq!(request.country, "India");
        assert_eq!(request.city, "Chennai");
        assert_eq!(directory.contacts(), &Output::Loading);
    }

    #[test]
    fn changing_country_resets_city_and_output() {
        let mut directory = Directory::default();
        assert_eq!(
            directory.select_country(Some("India".to_string())).as_deref(),
            Some("India")
        );
        directory.apply_cities("India", Ok(vec!["Chennai".to_string()]));
        directory.select_city(Some("Chennai".to_string()));
        let request = directory
            .request_contacts(ContactCategory::Helplines)
            .expect("both selected");
        directory.apply_contacts(
            &request,
            Ok(ContactsResponse {
                contacts_markdown: Some("**Vandrevala**".to_string()),
                error: None,
            }),
        );
        assert!(matches!(directory.contacts(), Output::Markdown(_)));

        assert_eq!(directory.select_country(Some("India".to_string())), None);
        directory.select_country(Some("Japan".to_string()));
        assert!(directory.city().is_none());
        assert!(directory.cities().is_empty());
        assert_eq!(directory.contacts(), &Output::Empty);
    }

    #[test]
    fn cities_for_a_stale_country_are_ignored() {
        let mut directory = Directory::default();
        directory.select_country(Some("India".to_string()));
        directory.select_country(Some("Japan".to_string()));
        directory.apply_cities("India", Ok(vec!["Chennai".to_string()]));
        assert!(directory.cities().is_empty());
    }

    fn located(country: &str, city: &str) -> Directory {
        let mut directory = Directory::default();
        directory.select_country(Some(country.to_string()));
        directory.apply_cities(country, Ok(vec![city.to_string()]));
        directory.select_city(Some(city.to_string()));
        directory
    }

    #[test]
    fn contact_errors_are_shown_as_messages() {
        let mut directory = located("India", "Chennai");
        let request = directory
            .request_contacts(ContactCategory::Doctors)
            .expect("both selected");
        directory.apply_contacts(
            &request,
            Ok(ContactsResponse {
                contacts_markdown: None,
                error: Some("Failed to retrieve contacts.".to_string()),
            }),
        );
        assert_eq!(
            directory.contacts(),
            &Output::Message("Error: Failed to retrieve contacts.".to_string())
        );

        let request = directory
            .request_contacts(ContactCategory::Doctors)
            .expect("both selected");
        directory.apply_contacts(&request, Err("connection refused".to_string()));
        assert_eq!(
            directory.contacts(),
            &Output::Message("Error fetching contacts. Please try again.".to_string())
        );
    }

    #[test]
    fn country_load_failure_is_flagged() {
        let mut directory = Directory::default();
        directory.apply_countries(Err("timeout".to_string()));
        assert_eq!(directory.countries_error(), Some("Error loading countries"));
        directory.apply_countries(Ok(vec!["India".to_string()]));
        assert!(directory.countries_error().is_none());
        assert_eq!(directory.countries().to_vec(), vec!["India".to_string()]);
    }

    #[test]
    fn university_resources_render_as_markdown() {
        let mut directory = Directory::default();
        directory.university_query = "  Anna University ".to_string();
        assert_eq!(
            directory.request_university().as_deref(),
            Some("Anna University")
        );

        let response: UniversityResponse = serde_json::from_value(json!({
            "resources": {
                "counseling_center": { "phone": "044-2235", "hours": "9-5" },
                "helplines": ["Campus line", "Peer support"]
            }
        }))
        .expect("fixture should decode");
        directory.apply_university("Anna University", Ok(response));

        let Output::Markdown(lines) = directory.university() else {
            panic!("expected markdown output");
        };
        let text: Vec<String> = lines.iter().map(|line| line.plain_text()).collect();
        assert_eq!(text[0], "Resources for Anna University");
        assert!(text.iter().any(|line| line == "phone: 044-2235"));
        assert!(text.iter().any(|line| line == "Peer support"));
    }

    #[test]
    fn contacts_for_a_previous_country_are_dropped() {
        let mut directory = located("India", "Chennai");
        let request = directory
            .request_contacts(ContactCategory::Helplines)
            .expect("both selected");

        directory.select_country(Some("Japan".to_string()));
        directory.apply_contacts(
            &request,
            Ok(ContactsResponse {
                contacts_markdown: Some("### Emergency Contacts for Chennai, India".to_string()),
                error: None,
            }),
        );

        assert_eq!(directory.country(), Some("Japan"));
        assert!(directory.city().is_none());
        assert_eq!(directory.contacts(), &Output::Empty);
    }

    #[test]
    fn contacts_for_a_superseded_category_are_dropped() {
        let mut directory = located("India", "Chennai");
        let helplines = directory
            .request_contacts(ContactCategory::Helplines)
            .expect("both selected");
        let doctors = directory
            .request_contacts(ContactCategory::Doctors)
            .expect("both selected");

        directory.apply_contacts(
            &helplines,
            Ok(ContactsResponse {
                contacts_markdown: Some("helplines".to_string()),
                error: None,
            }),
        );
        assert_eq!(directory.contacts(), &Output::Loading);

        directory.apply_contacts(
            &doctors,
            Ok(ContactsResponse {
                contacts_markdown: Some("doctors".to_string()),
                error: None,
            }),
        );
        let Output::Markdown(lines) = directory.contacts() else {
            panic!("expected markdown output");
        };
        assert_eq!(lines[0].plain_text(), "doctors");
    }

    #[test]
    fn university_reply_matches_the_name_sent_not_the_edited_query() {
        let mut directory = Directory::default();
        directory.university_query = "Anna University".to_string();
        let name = directory.request_university().expect("query is set");

        directory.university_query = "Anna Univ".to_string();
        directory.apply_university(&name, Err(UNIVERSITY_NOT_FOUND.to_string()));

        assert_eq!(
            directory.university(),
            &Output::Message(UNIVERSITY_NOT_FOUND.to_string())
        );
    }

    #[test]
    fn superseded_university_lookup_is_dropped() {
        let mut directory = Directory::default();
        directory.university_query = "Anna University".to_string();
        let first = directory.request_university().expect("query is set");
        directory.university_query = "IIT Madras".to_string();
        directory.request_university().expect("query is set");

        directory.apply_university(&first, Err(UNIVERSITY_NOT_FOUND.to_string()));
        assert_eq!(directory.university(), &Output::Loading);
    }

    #[test]
    fn blank_university_query_is_ignored() {
        let mut directory = Directory::default();
        directory.university_query = "   ".to_string();
        assert!(directory.request_university().is_none());
        assert_eq!(directory.university(), &Output::Empty);
    }
}
