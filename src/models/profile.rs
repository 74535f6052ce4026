use serde::{Deserialize, Serialize};

/// Extended user-editable record returned by `GET /api/user-profile/`.
///
/// The service serializes nearly every field as nullable, so almost
/// everything here is an `Option`. Timestamps are kept as the wire
/// strings; nothing in the client does arithmetic on them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Profile {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub about: Option<String>,
    /// Absolute URL to the avatar image, or None when unset.
    pub avatar: Option<String>,
    pub phone_number: Option<String>,
    /// Selected country code, one of `country_choices`.
    pub countries: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub country_choices: Vec<CountryChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CountryChoice {
    pub code: String,
    pub name: String,
}

impl Profile {
    /// Resolve the selected country code against the choice list.
    pub fn country_name(&self) -> Option<&str> {
        let code = self.countries.as_deref()?;
        self.country_choices
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.name.as_str())
    }
}

/// Writable text fields for `PUT /api/user-profile/text/`.
/// Unset fields are omitted from the request body so the server
/// leaves them untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProfileTextUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countries: Option<String>,
}
