//! List queries and the filter manifests that describe them.
//!
//! A [`Query`] is the declarative request a list screen wants answered: page,
//! page size and a set of filter values. A [`FilterManifest`] declares which
//! filters a screen offers, how operator input is parsed into typed values and
//! which of them end up in the outgoing request.
//!
//! ```rust
//! use engine::query::{FilterValue, Query};
//!
//! let mut query = Query::new(10);
//! query.set_page(3);
//! query.set_filter("status", Some(FilterValue::from("active")));
//! assert_eq!(query.page_number(), 1);
//!
//! query.set_filter("status", Some(FilterValue::from("")));
//! assert!(query.filters().is_empty());
//! ```
use std::collections::BTreeMap;

use api_types::reference::ReferenceKind;
use chrono::NaiveDate;
use serde::{Serialize, Serializer, ser::SerializeMap};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Typed value of a single filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
}

impl FilterValue {
    /// Blank text carries no constraint and is never sent.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    pub fn to_param(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Boolean(value) => value.to_string(),
            Self::Date(date) => date.format(DATE_FORMAT).to_string(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Page, page size and filters of one list request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    page_number: u32,
    page_size: u32,
    filters: BTreeMap<String, FilterValue>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Query {
    /// First page with no filters. A zero page size falls back to the default.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
            filters: BTreeMap::new(),
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn filter(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key)
    }

    /// Sets or removes a filter and moves back to the first page.
    ///
    /// `None` and blank text both remove the key.
    pub fn set_filter(&mut self, key: impl Into<String>, value: Option<FilterValue>) {
        let key = key.into();
        match value {
            Some(value) if !value.is_blank() => {
                self.filters.insert(key, value);
            }
            _ => {
                self.filters.remove(&key);
            }
        }
        self.page_number = 1;
    }

    /// Page numbers start at 1; 0 is clamped.
    pub fn set_page(&mut self, page_number: u32) {
        self.page_number = page_number.max(1);
    }

    /// Changes the page size and moves back to the first page.
    pub fn set_page_size(&mut self, page_size: u32) {
        if page_size > 0 {
            self.page_size = page_size;
            self.page_number = 1;
        }
    }

    /// Outgoing request parameters: paging first, then every filter.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = self.paging_params();
        params.extend(
            self.filters
                .iter()
                .map(|(key, value)| (key.clone(), value.to_param())),
        );
        params
    }

    fn paging_params(&self) -> Vec<(String, String)> {
        vec![
            ("pageNumber".to_string(), self.page_number.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ]
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.filters.len()))?;
        map.serialize_entry("pageNumber", &self.page_number)?;
        map.serialize_entry("pageSize", &self.page_size)?;
        for (key, value) in &self.filters {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// How a filter field reads operator input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Text,
    Integer,
    Boolean,
    /// `YYYY-MM-DD`.
    Date,
    /// One of a fixed set of wire values.
    Choice(&'static [&'static str]),
    /// Id of a cached reference option.
    Reference(ReferenceKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterField {
    /// Wire name of the parameter.
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FilterKind,
}

impl FilterField {
    pub const fn new(key: &'static str, label: &'static str, kind: FilterKind) -> Self {
        Self { key, label, kind }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterParseError {
    #[error("unknown filter \"{0}\"")]
    UnknownField(String),
    #[error("{label}: {reason}")]
    Invalid { label: &'static str, reason: String },
}

/// Declares the filters one list screen offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterManifest {
    fields: &'static [FilterField],
}

impl FilterManifest {
    pub const fn new(fields: &'static [FilterField]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [FilterField] {
        self.fields
    }

    pub fn field(&self, key: &str) -> Option<&'static FilterField> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Request parameters for `query`.
    ///
    /// Paging comes first, then the declared filters in manifest order.
    /// Values for undeclared keys are dropped.
    pub fn build_params(&self, query: &Query) -> Vec<(String, String)> {
        let mut params = query.paging_params();
        for field in self.fields {
            if let Some(value) = query.filter(field.key) {
                params.push((field.key.to_string(), value.to_param()));
            }
        }
        params
    }

    /// Parses raw operator input for `key`.
    ///
    /// Blank input yields `Ok(None)`, which clears the filter.
    pub fn parse(&self, key: &str, raw: &str) -> Result<Option<FilterValue>, FilterParseError> {
        let field = self
            .field(key)
            .ok_or_else(|| FilterParseError::UnknownField(key.to_string()))?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let invalid = |reason: String| FilterParseError::Invalid {
            label: field.label,
            reason,
        };

        let value = match field.kind {
            FilterKind::Text => FilterValue::Text(raw.to_string()),
            FilterKind::Integer | FilterKind::Reference(_) => raw
                .parse::<i64>()
                .map(FilterValue::Integer)
                .map_err(|_| invalid(format!("\"{raw}\" is not a whole number")))?,
            FilterKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => FilterValue::Boolean(true),
                "false" | "no" | "0" => FilterValue::Boolean(false),
                _ => return Err(invalid(format!("\"{raw}\" is not yes/no"))),
            },
            FilterKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(FilterValue::Date)
                .map_err(|_| invalid(format!("\"{raw}\" is not a YYYY-MM-DD date")))?,
            FilterKind::Choice(options) => options
                .iter()
                .find(|option| option.eq_ignore_ascii_case(raw))
                .map(|option| FilterValue::Text((*option).to_string()))
                .ok_or_else(|| invalid(format!("expected one of {}", options.join(", "))))?,
        };
        Ok(Some(value))
    }
}
