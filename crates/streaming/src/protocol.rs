//! Overpass API wire types and the building query template.
//!
//! Only the parts of the `[out:json]` + `out geom` response the pipeline
//! reads are modelled; unknown fields are ignored. Every field that may be
//! absent on a real response has a serde default, so a sparse record
//! decodes instead of failing the whole batch. Sequences are decoded item by
//! item: a malformed node, member or element is dropped on its own.

use std::collections::BTreeMap;

use foundation::bounds::GeoBounds;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One node of an inline `out geom` geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoNode {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Way,
    Relation,
    /// `node`, `area`, or anything newer than this model.
    #[serde(other)]
    Other,
}

/// Member of a relation, with its geometry inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMember {
    #[serde(default)]
    pub role: String,
    #[serde(rename = "type", default)]
    pub member_type: Option<String>,
    #[serde(rename = "ref", default)]
    pub member_ref: Option<u64>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub geometry: Vec<GeoNode>,
}

/// A raw element as returned by the service. Scoped to one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawElement {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Present for ways.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub geometry: Vec<GeoNode>,
    /// Present for relations.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub members: Vec<RelationMember>,
    #[serde(default)]
    pub tags: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Osm3s {
    #[serde(default)]
    pub timestamp_osm_base: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub version: Option<f64>,
    #[serde(default)]
    pub generator: Option<String>,
    #[serde(default)]
    pub osm3s: Option<Osm3s>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub elements: Vec<RawElement>,
}

/// Decodes a JSON array keeping only the items that decode as `T`.
///
/// `null` or a non-array value reads as empty.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

impl OverpassResponse {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Templated building query.
///
/// The rendered `data` parameter looks like
/// `[out:json];(relation["building"]["start_date"](s,w,n,e);way[...](s,w,n,e););out geom;`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverpassQuery {
    /// Interpreter endpoint.
    pub base_url: String,
    /// Output format, the `[out:<format>]` header.
    #[serde(default = "default_output")]
    pub output: String,
    /// Element selectors; each gets the bbox appended.
    #[serde(default = "default_rules")]
    pub rules: Vec<String>,
    /// Trailing output statement.
    #[serde(default = "default_terminator")]
    pub terminator: String,
}

pub const DEFAULT_OVERPASS_URL: &str = "https://www.overpass-api.de/api/interpreter";

fn default_output() -> String {
    "json".to_string()
}

fn default_rules() -> Vec<String> {
    vec![
        r#"relation["building"]["start_date"]"#.to_string(),
        r#"way["building"]["start_date"]"#.to_string(),
    ]
}

fn default_terminator() -> String {
    "out geom".to_string()
}

impl Default for OverpassQuery {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OVERPASS_URL.to_string(),
            output: default_output(),
            rules: default_rules(),
            terminator: default_terminator(),
        }
    }
}

impl OverpassQuery {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Query-language text scoped to `bounds`.
    pub fn data(&self, bounds: &GeoBounds) -> String {
        let bbox = bounds.to_query_string();
        let selectors: String = self
            .rules
            .iter()
            .map(|rule| format!("{rule}({bbox});"))
            .collect();
        format!("[out:{}];({selectors});{};", self.output, self.terminator)
    }

    /// Full request URL with the query text left unescaped, for logs.
    pub fn display_url(&self, bounds: &GeoBounds) -> String {
        format!("{}?data={}", self.base_url, self.data(bounds))
    }
}
