use foundation::ids::BuildingId;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

/// `[lon, lat]`, the GeoJSON axis order.
pub type Position = [f64; 2];

/// Free-form feature properties (`id` plus the source tags).
pub type Properties = serde_json::Map<String, Value>;

/// Single-ring polygon. The ring may be empty when no outline could be
/// derived from the source record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    ring: Vec<Position>,
}

impl Polygon {
    pub fn new(ring: Vec<Position>) -> Self {
        Self { ring }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ring(&self) -> &[Position] {
        &self.ring
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl Serialize for Polygon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Polygon", 2)?;
        s.serialize_field("type", "Polygon")?;
        s.serialize_field("coordinates", &[&self.ring])?;
        s.end()
    }
}

/// Canonical building feature. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    id: BuildingId,
    geometry: Polygon,
    properties: Properties,
}

impl Building {
    pub fn new(id: BuildingId, geometry: Polygon, properties: Properties) -> Self {
        Self {
            id,
            geometry,
            properties,
        }
    }

    pub fn id(&self) -> BuildingId {
        self.id
    }

    pub fn geometry(&self) -> &Polygon {
        &self.geometry
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Property rendered the way a string concatenation would render it.
    pub fn property_text(&self, key: &str) -> Option<String> {
        self.property(key).and_then(value_text)
    }

    /// Property `key` unless it is blank (see [`is_blank`]).
    pub fn filled(&self, key: &str) -> Option<&Value> {
        self.property(key).filter(|v| !is_blank(v))
    }

    pub fn start_date(&self) -> Option<&Value> {
        self.property("start_date")
    }

    /// `start_date` read as a plain number; `None` when it is not one.
    pub fn start_date_number(&self) -> Option<f64> {
        match self.start_date()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }
}

impl Serialize for Building {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Feature", 4)?;
        s.serialize_field("type", "Feature")?;
        s.serialize_field("id", &self.id.to_string())?;
        s.serialize_field("geometry", &self.geometry)?;
        s.serialize_field("properties", &self.properties)?;
        s.end()
    }
}

/// Null, `false`, the empty string and zero count as blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Text form of a scalar property value.
///
/// Integral floats drop their fractional part (`1850.0` reads as `1850`).
/// Null, arrays and objects have no text form.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if n.is_f64()
                && let Some(f) = n.as_f64()
                && f.fract() == 0.0
                && f.abs() < 1e15
            {
                return Some(format!("{}", f as i64));
            }
            Some(n.to_string())
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Building, Polygon, Properties, is_blank, value_text};
    use foundation::ids::BuildingId;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn building(start_date: Value) -> Building {
        let mut props = Properties::new();
        props.insert("id".into(), json!("7"));
        props.insert("start_date".into(), start_date);
        Building::new(
            BuildingId::new(7),
            Polygon::new(vec![[24.0, 49.8], [24.1, 49.8], [24.1, 49.9]]),
            props,
        )
    }

    #[test]
    fn serializes_as_geojson_feature() {
        let b = building(json!("1900"));
        let v = serde_json::to_value(&b).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "Feature",
                "id": "7",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[24.0, 49.8], [24.1, 49.8], [24.1, 49.9]]]
                },
                "properties": { "id": "7", "start_date": "1900" }
            })
        );
    }

    #[test]
    fn empty_polygon_keeps_one_ring() {
        let v = serde_json::to_value(Polygon::empty()).unwrap();
        assert_eq!(v, json!({ "type": "Polygon", "coordinates": [[]] }));
    }

    #[test]
    fn start_date_number_reads_strings_and_numbers() {
        assert_eq!(building(json!("1900")).start_date_number(), Some(1900.0));
        assert_eq!(building(json!(1850)).start_date_number(), Some(1850.0));
        assert_eq!(building(json!("c.1850")).start_date_number(), None);
        assert_eq!(building(Value::Null).start_date_number(), None);
    }

    #[test]
    fn value_text_renders_scalars() {
        assert_eq!(value_text(&json!(1850)), Some("1850".to_string()));
        assert_eq!(value_text(&json!(1850.0)), Some("1850".to_string()));
        assert_eq!(value_text(&json!("20AB")), Some("20AB".to_string()));
        assert_eq!(value_text(&Value::Null), None);
    }

    #[test]
    fn blank_values_are_not_filled() {
        for v in [Value::Null, json!(false), json!(""), json!(0), json!(0.0)] {
            assert!(is_blank(&v), "{v}");
        }
        for v in [json!("0"), json!(" "), json!(1850), json!(true), json!([])] {
            assert!(!is_blank(&v), "{v}");
        }
        assert_eq!(building(json!("")).filled("start_date"), None);
        assert_eq!(building(json!("1900")).filled("start_date"), Some(&json!("1900")));
        assert_eq!(building(json!("1900")).filled("date_from_text"), None);
    }
}
