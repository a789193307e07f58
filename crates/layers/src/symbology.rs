use foundation::bounds::GeoBounds;
use scene::building::Building;
use scene::years::normalize_year;
use serde::Serialize;

/// Path style handed to the map surface for one building.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    pub color: &'static str,
    pub fill_color: Option<&'static str>,
    pub opacity: f32,
    pub fill_opacity: f32,
    pub weight: f32,
    pub stroke: bool,
}

impl LayerStyle {
    /// Style of any shape before polygon or period overrides.
    pub const BASE: Self = Self {
        color: "#707070",
        fill_color: None,
        opacity: 1.0,
        fill_opacity: 0.9,
        weight: 3.0,
        stroke: true,
    };

    /// Polygon overrides applied on top of [`LayerStyle::BASE`].
    pub const fn polygon() -> Self {
        Self {
            weight: 1.0,
            fill_opacity: 0.8,
            ..Self::BASE
        }
    }

    pub fn with_color(self, color: &'static str) -> Self {
        Self {
            color,
            fill_color: Some(color),
            ..self
        }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::polygon()
    }
}

/// One architectural era: a named span of years and its colour.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub name: &'static str,
    pub from: i32,
    pub to: i32,
    pub color: &'static str,
}

const fn period(name: &'static str, from: i32, to: i32, color: &'static str) -> Period {
    Period {
        name,
        from,
        to,
        color,
    }
}

/// Eras of Lviv's built environment, ordered by first year.
pub const PERIODS: [Period; 10] = [
    period("Середньовіччя", 1256, 1772, "#304966"),
    period("Австрія", 1773, 1848, "#355070"),
    period("Австрія-автономна", 1849, 1918, "#6d597a"),
    period("Польща", 1919, 1939, "#a96275"),
    period("Сталінки", 1940, 1953, "#e56b6f"),
    period("Хрущовки", 1954, 1966, "#eaac8b"),
    period("Брежнівки", 1967, 1982, "#eebba0"),
    period("Перестройка", 1983, 1991, "#f9c758"),
    period("Пострадянський", 1991, 2010, "#bced35"),
    period("Глобалізація", 2011, 2020, "#75f048"),
];

/// The last period whose first year is `<= year`.
///
/// Years before the first period have none; years after the last one fall
/// into it.
pub fn period_for_year(year: f64) -> Option<&'static Period> {
    PERIODS.iter().rev().find(|p| f64::from(p.from) <= year)
}

/// Year a feature is coloured by.
///
/// A filled `start_date` is read as a plain number. Features without one
/// (streets) fall back to the year found in `date_from_text`.
pub fn style_year(feature: &Building) -> Option<f64> {
    if feature.filled("start_date").is_some() {
        return feature.start_date_number();
    }
    feature
        .filled("date_from_text")
        .and_then(normalize_year)
        .map(f64::from)
}

/// Polygon style for `building`, coloured by the era of [`style_year`].
pub fn style_for_building(building: &Building) -> LayerStyle {
    match style_year(building).and_then(period_for_year) {
        Some(p) => LayerStyle::polygon().with_color(p.color),
        None => LayerStyle::polygon(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    /// `from-to`.
    pub label: String,
    pub name: &'static str,
    pub color: &'static str,
}

pub fn legend_entries() -> Vec<LegendEntry> {
    PERIODS
        .iter()
        .map(|p| LegendEntry {
            label: format!("{}-{}", p.from, p.to),
            name: p.name,
            color: p.color,
        })
        .collect()
}

/// Area the period table describes.
pub const LVIV_BOUNDS: GeoBounds = GeoBounds {
    south: 49.777384397005484,
    west: 23.9088249206543,
    north: 49.894413228336724,
    east: 24.12769317626953,
};

/// The legend is only meaningful while the viewport overlaps the city.
pub fn legend_visible(viewport: &GeoBounds) -> bool {
    viewport.intersects(&LVIV_BOUNDS)
}
