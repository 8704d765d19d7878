//! Shared SDMX payload parsing.
//!
//! Several international statistics providers (ECB, IMF, BIS, OECD)
//! publish observation cubes in SDMX-JSON or SDMX-XML. Both flavors
//! reduce to the same thing here: a list of `(period string, value)`
//! observations. Period strings stay provider-specific; each collector
//! resolves them to timestamps with its own rules.

use serde::Deserialize;
use std::collections::HashMap;

/// One raw observation: the provider's period code and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct SdmxObservation {
    /// Provider period code, e.g. `2023-09-01`, `2023-Q3`, `2023-09`.
    pub period: String,
    /// Observed numeric value.
    pub value: f64,
}

// =============================================================================
// SDMX-JSON
// =============================================================================

/// Top-level SDMX-JSON response.
#[derive(Debug, Default, Deserialize)]
pub struct SdmxJson {
    #[serde(rename = "dataSets", default)]
    data_sets: Vec<SdmxDataSet>,
    #[serde(default)]
    structure: SdmxStructure,
}

#[derive(Debug, Default, Deserialize)]
struct SdmxDataSet {
    #[serde(default)]
    observations: HashMap<String, Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct SdmxStructure {
    #[serde(default)]
    dimensions: SdmxDimensions,
}

#[derive(Debug, Default, Deserialize)]
struct SdmxDimensions {
    #[serde(default)]
    observation: Vec<SdmxDimension>,
}

#[derive(Debug, Default, Deserialize)]
struct SdmxDimension {
    #[serde(default)]
    id: String,
    #[serde(default)]
    values: Vec<SdmxDimensionValue>,
}

#[derive(Debug, Default, Deserialize)]
struct SdmxDimensionValue {
    #[serde(default)]
    id: String,
}

impl SdmxJson {
    /// Extracts observations from the first data set.
    ///
    /// Observation keys are compound positional indices like `"0:3"`;
    /// the first segment indexes the `TIME_PERIOD` dimension values.
    /// Out-of-range indices, unparsable keys, and missing or
    /// non-numeric values are skipped. Results are ordered by time
    /// index so output is deterministic.
    #[must_use]
    pub fn observations(&self) -> Vec<SdmxObservation> {
        let Some(data_set) = self.data_sets.first() else {
            return Vec::new();
        };
        let time_values: &[SdmxDimensionValue] = self
            .structure
            .dimensions
            .observation
            .iter()
            .find(|d| d.id == "TIME_PERIOD")
            .map(|d| d.values.as_slice())
            .unwrap_or_default();

        let mut indexed: Vec<(usize, SdmxObservation)> = data_set
            .observations
            .iter()
            .filter_map(|(key, values)| {
                let time_index: usize = key.split(':').next()?.parse().ok()?;
                let period = time_values.get(time_index)?.id.clone();
                let value = values.first().and_then(json_number)?;
                Some((time_index, SdmxObservation { period, value }))
            })
            .collect();

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, obs)| obs).collect()
    }
}

/// Extracts a number from a JSON value that may arrive as a number or
/// a numeric string.
fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// =============================================================================
// SDMX-XML
// =============================================================================

/// Extracts observations from an SDMX-XML document.
///
/// Matches any element whose local name ends with `Obs`, reading the
/// `TIME_PERIOD` (or legacy `TIME`) and `OBS_VALUE` attributes.
/// Elements with missing or non-numeric values are skipped; a
/// malformed document yields however many observations were parsed
/// before the error.
#[must_use]
pub fn parse_sdmx_xml(xml: &str) -> Vec<SdmxObservation> {
    use quick_xml::events::{BytesStart, Event};

    let mut reader = quick_xml::Reader::from_str(xml);
    let mut observations = Vec::new();

    let extract = |element: &BytesStart<'_>| -> Option<SdmxObservation> {
        let mut period: Option<String> = None;
        let mut value: Option<f64> = None;

        for attr in element.attributes().filter_map(Result::ok) {
            let key = attr.key.local_name();
            let text = attr.unescape_value().ok()?;
            match key.as_ref() {
                b"TIME_PERIOD" => period = Some(text.into_owned()),
                b"TIME" => {
                    if period.is_none() {
                        period = Some(text.into_owned());
                    }
                }
                b"OBS_VALUE" => value = text.parse().ok(),
                _ => {}
            }
        }

        Some(SdmxObservation {
            period: period?,
            value: value?,
        })
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.name().local_name().as_ref().ends_with(b"Obs") {
                    if let Some(obs) = extract(&e) {
                        observations.push(obs);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    observations
}
