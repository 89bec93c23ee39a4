//! Attribute tables and timeseries values.

use chrono::NaiveDateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use viewer_common::LayerCode;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::metadata::local_name;

/// One page of a layer's attribute table.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePage {
    /// Feature count for the whole layer, for the pager.
    pub total: usize,
    pub rows: Vec<AttributeRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRow {
    pub feature_id: String,
    /// Values in the requested field order; missing and null
    /// properties render as empty strings.
    pub values: Vec<String>,
}

/// One observation of a timeseries variable.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesPoint {
    pub time: NaiveDateTime,
    pub value: f64,
}

/// A fetched timeseries with no-data observations removed.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesSeries {
    pub unit: Option<String>,
    pub points: Vec<TimeseriesPoint>,
}

#[derive(Debug, Deserialize)]
struct FeatureCollectionJson {
    #[serde(default)]
    features: Vec<FeatureJson>,
}

#[derive(Debug, Deserialize)]
struct FeatureJson {
    id: String,
    properties: serde_json::Map<String, serde_json::Value>,
}

/// Client for the WFS attribute surface and the timeseries data
/// service.
pub struct AttributeClient {
    http: Client,
    config: ClientConfig,
}

impl AttributeClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { http, config })
    }

    /// One page of attribute rows, `start`-offset and `count`-sized,
    /// restricted to the named fields.
    pub async fn attribute_rows(
        &self,
        code: &LayerCode,
        fields: &[String],
        start: usize,
        count: usize,
    ) -> ClientResult<AttributePage> {
        let hits_endpoint = format!(
            "{}/wfs/?service=WFS&version=1.1.0&request=GetFeature&typeName={}&resultType=hits",
            self.config.geoserver_url, code
        );
        let hits_xml = self.get_text(&hits_endpoint).await?;
        let total = feature_count(&hits_xml)
            .ok_or_else(|| ClientError::decode(hits_endpoint, "missing numberOfFeatures"))?;

        let page_endpoint = format!(
            "{}/wfs/?service=WFS&version=1.3.0&request=GetFeature&typeName={}&propertyName={}&outputFormat=application/json&startIndex={}&count={}",
            self.config.geoserver_url,
            code,
            fields.join(","),
            start,
            count
        );
        let collection: FeatureCollectionJson = self
            .http
            .get(&page_endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let rows = collection
            .features
            .into_iter()
            .map(|feature| AttributeRow {
                values: fields
                    .iter()
                    .map(|field| property_text(feature.properties.get(field)))
                    .collect(),
                feature_id: feature.id,
            })
            .collect();

        Ok(AttributePage { total, rows })
    }

    /// Observations for one site/variable pair of a timeseries layer.
    /// The data service is addressed through the layer code's network
    /// and database parts (`TS-<network>:<database>`).
    pub async fn timeseries_values(
        &self,
        code: &LayerCode,
        site_code: &str,
        variable_code: &str,
    ) -> ClientResult<TimeseriesSeries> {
        let (workspace, database) = code.split();
        let network = workspace
            .and_then(|w| w.split_once('-'))
            .map(|(_, network)| network)
            .ok_or_else(|| {
                ClientError::unexpected(
                    "timeseries values",
                    format!("layer code '{code}' has no network part"),
                )
            })?;

        let endpoint = format!(
            "{}/wof/{}/{}/values/?site_code={}&variable_code={}",
            self.config.hydroserver_url, network, database, site_code, variable_code
        );
        let xml = self.get_text(&endpoint).await?;
        let series = parse_waterml_values(&xml).map_err(|e| ClientError::decode(endpoint, e))?;
        debug!(
            layer = %code,
            site = %site_code,
            variable = %variable_code,
            points = series.points.len(),
            "fetched timeseries"
        );
        Ok(series)
    }

    async fn get_text(&self, endpoint: &str) -> ClientResult<String> {
        Ok(self
            .http
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }
}

fn property_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// `numberOfFeatures` attribute from a WFS hits response.
fn feature_count(xml: &str) -> Option<usize> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == "FeatureCollection" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"numberOfFeatures" {
                            return String::from_utf8_lossy(&attr.value).parse().ok();
                        }
                    }
                    return None;
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
        buf.clear();
    }
}

/// Values from a WaterML 1.1 response, dropping observations equal to
/// the declared no-data value and any with an unparsable timestamp.
fn parse_waterml_values(xml: &str) -> Result<TimeseriesSeries, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut no_data: Option<String> = None;
    let mut unit = None;
    let mut points = Vec::new();

    let mut text_target: Option<&str> = None;
    let mut current_time: Option<NaiveDateTime> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                "noDataValue" => text_target = Some("no_data"),
                "unitAbbreviation" => text_target = Some("unit"),
                "value" => {
                    text_target = Some("value");
                    current_time = e.attributes().flatten().find_map(|attr| {
                        if attr.key.as_ref() == b"dateTime" {
                            parse_observation_time(&String::from_utf8_lossy(&attr.value))
                        } else {
                            None
                        }
                    });
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(target) = text_target.take() {
                    let text = t.unescape().map_err(|e| e.to_string())?.into_owned();
                    match target {
                        "no_data" => no_data = Some(text),
                        "unit" => unit = Some(text),
                        _ => {
                            let is_no_data = no_data.as_deref() == Some(text.as_str());
                            if let (false, Some(time), Ok(value)) =
                                (is_no_data, current_time.take(), text.parse::<f64>())
                            {
                                points.push(TimeseriesPoint { time, value });
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
        buf.clear();
    }

    Ok(TimeseriesSeries { unit, points })
}

fn parse_observation_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
}
