//! Field statistics from GeoServer.
//!
//! Vector ranges come from two single-feature WFS queries sorted on
//! the field (descending for the max, ascending for the min). Raster
//! band ranges are read from the quantities of the layer's published
//! SLD colormap, whose first entry is the no-data value.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use registry::{StatsProvider, StatsRequest};
use reqwest::Client;
use viewer_common::{LayerCode, LayerKind};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::metadata::local_name;

/// Client for the statistics lookups behind gradient styling.
pub struct StatisticsClient {
    http: Client,
    config: ClientConfig,
}

impl StatisticsClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { http, config })
    }

    /// Min/max for one field of one layer.
    pub async fn field_statistics(&self, request: &StatsRequest) -> ClientResult<(f64, f64)> {
        match request.layer_kind {
            LayerKind::Raster => {
                self.raster_band_range(&request.code, &request.resource_id)
                    .await
            }
            _ => {
                self.vector_field_range(&request.code, &request.field_name)
                    .await
            }
        }
    }

    async fn vector_field_range(
        &self,
        code: &LayerCode,
        field: &str,
    ) -> ClientResult<(f64, f64)> {
        let max = self.sorted_field_value(code, field, "D").await?;
        let min = self.sorted_field_value(code, field, "A").await?;
        Ok((min, max))
    }

    /// First value of the layer sorted on `field` in the given
    /// direction (`A` ascending, `D` descending).
    async fn sorted_field_value(
        &self,
        code: &LayerCode,
        field: &str,
        direction: &str,
    ) -> ClientResult<f64> {
        let endpoint = format!(
            "{}/wfs?service=WFS&version=1.1.0&request=GetFeature&typename={}&maxFeatures=1&sortBy={}+{}&propertyName={}",
            self.config.geoserver_url, code, field, direction, field
        );
        let xml = self.get_text(&endpoint).await?;
        first_element_value(&xml, field)
            .ok_or_else(|| ClientError::decode(endpoint, format!("no value for field '{field}'")))
    }

    async fn raster_band_range(
        &self,
        code: &LayerCode,
        resource_id: &str,
    ) -> ClientResult<(f64, f64)> {
        let (_, style_name) = code.split();
        let endpoint = format!(
            "{}/rest/workspaces/HS-{}/styles/{}.sld",
            self.config.geoserver_url, resource_id, style_name
        );
        let xml = self.get_text(&endpoint).await?;
        let quantities = colormap_quantities(&xml)
            .map_err(|e| ClientError::decode(endpoint.clone(), e))?;
        // Entry 0 carries the no-data value; 1 and 2 are the band range.
        if quantities.len() < 3 {
            return Err(ClientError::unexpected(
                endpoint,
                format!("expected 3 colormap entries, found {}", quantities.len()),
            ));
        }
        Ok((quantities[1], quantities[2]))
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

#[async_trait]
impl StatsProvider for StatisticsClient {
    async fn field_statistics(
        &self,
        request: &StatsRequest,
    ) -> Result<(f64, f64), Box<dyn std::error::Error + Send + Sync>> {
        StatisticsClient::field_statistics(self, request)
            .await
            .map_err(Into::into)
    }
}

/// Text of the first element whose local name matches `field`, parsed
/// as a number.
fn first_element_value(xml: &str, field: &str) -> Option<f64> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_field = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if local_name(e.name().as_ref()) == field {
                    in_field = true;
                }
            }
            Ok(Event::Text(t)) if in_field => {
                return t.unescape().ok()?.trim().parse().ok();
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
        buf.clear();
    }
}

/// `quantity` attributes of the ColorMapEntry elements in an SLD, in
/// document order.
fn colormap_quantities(xml: &str) -> Result<Vec<f64>, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut quantities = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == "ColorMapEntry" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"quantity" {
                            let text = String::from_utf8_lossy(&attr.value).into_owned();
                            quantities.push(text.parse().map_err(|_| {
                                format!("non-numeric colormap quantity '{text}'")
                            })?);
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
    Ok(quantities)
}
