//! HydroShare resource metadata and layer discovery.
//!
//! A resource's system metadata comes from the HydroShare REST API;
//! the layers it exposes are discovered from the GeoServer WFS/WCS
//! capabilities for the resource's workspace (`HS-<id>` for spatial
//! aggregations, `TS-<id>` for timeseries sites).

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use viewer_common::{BoundingBox, FieldKind, LayerCode, LayerDescriptor, LayerField, LayerKind};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Resource visibility, derived from the `public`/`discoverable`
/// flags in system metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingStatus {
    Public,
    Discoverable,
    Private,
}

impl SharingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharingStatus::Public => "Public",
            SharingStatus::Discoverable => "Discoverable",
            SharingStatus::Private => "Private",
        }
    }
}

/// Resource-level metadata shown in the info panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMetadata {
    pub resource_id: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub creator: String,
    pub date_created: String,
    pub last_updated: String,
    pub resource_url: String,
    pub resource_type: String,
    pub sharing_status: SharingStatus,
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Debug, Deserialize)]
struct SysMeta {
    resource_title: String,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
    creator: String,
    date_created: String,
    date_last_updated: String,
    resource_url: String,
    resource_type: String,
    public: bool,
    discoverable: bool,
    #[serde(default)]
    coverages: Vec<CoverageEntry>,
}

#[derive(Debug, Deserialize)]
struct CoverageEntry {
    #[serde(rename = "type")]
    kind: String,
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RestLayer {
    layer: RestLayerBody,
}

#[derive(Debug, Deserialize)]
struct RestLayerBody {
    #[serde(rename = "defaultStyle")]
    default_style: RestStyleRef,
}

#[derive(Debug, Deserialize)]
struct RestStyleRef {
    name: String,
}

/// Client for the HydroShare REST API and GeoServer discovery surface.
pub struct MetadataClient {
    http: Client,
    config: ClientConfig,
}

impl MetadataClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { http, config })
    }

    /// System metadata for one resource.
    pub async fn resource_metadata(&self, resource_id: &str) -> ClientResult<ResourceMetadata> {
        let endpoint = format!(
            "{}/hsapi/resource/{}/sysmeta/",
            self.config.hydroshare_url, resource_id
        );
        let meta: SysMeta = self
            .http
            .get(&endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let sharing_status = if meta.public {
            SharingStatus::Public
        } else if meta.discoverable {
            SharingStatus::Discoverable
        } else {
            SharingStatus::Private
        };

        Ok(ResourceMetadata {
            resource_id: resource_id.to_string(),
            title: meta.resource_title,
            abstract_text: meta.abstract_text,
            creator: meta.creator,
            date_created: meta.date_created,
            last_updated: meta.date_last_updated,
            resource_url: meta.resource_url,
            resource_type: meta.resource_type,
            sharing_status,
            bounding_box: bounding_box_from_coverages(&meta.coverages),
        })
    }

    /// Discover every layer the resource exposes: vector feature types
    /// and timeseries site layers from WFS, coverages from WCS.
    pub async fn layer_descriptors(&self, resource_id: &str) -> ClientResult<Vec<LayerDescriptor>> {
        let mut layers = Vec::new();

        for (prefix, timeseries) in [("HS", false), ("TS", true)] {
            let endpoint = format!(
                "{}/wfs/?service=WFS&version=1.3.0&request=getCapabilities&namespace={}-{}",
                self.config.geoserver_url, prefix, resource_id
            );
            let xml = self.get_text(&endpoint).await?;
            for entry in parse_layer_entries(&xml, "FeatureType", "Name")? {
                let code = LayerCode::new(entry.name.clone());
                let kind = if timeseries {
                    LayerKind::Timeseries
                } else {
                    self.vector_kind(&entry.name).await?
                };
                let fields = self.feature_fields(&entry.name).await?;
                layers.push(descriptor(code, kind, resource_id, entry, fields));
            }
        }

        let endpoint = format!(
            "{}/wcs/?service=WCS&version=1.1.1&request=getCapabilities&namespace=HS-{}",
            self.config.geoserver_url, resource_id
        );
        let xml = self.get_text(&endpoint).await?;
        for entry in parse_layer_entries(&xml, "CoverageSummary", "Identifier")? {
            let code = LayerCode::new(entry.name.clone());
            // Rasters expose one synthetic band field driving the
            // gradient style.
            let fields = vec![LayerField::new("coverage", FieldKind::Numerical)];
            layers.push(descriptor(code, LayerKind::Raster, resource_id, entry, fields));
        }

        debug!(resource = %resource_id, count = layers.len(), "discovered layers");
        Ok(layers)
    }

    /// Vector kind from the layer's default style name on GeoServer.
    async fn vector_kind(&self, layer_name: &str) -> ClientResult<LayerKind> {
        let endpoint = format!(
            "{}/rest/layers/{}.json",
            self.config.geoserver_url, layer_name
        );
        let rest: RestLayer = self
            .http
            .get(&endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match rest.layer.default_style.name.as_str() {
            "point" => Ok(LayerKind::Point),
            "line" => Ok(LayerKind::Line),
            "polygon" => Ok(LayerKind::Polygon),
            other => Err(ClientError::unexpected(
                endpoint,
                format!("unrecognized default style '{other}'"),
            )),
        }
    }

    /// Attribute fields from WFS describeFeatureType.
    async fn feature_fields(&self, layer_name: &str) -> ClientResult<Vec<LayerField>> {
        let endpoint = format!(
            "{}/wfs/?service=WFS&request=describeFeatureType&version=1.1.0&typename={}",
            self.config.geoserver_url, layer_name
        );
        let xml = self.get_text(&endpoint).await?;
        parse_feature_fields(&xml)
            .map_err(|e| ClientError::decode(endpoint, e))
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

fn descriptor(
    code: LayerCode,
    kind: LayerKind,
    resource_id: &str,
    entry: LayerEntry,
    fields: Vec<LayerField>,
) -> LayerDescriptor {
    let (_, name) = code.split();
    LayerDescriptor {
        source_ref: code.to_string(),
        name: name.to_string(),
        code,
        kind,
        resource_id: resource_id.to_string(),
        fields,
        extent: entry.extent,
    }
}

/// Bounding box from sysmeta coverages: a box coverage wins; a point
/// coverage yields a degenerate box.
fn bounding_box_from_coverages(coverages: &[CoverageEntry]) -> Option<BoundingBox> {
    let mut bbox = None;
    for coverage in coverages {
        match coverage.kind.as_str() {
            "point" => {
                let east = coverage.value.get("east").and_then(|v| v.as_f64())?;
                let north = coverage.value.get("north").and_then(|v| v.as_f64())?;
                bbox = Some(BoundingBox::new(east, north, east, north));
            }
            "box" => {
                let west = coverage.value.get("westlimit").and_then(|v| v.as_f64())?;
                let south = coverage.value.get("southlimit").and_then(|v| v.as_f64())?;
                let east = coverage.value.get("eastlimit").and_then(|v| v.as_f64())?;
                let north = coverage.value.get("northlimit").and_then(|v| v.as_f64())?;
                bbox = Some(BoundingBox::new(west, south, east, north));
            }
            _ => {}
        }
    }
    bbox
}

struct LayerEntry {
    name: String,
    extent: BoundingBox,
}

/// Pull `(name, WGS84 corners)` pairs out of a WFS or WCS capabilities
/// document. Namespace prefixes vary between the two services, so
/// elements are matched by local name.
fn parse_layer_entries(
    xml: &str,
    container: &str,
    name_element: &str,
) -> ClientResult<Vec<LayerEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut in_container = false;
    let mut current_text_target: Option<&str> = None;
    let mut name = String::new();
    let mut lower = None;
    let mut upper = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let qname = e.name();
                let local = local_name(qname.as_ref());
                if local == container {
                    in_container = true;
                    name.clear();
                    lower = None;
                    upper = None;
                } else if in_container
                    && (local == name_element || local == "LowerCorner" || local == "UpperCorner")
                {
                    current_text_target = match local {
                        l if l == name_element => Some("name"),
                        "LowerCorner" => Some("lower"),
                        _ => Some("upper"),
                    };
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(target) = current_text_target {
                    let text = t
                        .unescape()
                        .map_err(|e| ClientError::decode("capabilities", e.to_string()))?
                        .into_owned();
                    match target {
                        "name" => name = text,
                        "lower" => lower = parse_corner(&text),
                        _ => upper = parse_corner(&text),
                    }
                    current_text_target = None;
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == container && in_container {
                    in_container = false;
                    if let (false, Some((min_x, min_y)), Some((max_x, max_y))) =
                        (name.is_empty(), lower, upper)
                    {
                        entries.push(LayerEntry {
                            name: std::mem::take(&mut name),
                            extent: BoundingBox::new(min_x, min_y, max_x, max_y),
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ClientError::decode("capabilities", e.to_string())),
        }
        buf.clear();
    }
    Ok(entries)
}

/// Attribute fields from a describeFeatureType schema. The first
/// element of the sequence is the geometry and is skipped.
fn parse_feature_fields(xml: &str) -> Result<Vec<LayerField>, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut fields = Vec::new();
    let mut in_sequence = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let qname = e.name();
                let local = local_name(qname.as_ref());
                if local == "sequence" {
                    in_sequence = true;
                } else if in_sequence && local == "element" {
                    let mut name = None;
                    let mut type_name = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => {
                                name = Some(
                                    String::from_utf8_lossy(&attr.value).into_owned(),
                                )
                            }
                            b"type" => {
                                type_name = Some(
                                    String::from_utf8_lossy(&attr.value).into_owned(),
                                )
                            }
                            _ => {}
                        }
                    }
                    if let (Some(name), Some(type_name)) = (name, type_name) {
                        fields.push(LayerField::new(name, field_kind(&type_name)));
                    }
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == "sequence" {
                    in_sequence = false;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
        buf.clear();
    }

    // Drop the leading geometry element.
    if !fields.is_empty() {
        fields.remove(0);
    }
    Ok(fields)
}

fn field_kind(xsd_type: &str) -> FieldKind {
    match xsd_type {
        "xsd:long" | "xsd:int" | "xsd:double" | "xsd:float" => FieldKind::Numerical,
        _ => FieldKind::Categorical,
    }
}

fn parse_corner(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    Some((x, y))
}

pub(crate) fn local_name(qualified: &[u8]) -> &str {
    let name = qualified
        .iter()
        .position(|&b| b == b':')
        .map(|i| &qualified[i + 1..])
        .unwrap_or(qualified);
    std::str::from_utf8(name).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WFS_CAPS: &str = r#"<?xml version="1.0"?>
        <wfs:WFS_Capabilities xmlns:wfs="http://www.opengis.net/wfs"
            xmlns:ows="http://www.opengis.net/ows">
          <wfs:FeatureTypeList>
            <wfs:FeatureType>
              <wfs:Name>HS-abc123:watersheds</wfs:Name>
              <ows:WGS84BoundingBox>
                <ows:LowerCorner>-112.5 40.1</ows:LowerCorner>
                <ows:UpperCorner>-111.0 42.0</ows:UpperCorner>
              </ows:WGS84BoundingBox>
            </wfs:FeatureType>
          </wfs:FeatureTypeList>
        </wfs:WFS_Capabilities>"#;

    #[test]
    fn test_parse_feature_types_from_capabilities() {
        let entries = parse_layer_entries(WFS_CAPS, "FeatureType", "Name").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "HS-abc123:watersheds");
        assert_eq!(entries[0].extent.min_x, -112.5);
        assert_eq!(entries[0].extent.max_y, 42.0);
    }

    #[test]
    fn test_parse_fields_skips_geometry() {
        let xml = r#"<?xml version="1.0"?>
            <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
              <xsd:complexType>
                <xsd:sequence>
                  <xsd:element name="the_geom" type="gml:MultiPolygonPropertyType"/>
                  <xsd:element name="name" type="xsd:string"/>
                  <xsd:element name="area" type="xsd:double"/>
                </xsd:sequence>
              </xsd:complexType>
            </xsd:schema>"#;
        let fields = parse_feature_fields(xml).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "name");
        assert_eq!(fields[0].kind, FieldKind::Categorical);
        assert_eq!(fields[1].name, "area");
        assert_eq!(fields[1].kind, FieldKind::Numerical);
    }

    #[test]
    fn test_bounding_box_prefers_box_coverage() {
        let coverages: Vec<CoverageEntry> = serde_json::from_str(
            r#"[
                {"type": "period", "value": {}},
                {"type": "box", "value": {"westlimit": -112.0, "southlimit": 40.0,
                                          "eastlimit": -111.0, "northlimit": 42.0}}
            ]"#,
        )
        .unwrap();
        let bbox = bounding_box_from_coverages(&coverages).unwrap();
        assert_eq!(bbox, BoundingBox::new(-112.0, 40.0, -111.0, 42.0));
    }

    #[test]
    fn test_point_coverage_is_degenerate_box() {
        let coverages: Vec<CoverageEntry> = serde_json::from_str(
            r#"[{"type": "point", "value": {"east": -111.8, "north": 41.7}}]"#,
        )
        .unwrap();
        let bbox = bounding_box_from_coverages(&coverages).unwrap();
        assert_eq!(bbox.min_x, bbox.max_x);
        assert_eq!(bbox.min_y, bbox.max_y);
    }

    #[test]
    fn test_sysmeta_sharing_status_shape() {
        let meta: SysMeta = serde_json::from_str(
            r#"{
                "resource_title": "Logan River Watershed",
                "abstract": "Watershed boundaries.",
                "creator": "jdoe",
                "date_created": "2023-04-01T00:00:00Z",
                "date_last_updated": "2023-05-01T00:00:00Z",
                "resource_url": "https://www.hydroshare.org/resource/abc123/",
                "resource_type": "CompositeResource",
                "public": false,
                "discoverable": true,
                "coverages": []
            }"#,
        )
        .unwrap();
        assert!(!meta.public);
        assert!(meta.discoverable);
    }
}
