//! Async HTTP clients for the HydroShare data services.
//!
//! Three remote surfaces back the viewer: the HydroShare REST API for
//! resource metadata, the GeoServer instance for attribute tables and
//! field statistics, and the data service for timeseries values. All
//! requests are plain request/response with no automatic retry;
//! failures are reported to the caller and retried only by user
//! action.

pub mod attributes;
pub mod config;
pub mod error;
pub mod metadata;
pub mod statistics;

pub use attributes::{AttributeClient, AttributePage, AttributeRow, TimeseriesPoint, TimeseriesSeries};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use metadata::{MetadataClient, ResourceMetadata, SharingStatus};
pub use statistics::StatisticsClient;
