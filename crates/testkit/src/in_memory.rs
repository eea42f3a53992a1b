//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Unit/integration tests
//! - Deterministic contract tests for the ports layer
//! - Offline experimentation without cloud credentials

use keos_ports::{
    CloudMetadataConnector, CloudMetadataPort, LogEvent, LogFields, LogLevel, LoggerPort,
    MetadataOperation, MetadataScope,
};
use keos_shared::{ErrorEnvelope, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event, base fields merged in.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base_fields: LogFields,
}

impl RecordingLogger {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, including those of child loggers.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of recorded events, in order.
    pub fn event_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| event.event.to_string())
            .collect()
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base_fields.is_empty() {
            let mut merged = self.base_fields.clone();
            merged.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(merged);
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base_fields = self.base_fields.clone();
        base_fields.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base_fields,
        })
    }
}

/// Deterministic provider inventory.
///
/// Unset lists answer "no data", so the matching cross-check is skipped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCloudMetadata {
    regions: Vec<String>,
    zones: BTreeMap<String, Vec<String>>,
    vpcs: Vec<String>,
    subnets: BTreeMap<String, Vec<String>>,
    versions: BTreeMap<String, Vec<String>>,
    subnet_zones: BTreeMap<String, String>,
    failures: BTreeMap<&'static str, ErrorEnvelope>,
    calls: Arc<Mutex<Vec<MetadataOperation>>>,
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

impl InMemoryCloudMetadata {
    /// Inventory with no data at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible regions.
    #[must_use]
    pub fn with_regions(mut self, regions: &[&str]) -> Self {
        self.regions = owned(regions);
        self
    }

    /// Zones of `region`.
    #[must_use]
    pub fn with_zones(mut self, region: &str, zones: &[&str]) -> Self {
        self.zones.insert(region.to_string(), owned(zones));
        self
    }

    /// A network and its subnets.
    #[must_use]
    pub fn with_vpc(mut self, vpc_id: &str, subnets: &[&str]) -> Self {
        self.vpcs.push(vpc_id.to_string());
        self.subnets.insert(vpc_id.to_string(), owned(subnets));
        self
    }

    /// Managed versions offered in `region`.
    #[must_use]
    pub fn with_versions(mut self, region: &str, versions: &[&str]) -> Self {
        self.versions.insert(region.to_string(), owned(versions));
        self
    }

    /// Zone of a private subnet.
    #[must_use]
    pub fn with_private_subnet(mut self, subnet_id: &str, zone: &str) -> Self {
        self.subnet_zones.insert(subnet_id.to_string(), zone.to_string());
        self
    }

    /// Fail every call of `operation` with `error`.
    #[must_use]
    pub fn failing(mut self, operation: MetadataOperation, error: ErrorEnvelope) -> Self {
        self.failures.insert(operation.as_str(), error);
        self
    }

    /// Operations performed so far, shared by every clone.
    pub fn calls(&self) -> Vec<MetadataOperation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn answer(&self, operation: MetadataOperation, values: Vec<String>) -> Result<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(operation);
        match self.failures.get(operation.as_str()) {
            Some(error) => Err(error.clone()),
            None => Ok(values),
        }
    }
}

impl CloudMetadataPort for InMemoryCloudMetadata {
    fn list_regions(&self) -> Result<Vec<String>> {
        self.answer(MetadataOperation::ListRegions, self.regions.clone())
    }

    fn list_availability_zones(&self, region: &str) -> Result<Vec<String>> {
        let zones = self.zones.get(region).cloned().unwrap_or_default();
        self.answer(MetadataOperation::ListAvailabilityZones, zones)
    }

    fn list_vpcs(&self) -> Result<Vec<String>> {
        self.answer(MetadataOperation::ListVpcs, self.vpcs.clone())
    }

    fn list_subnets(&self, vpc_id: &str) -> Result<Vec<String>> {
        let subnets = self.subnets.get(vpc_id).cloned().unwrap_or_default();
        self.answer(MetadataOperation::ListSubnets, subnets)
    }

    fn list_supported_versions(&self, region: &str) -> Result<Vec<String>> {
        let versions = self.versions.get(region).cloned().unwrap_or_default();
        self.answer(MetadataOperation::ListSupportedVersions, versions)
    }

    fn list_private_subnet_zones(&self, subnet_ids: &[String]) -> Result<Vec<String>> {
        let mut zones: Vec<String> = subnet_ids
            .iter()
            .filter_map(|subnet_id| self.subnet_zones.get(subnet_id).cloned())
            .collect();
        zones.sort();
        zones.dedup();
        self.answer(MetadataOperation::ListPrivateSubnetZones, zones)
    }
}

/// Connector handing out clones of one inventory and recording scopes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    metadata: InMemoryCloudMetadata,
    connect_error: Option<ErrorEnvelope>,
    scopes: Arc<Mutex<Vec<MetadataScope>>>,
}

impl InMemoryConnector {
    /// Serve `metadata` for every scope.
    #[must_use]
    pub fn new(metadata: InMemoryCloudMetadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    /// Fail every connection attempt.
    #[must_use]
    pub fn failing(error: ErrorEnvelope) -> Self {
        Self {
            connect_error: Some(error),
            ..Self::default()
        }
    }

    /// Scopes requested so far.
    pub fn scopes(&self) -> Vec<MetadataScope> {
        self.scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Inventory served to connections.
    #[must_use]
    pub const fn metadata(&self) -> &InMemoryCloudMetadata {
        &self.metadata
    }
}

impl CloudMetadataConnector for InMemoryConnector {
    fn connect(&self, scope: &MetadataScope) -> Result<Box<dyn CloudMetadataPort>> {
        self.scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(scope.clone());
        match &self.connect_error {
            Some(error) => Err(error.clone()),
            None => Ok(Box::new(self.metadata.clone())),
        }
    }
}

/// Helper to create a log event.
#[must_use]
pub fn log_event(level: LogLevel, event: &str, message: &str) -> LogEvent {
    LogEvent::new(level, event, message)
}
