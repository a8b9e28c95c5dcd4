//! The CGMES-facing query facade.
//!
//! One strongly named accessor per semantic concept, each a thin named-query
//! call; a handful of derived facts run a small decision procedure over the
//! raw rows instead. The write-back path turns computed result batches into
//! triples in the named graph of an explicitly chosen profile.

use crate::catalog::{inject_params, CimVersion, QueryCatalog};
use crate::error::ModelError;
use chrono::{DateTime, NaiveDateTime, Utc};
use cimgraph_store::{OutputSink, PropertyBags, TripleStore};
use std::cell::Cell;
use std::io::Read;
use std::time::Instant;

/// The one prefix bound to the model's ontology namespace.
pub const CIM_PREFIX: &str = "cim";

const MODEL_PROFILES: &str = "modelProfiles";
const PROFILE: &str = "profile";
const FULL_MODEL: &str = "FullModel";
const VERSION_QUERY: &str = "version";

const EQUIPMENT_OPERATION_MARKER: &str = "/EquipmentOperation/";
const EQUIPMENT_CORE_MARKER: &str = "/EquipmentCore/";

/// Semantic category of data within a grid model, mapped one-to-one to a
/// named graph. The write-back path addresses its destination through this
/// enum instead of inferring it from graph-name patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    EquipmentCore,
    Topology,
    SteadyStateHypothesis,
    StateVariables,
}

impl ProfileKind {
    /// Conventional marker instance files carry in their names.
    pub fn marker(self) -> &'static str {
        match self {
            ProfileKind::EquipmentCore => "EQ",
            ProfileKind::Topology => "TP",
            ProfileKind::SteadyStateHypothesis => "SSH",
            ProfileKind::StateVariables => "SV",
        }
    }
}

/// A loaded CGMES case: a triple store partitioned by source document, a
/// version-bound query catalog, and the `cim` namespace binding.
///
/// The model owns its backend and every named graph exclusively for its
/// lifetime. `reference_instant` is the default for the date accessors;
/// callers supply it so nothing here reads the wall clock.
pub struct CgmesModel {
    store: Box<dyn TripleStore>,
    catalog: QueryCatalog,
    cim_namespace: String,
    cim_version: CimVersion,
    reference_instant: DateTime<Utc>,
    node_breaker: Cell<Option<bool>>,
}

impl CgmesModel {
    /// Build a model for an explicitly chosen schema version. The matching
    /// catalog resolves here, never lazily at first query.
    pub fn new(
        mut store: Box<dyn TripleStore>,
        cim_version: CimVersion,
        cim_namespace: &str,
        reference_instant: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        let catalog = QueryCatalog::for_version(cim_version)?;
        store.add_namespace(CIM_PREFIX, cim_namespace);
        Ok(Self {
            store,
            catalog,
            cim_namespace: cim_namespace.to_string(),
            cim_version,
            reference_instant,
            node_breaker: Cell::new(None),
        })
    }

    /// Build a model from a namespace whose version is probed; an
    /// unrecognized namespace fails here, at construction.
    pub fn for_namespace(
        store: Box<dyn TripleStore>,
        cim_namespace: &str,
        reference_instant: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        let version = CimVersion::from_namespace(cim_namespace).ok_or_else(|| {
            ModelError::UnknownVersionNamespace {
                namespace: cim_namespace.to_string(),
            }
        })?;
        Self::new(store, version, cim_namespace, reference_instant)
    }

    /// Build a model over a hand-rolled catalog; used by tests and by
    /// deployments shipping their own query set.
    pub fn with_catalog(
        mut store: Box<dyn TripleStore>,
        catalog: QueryCatalog,
        cim_version: CimVersion,
        cim_namespace: &str,
        reference_instant: DateTime<Utc>,
    ) -> Self {
        store.add_namespace(CIM_PREFIX, cim_namespace);
        Self {
            store,
            catalog,
            cim_namespace: cim_namespace.to_string(),
            cim_version,
            reference_instant,
            node_breaker: Cell::new(None),
        }
    }

    pub fn cim_namespace(&self) -> &str {
        &self.cim_namespace
    }

    pub fn cim_version(&self) -> CimVersion {
        self.cim_version
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &dyn TripleStore {
        self.store.as_ref()
    }

    pub fn context_names(&self) -> Vec<String> {
        self.store.context_names()
    }

    /// Load one source document into the named graph `context_name`.
    pub fn read(
        &mut self,
        base: &str,
        context_name: &str,
        reader: &mut dyn Read,
    ) -> Result<(), ModelError> {
        // New data can change the topology style.
        self.node_breaker.set(None);
        self.store.read(base, context_name, reader)?;
        Ok(())
    }

    /// Serialize every named graph through the sink.
    pub fn write(&self, sink: &mut dyn OutputSink) -> Result<(), ModelError> {
        Ok(self.store.write(sink)?)
    }

    /// Serialize the named graph of one profile, if loaded.
    pub fn write_profile(
        &self,
        sink: &mut dyn OutputSink,
        profile: ProfileKind,
    ) -> Result<(), ModelError> {
        let context = self.context_for(profile)?;
        Ok(self.store.write_context(sink, &context)?)
    }

    pub fn dump(&self, liner: &mut dyn FnMut(&str)) {
        self.store.dump(liner);
    }

    /// Run a raw SPARQL SELECT against the store.
    pub fn query(&self, text: &str) -> Result<PropertyBags, ModelError> {
        Ok(self.store.query(text)?)
    }

    /// Resolve a named query, inject `params`, execute, and wrap the rows.
    ///
    /// A name the bound catalog does not define is not an error: model
    /// completeness varies by source, so the probe logs and returns an
    /// empty result.
    pub fn named_query(&self, name: &str, params: &[&str]) -> Result<PropertyBags, ModelError> {
        let Some(template) = self.catalog.get(name) else {
            tracing::warn!(query = name, catalog = self.catalog.name(), "query not found in catalog");
            return Ok(PropertyBags::default());
        };
        let text = inject_params(template, params);
        let started = Instant::now();
        let rows = self.store.query(&text)?;
        tracing::debug!(
            query = name,
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "named query evaluated"
        );
        Ok(rows)
    }

    // ========================================================================
    // Derived facts
    // ========================================================================

    /// Whether the case uses node-breaker topology: true iff some model
    /// declares the equipment-operation profile. Defaults to false
    /// (bus-breaker) when the probe is undefined, empty, or non-matching.
    pub fn is_node_breaker(&self) -> Result<bool, ModelError> {
        if let Some(cached) = self.node_breaker.get() {
            return Ok(cached);
        }
        let computed = self.compute_node_breaker()?;
        self.node_breaker.set(Some(computed));
        Ok(computed)
    }

    fn compute_node_breaker(&self) -> Result<bool, ModelError> {
        if !self.catalog.contains(MODEL_PROFILES) {
            return Ok(false);
        }
        let profiles = self.named_query(MODEL_PROFILES, &[])?;
        let node_breaker = profiles.iter().any(|m| {
            m.get(PROFILE)
                .is_some_and(|p| p.contains(EQUIPMENT_OPERATION_MARKER))
        });
        if node_breaker {
            tracing::info!("case declares an equipment-operation profile, treating topology as node-breaker");
        }
        Ok(node_breaker)
    }

    /// Whether core equipment data is present. Catalogs without the
    /// profile probe (CIM14) are assumed to carry it.
    pub fn has_equipment_core(&self) -> Result<bool, ModelError> {
        if !self.catalog.contains(MODEL_PROFILES) {
            return Ok(true);
        }
        let profiles = self.named_query(MODEL_PROFILES, &[])?;
        Ok(profiles.iter().any(|m| {
            m.get(PROFILE)
                .is_some_and(|p| p.contains(EQUIPMENT_CORE_MARKER))
        }))
    }

    /// Identifier of the loaded model; `"unknown"` when no model metadata
    /// is available.
    pub fn model_id(&self) -> Result<String, ModelError> {
        if !self.catalog.contains("modelIds") {
            return Ok("unknown".to_string());
        }
        let rows = self.named_query("modelIds", &[])?;
        if tracing::enabled!(tracing::Level::DEBUG) && !rows.is_empty() {
            tracing::debug!(candidates = %rows.tabulate(), "candidates to model identifier");
        }
        Ok(rows
            .first()
            .and_then(|m| m.get(FULL_MODEL))
            .unwrap_or("unknown")
            .to_string())
    }

    /// The scenario instant the case describes; the caller-supplied
    /// reference instant when unavailable.
    pub fn scenario_time(&self) -> Result<DateTime<Utc>, ModelError> {
        self.query_date("scenarioTime")
    }

    /// When the case was produced; the caller-supplied reference instant
    /// when unavailable.
    pub fn created(&self) -> Result<DateTime<Utc>, ModelError> {
        self.query_date("created")
    }

    fn query_date(&self, field: &str) -> Result<DateTime<Utc>, ModelError> {
        if !self.catalog.contains("modelDates") {
            return Ok(self.reference_instant);
        }
        let rows = self.named_query("modelDates", &[])?;
        // Several FullModel headers may be loaded; the first one carrying the
        // field wins.
        let Some(value) = rows
            .iter()
            .find_map(|m| m.get(field).filter(|v| !v.is_empty()))
        else {
            return Ok(self.reference_instant);
        };
        match parse_model_date(value) {
            Some(date) => Ok(date),
            None => {
                tracing::error!(field, value, "invalid date, keeping default");
                Ok(self.reference_instant)
            }
        }
    }

    /// Schema version string of the loaded data, `"unknown"` when the data
    /// carries none. The `version` query, alone among the named queries, is
    /// expected to exist in every catalog; its absence is a catalog defect.
    pub fn version(&self) -> Result<String, ModelError> {
        if !self.catalog.contains(VERSION_QUERY) {
            return Err(ModelError::CatalogIntegrity {
                catalog: self.catalog.name().to_string(),
                query: VERSION_QUERY.to_string(),
            });
        }
        let rows = self.named_query(VERSION_QUERY, &[])?;
        Ok(rows
            .first()
            .and_then(|m| m.get(VERSION_QUERY))
            .unwrap_or("unknown")
            .to_string())
    }

    // ========================================================================
    // Domain accessors
    // ========================================================================

    pub fn full_models(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("fullModels", &[])
    }

    pub fn model_profiles(&self) -> Result<PropertyBags, ModelError> {
        self.named_query(MODEL_PROFILES, &[])
    }

    pub fn num_objects_by_type(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("numObjectsByType", &[&self.cim_namespace])
    }

    pub fn all_objects_of_type(&self, object_type: &str) -> Result<PropertyBags, ModelError> {
        self.named_query("allObjectsOfType", &[object_type])
    }

    pub fn base_voltages(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("baseVoltages", &[])
    }

    pub fn substations(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("substations", &[])
    }

    pub fn voltage_levels(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("voltageLevels", &[])
    }

    pub fn terminals(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("terminals", &[])
    }

    pub fn connectivity_nodes(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("connectivityNodes", &[])
    }

    pub fn topological_nodes(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("topologicalNodes", &[])
    }

    pub fn connectivity_node_containers(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("connectivityNodeContainers", &[])
    }

    pub fn switches(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("switches", &[])
    }

    pub fn ac_line_segments(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("acLineSegments", &[])
    }

    pub fn transformers(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("transformers", &[])
    }

    pub fn transformer_ends(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("transformerEnds", &[])
    }

    pub fn ratio_tap_changers(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("ratioTapChangers", &[])
    }

    pub fn phase_tap_changers(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("phaseTapChangers", &[])
    }

    /// Table points of one phase tap changer table.
    pub fn phase_tap_changer_table(&self, table_id: &str) -> Result<PropertyBags, ModelError> {
        self.named_query("phaseTapChangerTable", &[table_id])
    }

    pub fn energy_consumers(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("energyConsumers", &[])
    }

    pub fn energy_sources(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("energySources", &[])
    }

    pub fn shunt_compensators(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("shuntCompensators", &[])
    }

    pub fn synchronous_machines(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("synchronousMachines", &[])
    }

    pub fn static_var_compensators(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("staticVarCompensators", &[])
    }

    pub fn operational_limits(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("operationalLimits", &[])
    }

    pub fn sv_voltages(&self) -> Result<PropertyBags, ModelError> {
        self.named_query("svVoltages", &[])
    }

    // ========================================================================
    // Write-back
    // ========================================================================

    pub fn add_sv_voltages(&mut self, objects: &PropertyBags) -> Result<(), ModelError> {
        self.add(ProfileKind::StateVariables, "SvVoltage", objects)
    }

    pub fn add_sv_power_flows(&mut self, objects: &PropertyBags) -> Result<(), ModelError> {
        self.add(ProfileKind::StateVariables, "SvPowerFlow", objects)
    }

    pub fn add_sv_shunt_compensator_sections(
        &mut self,
        objects: &PropertyBags,
    ) -> Result<(), ModelError> {
        self.add(
            ProfileKind::StateVariables,
            "SvShuntCompensatorSections",
            objects,
        )
    }

    pub fn add_sv_tap_steps(&mut self, objects: &PropertyBags) -> Result<(), ModelError> {
        self.add(ProfileKind::StateVariables, "SvTapStep", objects)
    }

    /// Insert one object per row into the named graph of `profile`.
    pub fn add(
        &mut self,
        profile: ProfileKind,
        object_type: &str,
        objects: &PropertyBags,
    ) -> Result<(), ModelError> {
        let context = self.context_for(profile)?;
        self.store
            .add(&context, &self.cim_namespace, object_type, objects)?;
        Ok(())
    }

    /// Remove every named graph belonging to `profile`.
    pub fn clear_profile(&mut self, profile: ProfileKind) -> Result<(), ModelError> {
        let marker = format!("_{}", profile.marker());
        for name in self.store.context_names() {
            if name.contains(&marker) {
                self.store.clear(&name)?;
            }
        }
        Ok(())
    }

    /// The destination graph for a profile: a loaded context carrying the
    /// profile marker when one exists, a name derived from the model id
    /// otherwise. Needs at least one loaded document.
    fn context_for(&self, profile: ProfileKind) -> Result<String, ModelError> {
        let names = self.store.context_names();
        if names.is_empty() {
            return Err(ModelError::UpdateBeforeLoad);
        }
        let marker = format!("_{}", profile.marker());
        if let Some(existing) = names.iter().find(|n| n.contains(&marker)) {
            return Ok(existing.clone());
        }
        Ok(format!("{}_{}.xml", self.model_id()?, profile.marker()))
    }
}

/// ISO-8601 with or without sub-second digits; a timestamp without an
/// explicit offset is read as UTC.
fn parse_model_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn model_dates_parse_with_and_without_offset() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_model_date("2026-01-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_model_date("2026-01-15T10:30:00"), Some(expected));
        assert_eq!(
            parse_model_date("2026-01-15T11:30:00+01:00"),
            Some(expected)
        );
        assert_eq!(
            parse_model_date("2026-01-15T10:30:00.250"),
            Some(expected + chrono::Duration::milliseconds(250))
        );
        assert_eq!(parse_model_date("not-a-date"), None);
    }

    #[test]
    fn profile_markers() {
        assert_eq!(ProfileKind::EquipmentCore.marker(), "EQ");
        assert_eq!(ProfileKind::StateVariables.marker(), "SV");
    }
}
