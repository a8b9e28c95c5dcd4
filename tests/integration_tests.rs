//! Integration tests for the complete pipeline across crates:
//! load profile documents → cross-profile queries → derived facts →
//! state-variable write-back → serialization → reload.
//!
//! Run with: cargo test --test integration_tests

use chrono::{DateTime, TimeZone, Utc};
use cimgraph_model::{CgmesModel, CimVersion, ProfileKind};
use cimgraph_store::{MemorySink, PropertyBags, StoreOptions, TripleStoreRegistry};

const BASE: &str = "http://example.com/case";
const CIM16_NS: &str = "http://iec.ch/TC57/2013/CIM-schema-cim16#";

const EQ_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:cim="http://iec.ch/TC57/2013/CIM-schema-cim16#"
         xmlns:md="http://iec.ch/TC57/61970-552/ModelDescription/1#">
  <md:FullModel rdf:about="urn:uuid:eq-model-1">
    <md:Model.profile>http://entsoe.eu/CIM/EquipmentCore/3/1</md:Model.profile>
    <md:Model.profile>http://entsoe.eu/CIM/EquipmentOperation/3/1</md:Model.profile>
    <md:Model.scenarioTime>2026-01-15T10:30:00Z</md:Model.scenarioTime>
  </md:FullModel>
  <cim:IEC61970CIMVersion rdf:ID="_version">
    <cim:IEC61970CIMVersion.version>IEC61970CIM16v26</cim:IEC61970CIMVersion.version>
  </cim:IEC61970CIMVersion>
  <cim:Substation rdf:ID="_S1">
    <cim:IdentifiedObject.name>Central</cim:IdentifiedObject.name>
  </cim:Substation>
  <cim:ACLineSegment rdf:ID="_LN1">
    <cim:IdentifiedObject.name>Line 1</cim:IdentifiedObject.name>
    <cim:ACLineSegment.r>0.5</cim:ACLineSegment.r>
    <cim:ACLineSegment.x>4.2</cim:ACLineSegment.x>
  </cim:ACLineSegment>
  <cim:Terminal rdf:ID="_T1">
    <cim:Terminal.ConductingEquipment rdf:resource="#_LN1"/>
  </cim:Terminal>
  <cim:Terminal rdf:ID="_T2">
    <cim:Terminal.ConductingEquipment rdf:resource="#_LN1"/>
  </cim:Terminal>
</rdf:RDF>
"##;

const TP_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:cim="http://iec.ch/TC57/2013/CIM-schema-cim16#">
  <cim:TopologicalNode rdf:ID="_TN1">
    <cim:IdentifiedObject.name>TN 1</cim:IdentifiedObject.name>
  </cim:TopologicalNode>
  <rdf:Description rdf:about="#_T1">
    <cim:Terminal.TopologicalNode rdf:resource="#_TN1"/>
  </rdf:Description>
  <rdf:Description rdf:about="#_T2">
    <cim:Terminal.TopologicalNode rdf:resource="#_TN1"/>
  </rdf:Description>
</rdf:RDF>
"##;

fn reference_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn loaded_model() -> CgmesModel {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let registry = TripleStoreRegistry::with_defaults();
    let store = registry
        .sole()
        .expect("one backend registered")
        .create(StoreOptions::default())
        .unwrap();
    let mut model =
        CgmesModel::new(store, CimVersion::Cim16, CIM16_NS, reference_instant()).unwrap();
    for (name, content) in [("case_EQ.xml", EQ_XML), ("case_TP.xml", TP_XML)] {
        let mut bytes = content.as_bytes();
        model.read(BASE, name, &mut bytes).unwrap();
    }
    model
}

fn canonical_rows(bags: &PropertyBags) -> Vec<Vec<(String, String, bool)>> {
    let mut rows: Vec<Vec<(String, String, bool)>> = bags
        .iter()
        .map(|bag| {
            bag.fields()
                .map(|(n, v)| (n.to_string(), v.as_str().to_string(), v.is_resource()))
                .collect()
        })
        .collect();
    rows.sort();
    rows
}

#[test]
fn test_load_query_update_serialize_reload() {
    let mut model = loaded_model();

    // Derived facts from model metadata.
    assert_eq!(model.version().unwrap(), "IEC61970CIM16v26");
    assert_eq!(model.model_id().unwrap(), "urn:uuid:eq-model-1");
    assert!(model.is_node_breaker().unwrap());
    assert_eq!(
        model.scenario_time().unwrap(),
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap()
    );

    // Cross-profile join: equipment from EQ, node associations from TP.
    let terminals = model.terminals().unwrap();
    assert_eq!(terminals.len(), 2);
    assert!(terminals.iter().all(|t| t.get("TopologicalNode").is_some()));

    // Write back computed state variables.
    let mut sv = PropertyBags::with_names(&["TopologicalNode", "v", "angle"]);
    let mut row = sv.new_bag();
    row.put_resource("TopologicalNode", "http://example.com/case#_TN1");
    row.put("v", "408.3");
    row.put("angle", "-0.6");
    sv.push(row);
    model.add_sv_voltages(&sv).unwrap();
    assert_eq!(model.sv_voltages().unwrap().len(), 1);

    // Serialize everything, one stream per named graph.
    let mut sink = MemorySink::new();
    model.write(&mut sink).unwrap();
    assert_eq!(
        sink.names(),
        vec!["case_EQ.xml", "case_TP.xml", "urn:uuid:eq-model-1_SV.xml"]
    );

    // Reload the serialized streams into a fresh model: representative
    // queries come back row-for-row, field-for-field.
    let registry = TripleStoreRegistry::with_defaults();
    let store = registry
        .resolve("oxigraph")
        .unwrap()
        .create(StoreOptions::default())
        .unwrap();
    let mut reloaded =
        CgmesModel::new(store, CimVersion::Cim16, CIM16_NS, reference_instant()).unwrap();
    for name in sink.names() {
        let mut bytes = sink.contents(name).unwrap();
        reloaded.read(BASE, name, &mut bytes).unwrap();
    }

    assert_eq!(
        canonical_rows(&model.terminals().unwrap()),
        canonical_rows(&reloaded.terminals().unwrap())
    );
    assert_eq!(
        canonical_rows(&model.sv_voltages().unwrap()),
        canonical_rows(&reloaded.sv_voltages().unwrap())
    );
    assert_eq!(reloaded.version().unwrap(), "IEC61970CIM16v26");
}

#[test]
fn test_profile_scoped_serialization_after_update() {
    let mut model = loaded_model();
    let mut sv = PropertyBags::with_names(&["TopologicalNode", "v", "angle"]);
    let mut row = sv.new_bag();
    row.put_resource("TopologicalNode", "http://example.com/case#_TN1");
    row.put("v", "401.0");
    row.put("angle", "0.0");
    sv.push(row);
    model.add_sv_voltages(&sv).unwrap();

    let mut sink = MemorySink::new();
    model
        .write_profile(&mut sink, ProfileKind::StateVariables)
        .unwrap();
    assert_eq!(sink.len(), 1);
    let text = std::str::from_utf8(sink.contents("urn:uuid:eq-model-1_SV.xml").unwrap()).unwrap();
    assert!(text.contains("SvVoltage"));
}
