//! Integration tests focused on error handling and edge cases.
//!
//! A document that is not well-formed, or lacks its templates, fails as a
//! whole. Every other problem is isolated to the element that caused it and
//! reported as a warning while the rest of the document still loads.

use iec61850_rs::{BasicType, FunctionalConstraint, NodeRef, Value};
use iec61850_rs_scl::{ParseReport, SclError, WarningKind, load_scl_from_str};
use std::thread;

/// A minimal valid document used as a base for creating corrupted test cases.
const MINIMAL_VALID_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SCL xmlns="http://www.iec.ch/61850/2003/SCL">
  <IED name="IED1" manufacturer="Test">
    <AccessPoint name="S1">
      <Server>
        <LDevice inst="LD0">
          <LN0 lnClass="LLN0" inst="" lnType="LLN0_T">
            <DataSet name="DS1"><FCDA ldInst="LD0" lnClass="GGIO" lnInst="1" doName="Ind" fc="ST"/></DataSet>
            <ReportControl name="rcb1" datSet="DS1" rptID="R1" intgPd="1000" confRev="1"/>
          </LN0>
          <LN lnClass="GGIO" inst="1" lnType="GGIO_T">
            <DOI name="Ind"><DAI name="stVal"><Val>true</Val></DAI></DOI>
          </LN>
        </LDevice>
      </Server>
    </AccessPoint>
  </IED>
  <DataTypeTemplates>
    <LNodeType id="LLN0_T" lnClass="LLN0"><DO name="Beh" type="ENS_T"/></LNodeType>
    <LNodeType id="GGIO_T" lnClass="GGIO"><DO name="Ind" type="SPS_T"/></LNodeType>
    <DOType id="ENS_T" cdc="ENS"><DA name="stVal" bType="Enum" type="BehKind" fc="ST"/></DOType>
    <DOType id="SPS_T" cdc="SPS">
      <DA name="stVal" bType="BOOLEAN" fc="ST"/>
      <DA name="q" bType="Quality" fc="ST"/>
    </DOType>
    <EnumType id="BehKind"><EnumVal ord="1">on</EnumVal></EnumType>
  </DataTypeTemplates>
</SCL>"#;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn parse(xml: &str) -> ParseReport {
    init_logger();
    load_scl_from_str(xml).expect("document should still load")
}

fn kinds(report: &ParseReport) -> Vec<WarningKind> {
    report.warnings.iter().map(|w| w.kind).collect()
}

#[test]
fn test_minimal_document_is_clean() {
    let report = parse(MINIMAL_VALID_XML);
    assert!(report.warnings.is_empty(), "{:#?}", report.warnings);
    assert_eq!(
        report.references(),
        ["IED1LD0/GGIO1.Ind.q", "IED1LD0/GGIO1.Ind.stVal", "IED1LD0/LLN0.Beh.stVal"]
    );
}

#[test]
fn test_malformed_xml_syntax() {
    init_logger();
    let xml = MINIMAL_VALID_XML.replace("</Server>", "</Serve>");
    let result = load_scl_from_str(&xml);
    assert!(
        matches!(result, Err(SclError::XmlParsing(_))),
        "expected a syntax error, got {:?}",
        result
    );

    let truncated = &MINIMAL_VALID_XML[..MINIMAL_VALID_XML.len() / 2];
    assert!(load_scl_from_str(truncated).is_err());
    assert!(load_scl_from_str("").is_err());
    assert!(load_scl_from_str("not xml at all").is_err());
}

#[test]
fn test_missing_templates_section() {
    init_logger();
    let start = MINIMAL_VALID_XML.find("<DataTypeTemplates>").unwrap();
    let end = MINIMAL_VALID_XML.find("</DataTypeTemplates>").unwrap() + "</DataTypeTemplates>".len();
    let mut xml = MINIMAL_VALID_XML.to_string();
    xml.replace_range(start..end, "");
    let err = load_scl_from_str(&xml).unwrap_err();
    assert!(matches!(
        err,
        SclError::MissingElement {
            element: "DataTypeTemplates"
        }
    ));
    assert_eq!(err.to_string(), "Missing required XML element: DataTypeTemplates");
}

#[test]
fn test_deeply_nested_elements_fail_cleanly() {
    init_logger();
    let depth = 100_000;
    let xml = format!("<SCL>{}{}</SCL>", "<a>".repeat(depth), "</a>".repeat(depth));
    // A small stack catches any per-level recursion while the tree is freed.
    let result = thread::Builder::new()
        .stack_size(512 * 1024)
        .spawn(move || load_scl_from_str(&xml).map(|report| report.devices.len()))
        .unwrap()
        .join()
        .unwrap();
    assert!(matches!(
        result,
        Err(SclError::MissingElement {
            element: "DataTypeTemplates"
        })
    ));
}

#[test]
fn test_document_without_devices() {
    let report = parse(r#"<SCL><DataTypeTemplates/></SCL>"#);
    assert!(report.devices.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_missing_object_type_drops_only_that_object() {
    let xml = MINIMAL_VALID_XML.replace(
        r#"<DO name="Ind" type="SPS_T"/>"#,
        r#"<DO name="Ind" type="Gone"/><DO name="Alm" type="SPS_T"/>"#,
    );
    let report = parse(&xml);
    let device = &report.devices[0];
    assert!(device.resolve("IED1LD0/GGIO1.Ind").is_none());
    assert!(device.resolve("IED1LD0/GGIO1.Alm.stVal").is_some());
    // The missing type, then the instance data that had nothing to land on.
    assert_eq!(kinds(&report), [WarningKind::MissingTemplate, WarningKind::UnmatchedInstance]);
    assert!(report.warnings[0].message.contains("Gone"));
}

#[test]
fn test_self_referencing_attribute_type() {
    let xml = MINIMAL_VALID_XML
        .replace(
            r#"<DA name="q" bType="Quality" fc="ST"/>"#,
            r#"<DA name="loop" bType="Struct" type="Loop" fc="ST"/>"#,
        )
        .replace(
            "<EnumType",
            r#"<DAType id="Loop"><BDA name="v" bType="INT32"/><BDA name="again" bType="Struct" type="Loop"/></DAType><EnumType"#,
        );
    let report = parse(&xml);
    assert_eq!(report.cycles().count(), 1);
    assert!(report.cycles().all(|w| w.message.contains("Loop")));

    // Only the closing child is abandoned; the branch around it survives.
    let device = &report.devices[0];
    let looped = device
        .resolve("IED1LD0/GGIO1.Ind.loop")
        .and_then(NodeRef::as_attribute)
        .unwrap();
    assert!(looped.child("v").is_some());
    assert!(looped.child("again").is_none());
    assert_eq!(looped.child("v").unwrap().fc, FunctionalConstraint::ST);
    assert!(device.lookup("IED1LD0/GGIO1.Ind.stVal").is_some());
}

#[test]
fn test_mutually_referencing_object_types() {
    let xml = MINIMAL_VALID_XML.replace(
        r#"<DOType id="SPS_T" cdc="SPS">"#,
        r#"<DOType id="A_T" cdc="WYE"><SDO name="b" type="B_T"/><DA name="x" bType="INT8" fc="MX"/></DOType>
           <DOType id="B_T" cdc="CMV"><SDO name="a" type="A_T"/></DOType>
           <DOType id="SPS_T" cdc="SPS"><SDO name="w" type="A_T"/>"#,
    );
    let report = parse(&xml);
    assert_eq!(report.cycles().count(), 1);
    let cycle = report.cycles().next().unwrap();
    assert!(cycle.message.contains("A_T"), "{}", cycle);

    let device = &report.devices[0];
    assert!(device.resolve("IED1LD0/GGIO1.Ind.w.b").is_some());
    assert!(device.resolve("IED1LD0/GGIO1.Ind.w.b.a").is_none());
    assert!(device.lookup("IED1LD0/GGIO1.Ind.w.x").is_some());
}

#[test]
fn test_coercion_failure_keeps_text() {
    let xml = MINIMAL_VALID_XML
        .replace("<Val>true</Val>", "<Val>maybe</Val>")
        .replace(r#"name="stVal" bType="BOOLEAN""#, r#"name="stVal" bType="INT8U""#);
    let report = parse(&xml);
    assert_eq!(kinds(&report), [WarningKind::CoercionFailed]);
    assert_eq!(report.warnings[0].context, "IED1/LD0/GGIO1.Ind.stVal");
    let st_val = report.devices[0].lookup("IED1LD0/GGIO1.Ind.stVal").unwrap();
    assert_eq!(st_val.value(), Some(&Value::Text("maybe".to_string())));
}

#[test]
fn test_unknown_basic_type_and_constraint() {
    let xml = MINIMAL_VALID_XML.replace(
        r#"<DA name="q" bType="Quality" fc="ST"/>"#,
        r#"<DA name="q" bType="Quantum" fc="ZZ"/>"#,
    );
    let report = parse(&xml);
    assert_eq!(
        kinds(&report),
        [WarningKind::UnknownFunctionalConstraint, WarningKind::UnknownBasicType]
    );
    let q = report.devices[0].lookup("IED1LD0/GGIO1.Ind.q").unwrap();
    assert_eq!(q.basic_type, BasicType::Unknown);
    assert_eq!(q.fc, FunctionalConstraint::Unspecified);
}

#[test]
fn test_malformed_control_numbers_default_to_zero() {
    let xml = MINIMAL_VALID_XML.replace(r#"intgPd="1000""#, r#"intgPd="soon""#);
    let report = parse(&xml);
    assert_eq!(kinds(&report), [WarningKind::MalformedNumber]);
    let lln0 = report.devices[0]
        .access_point("S1")
        .and_then(|ap| ap.logical_device("LD0"))
        .and_then(|ld| ld.logical_node("LLN0"))
        .unwrap();
    let rcb = lln0.report_control("rcb1").unwrap();
    assert_eq!(rcb.intg_pd, 0);
    assert_eq!(rcb.conf_rev, 1);
}

#[test]
fn test_dangling_data_set_is_kept() {
    let xml = MINIMAL_VALID_XML.replace(r#"datSet="DS1""#, r#"datSet="DS9""#);
    let report = parse(&xml);
    assert_eq!(kinds(&report), [WarningKind::DanglingDataSet]);
    let lln0 = report.devices[0]
        .access_point("S1")
        .and_then(|ap| ap.logical_device("LD0"))
        .and_then(|ld| ld.logical_node("LLN0"))
        .unwrap();
    assert_eq!(lln0.report_control("rcb1").unwrap().data_set.as_deref(), Some("DS9"));
}

#[test]
fn test_duplicate_devices_and_nodes() {
    let ied_start = MINIMAL_VALID_XML.find("<IED").unwrap();
    let ied_end = MINIMAL_VALID_XML.find("</IED>").unwrap() + "</IED>".len();
    let ied = &MINIMAL_VALID_XML[ied_start..ied_end];
    let mut xml = MINIMAL_VALID_XML.to_string();
    xml.insert_str(ied_end, ied);
    let xml = xml.replacen(
        "</LDevice>",
        r#"<LN lnClass="GGIO" inst="1" lnType="LLN0_T"/></LDevice>"#,
        1,
    );
    let report = parse(&xml);
    assert_eq!(report.devices.len(), 1);
    assert_eq!(kinds(&report), [WarningKind::DuplicateName, WarningKind::DuplicateName]);
    // The first GGIO1 won.
    assert!(report.devices[0].lookup("IED1LD0/GGIO1.Ind.stVal").is_some());
}

#[test]
fn test_missing_names_are_skipped() {
    let xml = MINIMAL_VALID_XML
        .replace(r#"<LN lnClass="GGIO""#, r#"<LN lnClass="""#)
        .replace(r#"<LNodeType id="GGIO_T" lnClass="GGIO">"#, r#"<LNodeType id="GGIO_T">"#);
    let report = parse(&xml);
    assert_eq!(kinds(&report), [WarningKind::MissingAttribute]);
    assert!(report.devices[0].resolve("IED1LD0/GGIO1").is_none());
    assert!(report.devices[0].resolve("IED1LD0/LLN0").is_some());
}

#[test]
fn test_deeply_nested_attribute_types() {
    let depth = 64;
    let mut types = String::new();
    for level in 0..depth {
        types.push_str(&format!(
            r#"<DAType id="L{}"><BDA name="n" bType="Struct" type="L{}"/></DAType>"#,
            level,
            level + 1
        ));
    }
    types.push_str(&format!(r#"<DAType id="L{}"><BDA name="leaf" bType="INT32"/></DAType>"#, depth));
    let xml = MINIMAL_VALID_XML
        .replace(
            r#"<DA name="q" bType="Quality" fc="ST"/>"#,
            r#"<DA name="deep" bType="Struct" type="L0" fc="CF"/>"#,
        )
        .replace("<EnumType", &format!("{}<EnumType", types));
    let report = parse(&xml);
    assert!(report.warnings.is_empty(), "{:#?}", report.warnings);

    let address = format!("IED1LD0/GGIO1.Ind.deep{}.leaf", ".n".repeat(depth));
    let leaf = report.devices[0].lookup(&address).expect("deep leaf");
    assert_eq!(leaf.fc, FunctionalConstraint::CF);
}

#[test]
fn test_documents_parse_concurrently() {
    init_logger();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let xml = MINIMAL_VALID_XML.replace("IED1", &format!("IED{}", i + 10));
            thread::spawn(move || load_scl_from_str(&xml).map(|r| r.references()))
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let references = handle.join().expect("parser thread panicked").unwrap();
        assert_eq!(references.len(), 3);
        let prefix = format!("IED{}LD0/", i + 10);
        assert!(references.iter().all(|r| r.starts_with(&prefix)));
    }
}
