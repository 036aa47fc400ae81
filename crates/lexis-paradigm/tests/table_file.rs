use std::io::Write;

use lexis_paradigm::ParadigmTable;
use tempfile::NamedTempFile;

#[test]
fn loads_table_from_json_file() {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{"el-nM-ος-οι": [["ος", "ου", "οι"]], "el-nF-α-ες": [["α", "ας", "ες"]]}}"#
    )
    .unwrap();

    let table = ParadigmTable::load(file.path()).expect("load table");
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.names().collect::<Vec<_>>(),
        vec!["el-nF-α-ες", "el-nM-ος-οι"]
    );
    let forms = table.expand("ώρα", "el-nF-α-ες-1");
    assert!(forms.contains("ώρας"));
    assert!(forms.contains("ώρες"));
    // Overrides replace the built-in rules entirely.
    assert!(!table.expand("δρόμος", "el-nM-ος-οι").contains("δρόμους"));
}

#[test]
fn missing_file_falls_back_to_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let table = ParadigmTable::load(dir.path().join("absent.json")).expect("fallback");
    assert_eq!(table.len(), ParadigmTable::builtin().len());
    assert!(table.is_declension_template("el-nN-ο-α-2"));
}

#[test]
fn malformed_file_is_an_error() {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "not json").unwrap();
    let err = ParadigmTable::load(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("parse paradigms"));
}
