use tabstore::config::CsvOptions;
use tabstore::filter::{filter, logical_and, FilterOp};
use tabstore::model::{CellValue, ColumnData, Dataset, TypeTag};
use tabstore::parser::{from_csv_str, load_csv, save_csv, to_csv_string};
use tabstore::stats;
use tempfile::TempDir;

const PEOPLE: &str = "id,name,age,score,member\n\
                      1,Alice,25,88.5,true\n\
                      2,Bob,25,,false\n\
                      3,\"Carter, Jr\",35,71.25,true\n\
                      4,Dana,40,90,false\n\
                      5,Eli,,64,true\n";

fn people() -> Dataset {
    from_csv_str(PEOPLE).expect("Failed to parse people")
}

#[test]
fn test_inferred_schema() {
    let ds = people();
    assert_eq!(ds.len(), 5);
    assert_eq!(ds.column_type("id"), Some(TypeTag::Int32));
    assert_eq!(ds.column_type("name"), Some(TypeTag::Utf8));
    assert_eq!(ds.column_type("age"), Some(TypeTag::NullableInt32));
    assert_eq!(ds.column_type("score"), Some(TypeTag::NullableFloat32));
    assert_eq!(ds.column_type("member"), Some(TypeTag::Bool));
    assert_eq!(ds.get_column_value::<String>(2, "name").unwrap(), "Carter, Jr");
}

#[test]
fn test_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.csv");
    let ds = people();
    save_csv(&ds, &path, &CsvOptions::default()).unwrap();

    let back = load_csv(&path, &CsvOptions::default()).unwrap();
    assert_eq!(back.column_names(), ds.column_names());
    assert_eq!(back.fields(), ds.fields());
    for name in ds.column_names() {
        assert_eq!(back.column(name).unwrap().data(), ds.column(name).unwrap().data());
    }
}

#[test]
fn test_custom_delimiter_and_precision() {
    let mut ds = Dataset::new();
    ds.add_column("label", ColumnData::from_strs(&["a;b", "c"]))
        .unwrap();
    ds.add_column("ratio", vec![0.5_f32, 1.0]).unwrap();
    let options = CsvOptions::default()
        .with_delimiter(b';')
        .with_float_precision(3);

    let mut buf = Vec::new();
    tabstore::parser::write_csv(&ds, &mut buf, &options).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text, "label;ratio\n\"a;b\";0.500\nc;1.000\n");

    let back = tabstore::parser::read_csv(text.as_bytes(), &options).unwrap();
    assert_eq!(back.get_column::<f32>("ratio").unwrap(), &[0.5, 1.0]);
    assert_eq!(back.get_column_value::<String>(0, "label").unwrap(), "a;b");
}

#[test]
fn test_filter_and_combine() {
    let ds = people();
    let older = filter(&ds, "age", FilterOp::GreaterThan, 30).unwrap();
    assert_eq!(older.get_column::<i32>("id").unwrap(), &[3, 4]);

    let members = filter(&ds, "member", FilterOp::Equal, true).unwrap();
    let both = logical_and(&older, &members).unwrap();
    assert_eq!(both.get_column::<i32>("id").unwrap(), &[3]);

    let none = filter(&ds, "name", FilterOp::StartsWith, "Z").unwrap();
    assert!(none.is_empty());
    assert_eq!(none.column_names(), ds.column_names());
}

#[test]
fn test_stats_on_imported_column() {
    let ds = people();
    assert_eq!(stats::mode(&ds, "age").unwrap(), Some(CellValue::Int(Some(25))));
    assert_eq!(stats::null_count(&ds, "age").unwrap(), 1);
    assert_eq!(stats::max(&ds, "score").unwrap(), Some(90.0));
}

#[test]
fn test_export_then_import_keeps_text() {
    let ds = people();
    let text = to_csv_string(&ds).unwrap();
    assert!(text.starts_with("id,name,age,score,member\n1,Alice,25,88.50,true\n"));
    assert!(text.contains("\"Carter, Jr\""));
    assert!(text.ends_with("5,Eli,,64.00,true\n"));
}
