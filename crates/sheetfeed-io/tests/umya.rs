// Integration test for the umya backend; run with `--features umya`.
use sheetfeed_common::{CellType, CellValue};
use sheetfeed_io::{MergedRange, SpreadsheetReader, UmyaAdapter, load_workbook};
use sheetfeed_testkit::build_workbook;

#[test]
fn umya_reads_values_formulas_and_merges() {
    let path = build_workbook(|book| {
        let sh = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sh.get_cell_mut((1, 1)).set_value_number(10); // A1
        sh.get_cell_mut((2, 1)).set_formula("A1*2"); // B1
        sh.get_cell_mut((1, 2)).set_value("hello"); // A2
        sh.get_cell_mut((2, 2)).set_value_bool(true); // B2
        sh.add_merge_cells("A3:B4");
    });

    let mut adapter = UmyaAdapter::open_path(&path).unwrap();
    assert_eq!(adapter.sheet_names().unwrap(), vec!["Sheet1"]);

    let sheet = adapter.read_sheet("Sheet1").unwrap();
    assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::Numeric(10.0));
    assert_eq!(sheet.cell(0, 1).unwrap().formula.as_deref(), Some("A1*2"));
    assert_eq!(sheet.cell(0, 1).unwrap().cell_type(), CellType::Formula);
    assert_eq!(sheet.cell(1, 0).unwrap().value, CellValue::Text("hello".into()));
    assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::Boolean(true));
    assert_eq!(
        sheet.merged_cells,
        vec![MergedRange::parse("A3:B4").unwrap()]
    );
    assert!(sheet.merged_region_at(3, 1).is_some());
}

#[test]
fn umya_exposes_styles_and_fonts() {
    let path = build_workbook(|book| {
        let sh = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sh.get_cell_mut("A1").set_value_number(44197);
        let style = sh.get_style_mut("A1");
        style.get_font_mut().set_bold(true);
        style.get_number_format_mut().set_format_code("yyyy-mm-dd");
    });

    let bytes = std::fs::read(&path).unwrap();
    let mut adapter = UmyaAdapter::open_bytes(bytes).unwrap();
    let sheet = adapter.read_sheet("Sheet1").unwrap();
    let style = sheet.cell(0, 0).and_then(|c| c.style.as_ref()).unwrap();
    assert_eq!(style.number_format.as_deref(), Some("yyyy-mm-dd"));
    assert_eq!(style.font.as_ref().and_then(|f| f.bold), Some(true));
}

#[test]
fn loader_dispatches_xlsx_to_umya() {
    let path = build_workbook(|book| {
        let sh = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sh.get_cell_mut((3, 5)).set_value_number(1.5); // C5
    });
    let book = load_workbook(&path).unwrap();
    let sheet = book.sheet("Sheet1").unwrap();
    assert_eq!(sheet.cell(4, 2).unwrap().value, CellValue::Numeric(1.5));
    assert!(adapter_missing_sheet(&path));
}

fn adapter_missing_sheet(path: &std::path::Path) -> bool {
    let mut adapter = UmyaAdapter::open_path(path).unwrap();
    adapter.read_sheet("Nope").is_err()
}

#[test]
fn umya_reads_notes_and_protection() {
    let path = build_workbook(|book| {
        let sh = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sh.get_cell_mut("B2").set_value("checked");
        sh.get_style_mut("B2").get_protection_mut().set_locked(true);
        let mut note = umya_spreadsheet::Comment::default();
        note.new_comment("B2");
        note.set_author("ops");
        note.set_text_string("verify before close");
        sh.add_comments(note);
    });

    let mut adapter = UmyaAdapter::open_path(&path).unwrap();
    let sheet = adapter.read_sheet("Sheet1").unwrap();
    let cell = sheet.cell(1, 1).unwrap();
    let comment = cell.comment.as_ref().unwrap();
    assert_eq!(comment.text, "verify before close");
    assert_eq!(comment.author.as_deref(), Some("ops"));
    let style = cell.style.as_ref().unwrap();
    assert_eq!(style.locked, Some(true));
    assert_eq!(style.hidden, Some(false));
}
