#![cfg(feature = "umya")]

use super::xlsx_package;
use crate::error::IoError;
use crate::traits::{
    BackendCaps, CellComment, CellData, CellFont, CellStyle, MergedRange, SheetData,
    SpreadsheetReader,
};
use sheetfeed_common::{CellValue, DateSystem, ExcelErrorKind};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use umya_spreadsheet::{CellRawValue, EnumTrait, Spreadsheet, reader::xlsx};

/// xlsx reader exposing values, formulas, styles, fonts, comments and
/// merged regions.
pub struct UmyaAdapter {
    workbook: Spreadsheet,
    // Raw package, kept for note text umya does not expose
    package: Vec<u8>,
    date_system: DateSystem,
}

impl UmyaAdapter {
    fn convert_cell_value(cv: &umya_spreadsheet::CellValue) -> CellValue {
        let raw = cv.get_raw_value();
        if raw.is_empty() {
            return CellValue::Blank;
        }
        if raw.is_error() {
            // Map string representation -> error kind
            let txt = cv.get_value();
            return CellValue::Error(ExcelErrorKind::parse(&txt).unwrap_or(ExcelErrorKind::Value));
        }
        match raw {
            CellRawValue::Numeric(n) => CellValue::Numeric(*n),
            CellRawValue::Bool(b) => CellValue::Boolean(*b),
            CellRawValue::String(s) => CellValue::Text(s.to_string()),
            CellRawValue::RichText(rt) => CellValue::Text(rt.get_text().to_string()),
            CellRawValue::Lazy(s) => {
                let txt: &str = s.as_ref();
                if let Ok(n) = txt.parse::<f64>() {
                    CellValue::Numeric(n)
                } else if txt.eq_ignore_ascii_case("TRUE") {
                    CellValue::Boolean(true)
                } else if txt.eq_ignore_ascii_case("FALSE") {
                    CellValue::Boolean(false)
                } else {
                    CellValue::Text(txt.to_string())
                }
            }
            CellRawValue::Error(_) | CellRawValue::Empty => CellValue::Blank,
        }
    }

    fn convert_style(style: &umya_spreadsheet::Style) -> CellStyle {
        let mut out = CellStyle::default();
        if let Some(nf) = style.get_number_format() {
            out.number_format = Some(nf.get_format_code().to_string());
            out.number_format_id = Some(*nf.get_number_format_id());
        }
        if let Some(al) = style.get_alignment() {
            out.horizontal_alignment = Some(al.get_horizontal().get_value_string().to_string());
            out.vertical_alignment = Some(al.get_vertical().get_value_string().to_string());
            out.wrap_text = Some(*al.get_wrap_text());
            out.rotation = Some(*al.get_text_rotation());
        }
        if let Some(pf) = style.get_fill().and_then(|f| f.get_pattern_fill()) {
            out.fill_pattern = Some(pf.get_pattern_type().get_value_string().to_string());
            out.fill_foreground_color = pf.get_foreground_color().map(|c| c.get_argb().to_string());
            out.fill_background_color = pf.get_background_color().map(|c| c.get_argb().to_string());
        }
        if let Some(b) = style.get_borders() {
            out.border_top = Some(b.get_top().get_border_style().to_string());
            out.border_bottom = Some(b.get_bottom().get_border_style().to_string());
            out.border_left = Some(b.get_left().get_border_style().to_string());
            out.border_right = Some(b.get_right().get_border_style().to_string());
        }
        if let Some(p) = style.get_protection() {
            out.locked = Some(*p.get_locked());
            // umya only hands out `hidden` through a mutable borrow
            out.hidden = Some(*p.clone().get_hidden());
        }
        out.font = style.get_font().map(Self::convert_font);
        out
    }

    fn convert_font(font: &umya_spreadsheet::Font) -> CellFont {
        CellFont {
            name: Some(font.get_name().to_string()),
            size: Some(*font.get_size()),
            bold: Some(*font.get_bold()),
            italic: Some(*font.get_italic()),
            underline: Some(font.get_underline().to_string()),
            strikeout: Some(*font.get_strikethrough()),
            color: Some(font.get_color().get_argb().to_string()),
        }
    }
}

impl SpreadsheetReader for UmyaAdapter {
    fn capabilities(&self) -> BackendCaps {
        BackendCaps {
            read: true,
            formulas: true,
            styles: true,
            comments: true,
            merged_cells: true,
            bytes_input: true,
            date_system_1904: true,
        }
    }

    fn sheet_names(&self) -> Result<Vec<String>, IoError> {
        let count = self.workbook.get_sheet_count();
        let mut names = Vec::with_capacity(count);
        for i in 0..count {
            if let Some(s) = self.workbook.get_sheet(&i) {
                names.push(s.get_name().to_string());
            }
        }
        Ok(names)
    }

    fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let bytes = std::fs::read(path)?;
        Self::open_bytes(bytes)
    }

    fn open_bytes(data: Vec<u8>) -> Result<Self, IoError> {
        // Full read: every sheet is deserialised up front
        let workbook = xlsx::read_reader(Cursor::new(data.as_slice()), true)
            .map_err(|e| IoError::from_backend("umya", e))?;
        let date_system = if xlsx_package::uses_1904(&data)? {
            DateSystem::Excel1904
        } else {
            DateSystem::Excel1900
        };
        Ok(Self {
            workbook,
            package: data,
            date_system,
        })
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, IoError> {
        let ws = self
            .workbook
            .get_sheet_by_name(sheet)
            .ok_or_else(|| IoError::SheetNotFound(sheet.to_string()))?;

        let mut cells: BTreeMap<(u32, u32), CellData> = BTreeMap::new();
        for cell in ws.get_cell_collection() {
            // umya coordinates are 1-based
            let coord = cell.get_coordinate();
            let col = *coord.get_col_num() - 1;
            let row = *coord.get_row_num() - 1;
            let cv = cell.get_cell_value();
            let value = Self::convert_cell_value(cv);
            let mut data = if cv.is_formula() && !cv.get_formula().is_empty() {
                CellData::from_formula(cv.get_formula().to_string(), value)
            } else {
                CellData::from_value(value)
            };
            data.style = Some(Self::convert_style(cell.get_style()));
            cells.insert((row, col), data);
        }

        let mut texts = if ws.get_comments().is_empty() {
            Default::default()
        } else {
            xlsx_package::comment_texts(&self.package, sheet)?
        };
        for comment in ws.get_comments() {
            let coord = comment.get_coordinate();
            let key = (*coord.get_row_num() - 1, *coord.get_col_num() - 1);
            let author = comment.get_author();
            let note = CellComment {
                author: (!author.is_empty()).then(|| author.to_string()),
                text: texts.remove(&key).unwrap_or_default(),
                visible: None,
            };
            cells.entry(key).or_default().comment = Some(note);
        }

        let mut merged_cells = Vec::new();
        for range in ws.get_merge_cells() {
            merged_cells.push(MergedRange::parse(&range.get_range())?);
        }

        Ok(SheetData {
            name: ws.get_name().to_string(),
            cells,
            merged_cells,
            hidden: false,
            date_system: self.date_system,
        })
    }
}
