//! Style, font, comment and type facets of a cell, always forwarded as text.

use super::CellVisitor;
use crate::binding::ColumnBinding;
use crate::error::ParseError;
use crate::record::CellHandle;
use crate::sink::RowWriter;
use serde_json::{Map, Value as JsonValue};
use sheetfeed_common::CellType;
use sheetfeed_io::{CellComment, CellFont, CellStyle};

pub const STYLE_ATTRIBUTES: &[&str] = &[
    "number_format",
    "number_format_id",
    "horizontal_alignment",
    "vertical_alignment",
    "wrap_text",
    "fill_pattern",
    "fill_foreground_color",
    "fill_background_color",
    "border_top",
    "border_bottom",
    "border_left",
    "border_right",
    "locked",
    "hidden",
    "rotation",
    "indent",
];

pub const FONT_ATTRIBUTES: &[&str] = &[
    "name",
    "size",
    "bold",
    "italic",
    "underline",
    "strikeout",
    "color",
];

pub const COMMENT_ATTRIBUTES: &[&str] = &["author", "text", "visible"];

fn text<T: Clone + Into<JsonValue>>(value: &Option<T>) -> Option<JsonValue> {
    value.clone().map(Into::into)
}

pub fn style_attribute(style: &CellStyle, name: &str) -> Option<JsonValue> {
    match name {
        "number_format" => text(&style.number_format),
        "number_format_id" => text(&style.number_format_id),
        "horizontal_alignment" => text(&style.horizontal_alignment),
        "vertical_alignment" => text(&style.vertical_alignment),
        "wrap_text" => text(&style.wrap_text),
        "fill_pattern" => text(&style.fill_pattern),
        "fill_foreground_color" => text(&style.fill_foreground_color),
        "fill_background_color" => text(&style.fill_background_color),
        "border_top" => text(&style.border_top),
        "border_bottom" => text(&style.border_bottom),
        "border_left" => text(&style.border_left),
        "border_right" => text(&style.border_right),
        "locked" => text(&style.locked),
        "hidden" => text(&style.hidden),
        "rotation" => text(&style.rotation),
        "indent" => text(&style.indent),
        _ => None,
    }
}

pub fn font_attribute(font: &CellFont, name: &str) -> Option<JsonValue> {
    match name {
        "name" => text(&font.name),
        "size" => text(&font.size),
        "bold" => text(&font.bold),
        "italic" => text(&font.italic),
        "underline" => text(&font.underline),
        "strikeout" => text(&font.strikeout),
        "color" => text(&font.color),
        _ => None,
    }
}

pub fn comment_attribute(comment: &CellComment, name: &str) -> Option<JsonValue> {
    match name {
        "author" => text(&comment.author),
        "text" => Some(JsonValue::String(comment.text.clone())),
        "visible" => text(&comment.visible),
        _ => None,
    }
}

// Present attributes as a JSON object (keys sorted)
fn describe(names: &[&str], lookup: impl Fn(&str) -> Option<JsonValue>) -> String {
    let mut map = Map::new();
    for name in names {
        if let Some(value) = lookup(*name) {
            map.insert((*name).to_string(), value);
        }
    }
    JsonValue::Object(map).to_string()
}

fn emit(
    binding: &ColumnBinding,
    value: Option<JsonValue>,
    visitor: &dyn CellVisitor,
    out: &mut dyn RowWriter,
) -> Result<(), ParseError> {
    match value {
        None | Some(JsonValue::Null) => visitor.visit_null(binding, out),
        Some(JsonValue::String(s)) => visitor.visit_string(binding, &s, out),
        Some(other) => visitor.visit_string(binding, &other.to_string(), out),
    }
}

pub fn visit_cell_style(
    binding: &ColumnBinding,
    cell: &CellHandle<'_>,
    attribute: Option<&str>,
    visitor: &dyn CellVisitor,
    out: &mut dyn RowWriter,
) -> Result<(), ParseError> {
    let Some(style) = cell.data().style.as_ref() else {
        return visitor.visit_null(binding, out);
    };
    match attribute {
        Some(name) => emit(binding, style_attribute(style, name), visitor, out),
        None => {
            let json = describe(STYLE_ATTRIBUTES, |name| style_attribute(style, name));
            visitor.visit_string(binding, &json, out)
        }
    }
}

pub fn visit_cell_font(
    binding: &ColumnBinding,
    cell: &CellHandle<'_>,
    attribute: Option<&str>,
    visitor: &dyn CellVisitor,
    out: &mut dyn RowWriter,
) -> Result<(), ParseError> {
    let Some(font) = cell.data().style.as_ref().and_then(|s| s.font.as_ref()) else {
        return visitor.visit_null(binding, out);
    };
    match attribute {
        Some(name) => emit(binding, font_attribute(font, name), visitor, out),
        None => {
            let json = describe(FONT_ATTRIBUTES, |name| font_attribute(font, name));
            visitor.visit_string(binding, &json, out)
        }
    }
}

pub fn visit_cell_comment(
    binding: &ColumnBinding,
    cell: &CellHandle<'_>,
    attribute: Option<&str>,
    visitor: &dyn CellVisitor,
    out: &mut dyn RowWriter,
) -> Result<(), ParseError> {
    let Some(comment) = cell.data().comment.as_ref() else {
        return visitor.visit_null(binding, out);
    };
    match attribute {
        Some(name) => emit(binding, comment_attribute(comment, name), visitor, out),
        None => visitor.visit_string(binding, &comment.text, out),
    }
}

pub fn visit_cell_type(
    binding: &ColumnBinding,
    cell_type: CellType,
    visitor: &dyn CellVisitor,
    out: &mut dyn RowWriter,
) -> Result<(), ParseError> {
    visitor.visit_string(binding, cell_type.label(), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use crate::sink::{RowBuffer, Value};
    use crate::visitor::StringCellVisitor;
    use crate::visitor::test_support::{binding, single};
    use sheetfeed_io::{CellData, SheetData};

    #[test]
    fn style_description_skips_absent_attributes() {
        let style = CellStyle {
            number_format: Some("0.00".into()),
            wrap_text: Some(true),
            rotation: Some(90),
            ..Default::default()
        };
        assert_eq!(
            describe(STYLE_ATTRIBUTES, |n| style_attribute(&style, n)),
            r#"{"number_format":"0.00","rotation":90,"wrap_text":true}"#
        );
        assert_eq!(style_attribute(&style, "indent"), None);
    }

    #[test]
    fn font_attributes_render_as_text() {
        let font = CellFont {
            name: Some("Calibri".into()),
            size: Some(11.0),
            bold: Some(true),
            color: Some("FFFF0000".into()),
            ..Default::default()
        };
        assert_eq!(
            describe(FONT_ATTRIBUTES, |n| font_attribute(&font, n)),
            r#"{"bold":true,"color":"FFFF0000","name":"Calibri","size":11.0}"#
        );
        assert_eq!(font_attribute(&font, "italic"), None);
        assert_eq!(font_attribute(&font, "weight"), None);

        let comment = CellComment::default();
        assert_eq!(
            comment_attribute(&comment, "text"),
            Some(JsonValue::String(String::new()))
        );
    }

    #[test]
    fn annotated_cell_facets() {
        let mut sheet = SheetData::new("Data");
        let style = CellStyle {
            locked: Some(true),
            ..Default::default()
        };
        let note = CellComment {
            author: Some("ops".into()),
            text: "verify".into(),
            visible: None,
        };
        sheet.insert(0, 0, CellData::from_value(1.0).with_style(style).with_comment(note));
        sheet.insert(0, 1, CellData::from_value(2.0));
        let annotated = CellHandle::at(&sheet, 0, 0).unwrap();
        let plain = CellHandle::at(&sheet, 0, 1).unwrap();
        let b = binding(ColumnType::String);
        let mut buf = RowBuffer::new(1);

        visit_cell_comment(&b, &annotated, None, &StringCellVisitor, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::String("verify".into()));
        visit_cell_comment(&b, &annotated, Some("author"), &StringCellVisitor, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::String("ops".into()));
        visit_cell_style(&b, &annotated, Some("locked"), &StringCellVisitor, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::String("true".into()));

        visit_cell_comment(&b, &plain, None, &StringCellVisitor, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Null);
        visit_cell_style(&b, &plain, None, &StringCellVisitor, &mut buf).unwrap();
        assert_eq!(single(&buf), Value::Null);
    }
}
