//! Overlays rendered through the device pipeline

use folio_annot::{
    AnnotError, AnnotFlags, AnnotType, FieldAlignment, PageOverlay, TextFormat, WidgetType,
};
use folio_core::{IRect, Matrix, Rect};
use folio_render::{Color, Command, Device, DrawDevice, Pixmap, SvgDevice, SvgDeviceOptions};
use proptest::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn form() -> PageOverlay {
    init_logging();
    let mut overlay = PageOverlay::new();

    let name = overlay
        .create_text_field("name", Rect::new(72.0, 100.0, 300.0, 120.0), Some(40))
        .unwrap();
    let widget = overlay.widget_mut(name).unwrap();
    widget.set_required(true);
    widget.set_value("Grace Hopper").unwrap();

    let when = overlay
        .create_text_field("date", Rect::new(72.0, 130.0, 200.0, 150.0), None)
        .unwrap();
    let widget = overlay.widget_mut(when).unwrap();
    widget.set_text_format(TextFormat::Date);
    widget.set_alignment(FieldAlignment::Right);
    widget.set_value("1906-12-09").unwrap();

    let size = overlay
        .create_widget(WidgetType::ListBox, "size", Rect::new(72.0, 160.0, 200.0, 220.0))
        .unwrap();
    let widget = overlay.widget_mut(size).unwrap();
    for option in ["S", "M", "L"] {
        widget.add_option(option).unwrap();
    }
    widget.set_selected_index(1).unwrap();

    let note = overlay
        .create_annot(AnnotType::FreeText, Rect::new(320.0, 100.0, 500.0, 160.0))
        .unwrap();
    let annot = overlay.annot_mut(note).unwrap();
    annot.set_contents("Confirm the spelling");
    annot.set_author("editor");
    annot.set_color(Some(Color::rgb(0.8, 0.0, 0.0)));
    overlay
}

#[test]
fn test_form_update_and_draw() {
    let mut overlay = form();
    assert_eq!(overlay.update_dirty(), 0);
    assert!(!overlay.has_dirty());

    let mut device = DrawDevice::new(Pixmap::new(IRect::new(0, 0, 612, 792)).unwrap());
    device.begin_page(&Rect::from_size(612.0, 792.0)).unwrap();
    overlay.run(&mut device, &Matrix::IDENTITY, None).unwrap();
    device.end_page().unwrap();
    device.close().unwrap();

    let texts: Vec<String> = device
        .trace()
        .iter()
        .filter_map(|op| match &op.command {
            Command::FillText { span, .. } => Some(span.text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(texts[0], "Confirm the spelling");
    assert!(texts.contains(&"Grace Hopper".to_string()));
    assert!(texts.contains(&"1906-12-09".to_string()));
    assert!(texts.contains(&"M".to_string()));
}

#[test]
fn test_overlay_to_svg_scaled() {
    let mut overlay = form();
    overlay.update_dirty();
    let list = overlay.to_display_list(Rect::from_size(612.0, 792.0));

    let mut svg = SvgDevice::new(Vec::new(), SvgDeviceOptions::default()).unwrap();
    list.render_page(&mut svg, &Matrix::scale(2.0, 2.0), None).unwrap();
    svg.close().unwrap();
    let out = String::from_utf8(svg.into_inner()).unwrap();
    assert!(out.contains("Grace Hopper"));
    assert!(out.contains("<svg"));
}

#[test]
fn test_tightened_constraints_fail_update() {
    let mut overlay = form();
    overlay.update_dirty();
    let name = overlay.find_widget("name").unwrap();

    overlay.widget_mut(name).unwrap().set_max_len(Some(5));
    assert_eq!(overlay.update_dirty(), 1);
    let widget = overlay.widget(name).unwrap();
    assert!(widget.is_dirty());
    assert_eq!(widget.value(), "Grace Hopper");

    overlay.widget_mut(name).unwrap().set_value("Grace").unwrap();
    assert_eq!(overlay.update_dirty(), 0);
}

#[test]
fn test_hidden_widget_draws_nothing() {
    let mut overlay = PageOverlay::new();
    let id = overlay
        .create_widget(WidgetType::CheckBox, "opt_in", Rect::new(0.0, 0.0, 12.0, 12.0))
        .unwrap();
    let widget = overlay.widget_mut(id).unwrap();
    widget.set_checked(true).unwrap();
    widget.set_flags(AnnotFlags::HIDDEN);
    widget.update().unwrap();
    assert!(widget.appearance().unwrap().is_empty());
    assert!(widget.is_checked());
}

#[test]
fn test_stale_ids_after_delete() {
    let mut overlay = form();
    let first = overlay.first_widget().unwrap();
    overlay.delete_widget(first).unwrap();
    assert!(!overlay.is_valid(first));
    assert!(matches!(
        overlay.widget_mut(first),
        Err(AnnotError::NotFound { what: "widget", .. })
    ));
    assert_eq!(overlay.widgets().count(), 2);
}

#[test]
fn proptest_opacity_always_clamped() {
    proptest!(|(opacity in prop::num::f32::ANY)| {
        let mut overlay = PageOverlay::new();
        let id = overlay.create_annot(AnnotType::Square, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let annot = overlay.annot_mut(id).unwrap();
        match annot.set_opacity(opacity) {
            Ok(()) => prop_assert!((0.0..=1.0).contains(&annot.opacity())),
            Err(_) => {
                prop_assert!(opacity.is_nan());
                prop_assert_eq!(annot.opacity(), 1.0);
            }
        }
    });
}

#[test]
fn proptest_max_len_respected() {
    proptest!(|(value in "\\PC{0,30}", max in 0usize..20)| {
        let mut overlay = PageOverlay::new();
        let id = overlay.create_text_field("f", Rect::new(0.0, 0.0, 100.0, 20.0), Some(max)).unwrap();
        let widget = overlay.widget_mut(id).unwrap();
        let result = widget.set_value(&value);
        if value.chars().count() <= max {
            prop_assert!(result.is_ok());
            prop_assert_eq!(widget.value(), value.as_str());
            prop_assert!(widget.update().is_ok());
            prop_assert!(!widget.is_dirty());
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(widget.value(), "");
        }
    });
}
