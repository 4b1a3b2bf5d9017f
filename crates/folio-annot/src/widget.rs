//! Interactive form fields.

use crate::annot::{AnnotId, Annotation};
use crate::appearance::{self, Builder, TextAlign, AUTO_FONT_SIZE};
use crate::error::{AnnotError, Result};
use crate::kind::{AnnotFlags, AnnotType};
use folio_core::Rect;
use folio_render::{Color, DisplayList, Path};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// Signed decimal, either separator
static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d+(?:[.,]\d*)?|[.,]\d+)$").expect("valid number pattern"));

// Phone numbers, postal codes and the like
static RE_SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9 ()+\-]+$").expect("valid special pattern"));

static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\d{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01])|(?:0[1-9]|1[0-2])/(?:0[1-9]|[12]\d|3[01])/\d{4})$",
    )
    .expect("valid date pattern")
});

static RE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[01]\d|2[0-3]):[0-5]\d(?::[0-5]\d)?$").expect("valid time pattern"));

/// Value written by checked check boxes and radio buttons.
pub const ON_STATE: &str = "Yes";

/// Value of an unchecked check box or radio button.
pub const OFF_STATE: &str = "Off";

/// Form field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetType {
    PushButton,
    CheckBox,
    ComboBox,
    ListBox,
    RadioButton,
    Signature,
    Text,
}

impl WidgetType {
    pub const ALL: [Self; 7] = [
        Self::PushButton,
        Self::CheckBox,
        Self::ComboBox,
        Self::ListBox,
        Self::RadioButton,
        Self::Signature,
        Self::Text,
    ];

    /// Stable numeric code (1..=7); 0 is reserved for "unknown".
    #[inline]
    #[must_use = "returns the type code"]
    pub const fn code(self) -> i32 {
        match self {
            Self::PushButton => 1,
            Self::CheckBox => 2,
            Self::ComboBox => 3,
            Self::ListBox => 4,
            Self::RadioButton => 5,
            Self::Signature => 6,
            Self::Text => 7,
        }
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::UnknownCode`] outside `1..=7`.
    pub fn from_code(code: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or(AnnotError::UnknownCode {
                what: "widget type",
                code,
            })
    }

    #[inline]
    #[must_use = "returns whether the type is a choice field"]
    pub const fn is_choice(self) -> bool {
        matches!(self, Self::ComboBox | Self::ListBox)
    }

    #[inline]
    #[must_use = "returns whether the type has a checked state"]
    pub const fn is_toggle(self) -> bool {
        matches!(self, Self::CheckBox | Self::RadioButton)
    }
}

/// Keystroke format of a text field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextFormat {
    #[default]
    None,
    Number,
    /// Digits, spaces, `-`, `(`, `)` and `+`
    Special,
    /// `YYYY-MM-DD` or `MM/DD/YYYY`
    Date,
    /// `HH:MM` or `HH:MM:SS`
    Time,
}

impl TextFormat {
    pub const ALL: [Self; 5] = [Self::None, Self::Number, Self::Special, Self::Date, Self::Time];

    #[must_use = "returns the format code"]
    pub fn code(self) -> i32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        Self::ALL.iter().position(|f| *f == self).map_or(0, |i| i as i32)
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::UnknownCode`] outside `0..=4`.
    pub fn from_code(code: i32) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(AnnotError::UnknownCode {
                what: "text format",
                code,
            })
    }

    /// Whether a non-empty `value` is acceptable. Empty values always are.
    #[must_use = "returns whether the value matches the format"]
    pub fn accepts(self, value: &str) -> bool {
        if value.is_empty() {
            return true;
        }
        match self {
            Self::None => true,
            Self::Number => RE_NUMBER.is_match(value),
            Self::Special => RE_SPECIAL.is_match(value),
            Self::Date => RE_DATE.is_match(value),
            Self::Time => RE_TIME.is_match(value),
        }
    }
}

/// Quadding of field text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl FieldAlignment {
    #[inline]
    #[must_use = "returns the alignment code"]
    pub const fn code(self) -> i32 {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
        }
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::UnknownCode`] outside `0..=2`.
    pub const fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::Left),
            1 => Ok(Self::Center),
            2 => Ok(Self::Right),
            _ => Err(AnnotError::UnknownCode {
                what: "alignment",
                code,
            }),
        }
    }

    const fn text_align(self) -> TextAlign {
        match self {
            Self::Left => TextAlign::Left,
            Self::Center => TextAlign::Center,
            Self::Right => TextAlign::Right,
        }
    }
}

/// A form field widget.
///
/// `set_value` checks the field constraints as the value arrives;
/// [`Widget::update`] checks them again, since constraints such as the
/// maximum length can be tightened after the value was set.
#[derive(Debug, Clone)]
pub struct Widget {
    base: Annotation,
    field_type: WidgetType,
    name: String,
    value: String,
    required: bool,
    read_only: bool,
    max_len: Option<usize>,
    multiline: bool,
    format: TextFormat,
    checked: bool,
    options: Vec<String>,
    editable: bool,
    selected: Option<usize>,
    alignment: FieldAlignment,
    font_size: f32,
    bg_color: Option<Color>,
}

impl Widget {
    pub(crate) fn new(id: AnnotId, field_type: WidgetType, name: &str, rect: Rect) -> Self {
        let value = if field_type.is_toggle() { OFF_STATE } else { "" };
        Self {
            base: Annotation::new(id, AnnotType::Widget, rect),
            field_type,
            name: name.to_string(),
            value: value.to_string(),
            required: false,
            read_only: false,
            max_len: None,
            multiline: false,
            format: TextFormat::None,
            checked: false,
            options: Vec::new(),
            editable: false,
            selected: None,
            alignment: FieldAlignment::Left,
            font_size: 0.0,
            bg_color: None,
        }
    }

    pub(crate) fn reidentified(&self, id: AnnotId) -> Self {
        Self {
            base: self.base.reidentified(id),
            ..self.clone()
        }
    }

    fn touch(&mut self) {
        self.base.mark_dirty();
    }

    // ====================================================================
    // Annotation surface
    // ====================================================================

    #[inline]
    #[must_use = "returns the widget id"]
    pub const fn id(&self) -> AnnotId {
        self.base.id()
    }

    /// Annotation view of the widget (rect, flags, appearance).
    #[inline]
    #[must_use = "returns the underlying annotation"]
    pub const fn annotation(&self) -> &Annotation {
        &self.base
    }

    #[inline]
    #[must_use = "returns the rectangle"]
    pub const fn rect(&self) -> Rect {
        self.base.rect()
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.base.set_rect(rect);
    }

    #[inline]
    #[must_use = "returns the annotation flags"]
    pub const fn flags(&self) -> AnnotFlags {
        self.base.flags()
    }

    pub fn set_flags(&mut self, flags: AnnotFlags) {
        self.base.set_flags(flags);
    }

    /// Border and text color.
    pub fn set_color(&mut self, color: Option<Color>) {
        self.base.set_color(color);
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::InvalidValue`] for negative or non-finite widths.
    pub fn set_border_width(&mut self, width: f32) -> Result<()> {
        self.base.set_border_width(width)
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::InvalidValue`] for NaN.
    pub fn set_opacity(&mut self, opacity: f32) -> Result<()> {
        self.base.set_opacity(opacity)
    }

    #[inline]
    #[must_use = "returns whether the widget is dirty"]
    pub const fn is_dirty(&self) -> bool {
        self.base.is_dirty()
    }

    pub fn clear_dirty(&mut self) {
        self.base.clear_dirty();
    }

    #[inline]
    #[must_use = "returns the cached appearance"]
    pub const fn appearance(&self) -> Option<&DisplayList> {
        self.base.appearance()
    }

    // ====================================================================
    // Field properties
    // ====================================================================

    #[inline]
    #[must_use = "returns the field type"]
    pub const fn field_type(&self) -> WidgetType {
        self.field_type
    }

    #[must_use = "returns the field name"]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use = "returns the field value"]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    #[must_use = "returns whether the field is required"]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = required;
        self.touch();
    }

    #[inline]
    #[must_use = "returns whether the field is read-only"]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        self.touch();
    }

    /// Maximum value length in characters, `None` for unlimited.
    #[inline]
    #[must_use = "returns the maximum length"]
    pub const fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    /// Does not truncate the current value; an over-long value makes the
    /// next [`Widget::update`] fail.
    pub fn set_max_len(&mut self, max_len: Option<usize>) {
        self.max_len = max_len;
        self.touch();
    }

    #[inline]
    #[must_use = "returns whether the field is multiline"]
    pub const fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn set_multiline(&mut self, multiline: bool) {
        self.multiline = multiline;
        self.touch();
    }

    #[inline]
    #[must_use = "returns the text format"]
    pub const fn text_format(&self) -> TextFormat {
        self.format
    }

    pub fn set_text_format(&mut self, format: TextFormat) {
        self.format = format;
        self.touch();
    }

    #[inline]
    #[must_use = "returns the alignment"]
    pub const fn alignment(&self) -> FieldAlignment {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: FieldAlignment) {
        self.alignment = alignment;
        self.touch();
    }

    /// Font size in points; `0.0` means auto.
    #[inline]
    #[must_use = "returns the font size"]
    pub const fn font_size(&self) -> f32 {
        self.font_size
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::InvalidValue`] for negative or non-finite sizes.
    pub fn set_font_size(&mut self, size: f32) -> Result<()> {
        if !size.is_finite() || size < 0.0 {
            return Err(AnnotError::invalid(&self.name, format!("font size {size}")));
        }
        self.font_size = size;
        self.touch();
        Ok(())
    }

    #[inline]
    #[must_use = "returns the background color"]
    pub const fn bg_color(&self) -> Option<Color> {
        self.bg_color
    }

    pub fn set_bg_color(&mut self, color: Option<Color>) {
        self.bg_color = color;
        self.touch();
    }

    // ====================================================================
    // Value
    // ====================================================================

    /// Set the field value.
    ///
    /// Check boxes and radio buttons treat `Off` as unchecked and anything
    /// else as checked. Choice fields require one of the options unless the
    /// combo box is editable. On failure the previous value stays.
    ///
    /// # Errors
    ///
    /// - [`AnnotError::ReadOnly`] for read-only fields
    /// - [`AnnotError::Unsupported`] for push buttons and signatures
    /// - [`AnnotError::InvalidValue`] if the value breaks a constraint
    pub fn set_value(&mut self, value: &str) -> Result<()> {
        if self.read_only {
            return Err(AnnotError::ReadOnly(self.name.clone()));
        }
        match self.field_type {
            WidgetType::PushButton | WidgetType::Signature => {
                return Err(AnnotError::Unsupported(format!(
                    "setting the value of a {:?} field",
                    self.field_type
                )));
            }
            WidgetType::CheckBox | WidgetType::RadioButton => {
                self.checked = value != OFF_STATE;
            }
            WidgetType::Text => self.check_text(value)?,
            WidgetType::ComboBox | WidgetType::ListBox => {
                let position = self.options.iter().position(|o| o == value);
                if position.is_none() && !value.is_empty() && !self.accepts_free_choice() {
                    return Err(AnnotError::invalid(&self.name, format!("'{value}' is not an option")));
                }
                self.selected = position;
            }
        }
        self.value = value.to_string();
        self.touch();
        Ok(())
    }

    fn accepts_free_choice(&self) -> bool {
        self.field_type == WidgetType::ComboBox && self.editable
    }

    fn check_text(&self, value: &str) -> Result<()> {
        if let Some(max) = self.max_len {
            let len = value.chars().count();
            if len > max {
                return Err(AnnotError::invalid(
                    &self.name,
                    format!("{len} characters exceeds maximum length {max}"),
                ));
            }
        }
        if !self.multiline && value.contains(['\n', '\r']) {
            return Err(AnnotError::invalid(&self.name, "line break in single-line field"));
        }
        if !self.format.accepts(value) {
            return Err(AnnotError::invalid(
                &self.name,
                format!("'{value}' does not match {:?} format", self.format),
            ));
        }
        Ok(())
    }

    /// Re-check the current value against the current constraints.
    fn check_current(&self) -> Result<()> {
        match self.field_type {
            WidgetType::Text => self.check_text(&self.value),
            WidgetType::ComboBox | WidgetType::ListBox
                if !self.value.is_empty()
                    && !self.accepts_free_choice()
                    && !self.options.contains(&self.value) =>
            {
                Err(AnnotError::invalid(
                    &self.name,
                    format!("'{}' is no longer an option", self.value),
                ))
            }
            _ => Ok(()),
        }
    }

    // ====================================================================
    // Check boxes and radio buttons
    // ====================================================================

    #[inline]
    #[must_use = "returns whether the widget is checked"]
    pub const fn is_checked(&self) -> bool {
        self.checked
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::Unsupported`] for fields without a checked
    /// state and [`AnnotError::ReadOnly`] for read-only fields.
    pub fn set_checked(&mut self, checked: bool) -> Result<()> {
        if !self.field_type.is_toggle() {
            return Err(AnnotError::Unsupported(format!(
                "checked state of a {:?} field",
                self.field_type
            )));
        }
        self.set_value(if checked { ON_STATE } else { OFF_STATE })
    }

    // ====================================================================
    // Choice fields
    // ====================================================================

    #[inline]
    #[must_use = "returns whether the widget is a combo box"]
    pub fn is_combo(&self) -> bool {
        self.field_type == WidgetType::ComboBox
    }

    /// Whether a combo box accepts values outside its options.
    #[inline]
    #[must_use = "returns whether the combo box is editable"]
    pub const fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
        self.touch();
    }

    #[must_use = "returns the options"]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[inline]
    #[must_use = "returns the option count"]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::OptionOutOfRange`] past the end.
    pub fn option(&self, index: usize) -> Result<&str> {
        self.options
            .get(index)
            .map(String::as_str)
            .ok_or(AnnotError::OptionOutOfRange {
                index,
                count: self.options.len(),
            })
    }

    /// Append an option and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::Unsupported`] for non-choice fields.
    pub fn add_option(&mut self, option: &str) -> Result<usize> {
        self.require_choice("add an option to")?;
        self.options.push(option.to_string());
        self.touch();
        Ok(self.options.len() - 1)
    }

    /// Remove and return the option at `index`. Removing the selected
    /// option clears the selection.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::Unsupported`] for non-choice fields and
    /// [`AnnotError::OptionOutOfRange`] past the end.
    pub fn remove_option(&mut self, index: usize) -> Result<String> {
        self.require_choice("remove an option from")?;
        if index >= self.options.len() {
            return Err(AnnotError::OptionOutOfRange {
                index,
                count: self.options.len(),
            });
        }
        let removed = self.options.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => {
                if !self.accepts_free_choice() {
                    self.value.clear();
                }
                None
            }
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        self.touch();
        Ok(removed)
    }

    #[inline]
    #[must_use = "returns the selected option index"]
    pub const fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Select the option at `index` and make it the value.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::OptionOutOfRange`] past the end, plus the
    /// errors of [`Widget::set_value`].
    pub fn set_selected_index(&mut self, index: usize) -> Result<()> {
        self.require_choice("select an option of")?;
        let option = self.option(index)?.to_string();
        self.set_value(&option)
    }

    /// # Errors
    ///
    /// Returns [`AnnotError::Unsupported`] for non-choice fields and
    /// [`AnnotError::ReadOnly`] for read-only fields.
    pub fn clear_selection(&mut self) -> Result<()> {
        self.require_choice("clear the selection of")?;
        self.set_value("")
    }

    fn require_choice(&self, action: &str) -> Result<()> {
        if self.field_type.is_choice() {
            Ok(())
        } else {
            Err(AnnotError::Unsupported(format!(
                "cannot {action} a {:?} field",
                self.field_type
            )))
        }
    }

    // ====================================================================
    // Appearance
    // ====================================================================

    /// Validate the value and regenerate the appearance.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotError::EmptyRect`] for an empty rectangle and
    /// [`AnnotError::InvalidValue`] if the value no longer satisfies the
    /// field constraints. The widget is left unchanged and still dirty.
    pub fn update(&mut self) -> Result<()> {
        if self.rect().is_empty() {
            return Err(AnnotError::EmptyRect);
        }
        self.check_current()?;
        let appearance = self.build_appearance();
        self.base.set_appearance(appearance);
        log::debug!("Updated {:?} widget '{}'", self.field_type, self.name);
        Ok(())
    }

    fn build_appearance(&self) -> DisplayList {
        let r = self.rect();
        let mut b = Builder::new(r);
        if !self.flags().is_drawn() {
            return b.finish();
        }
        let border = self.base.border_width();
        let color = self.base.color().unwrap_or(Color::BLACK).with_opacity(self.base.opacity());
        if let Some(bg) = self.bg_color {
            b.fill(Path::rect(&r), bg.with_opacity(self.base.opacity()));
        }
        b.stroke(Path::rect(&appearance::inset(&r, border / 2.0)), border, color);

        let size = if self.font_size > 0.0 { self.font_size } else { AUTO_FONT_SIZE };
        let inner = appearance::text_box(&r, border);
        match self.field_type {
            WidgetType::CheckBox if self.checked => {
                b.stroke(appearance::check_mark(&inner), (inner.height() / 8.0).max(1.0), color);
            }
            WidgetType::RadioButton if self.checked => {
                b.fill(appearance::ellipse(&appearance::inset(&inner, inner.width() / 4.0)), color);
            }
            WidgetType::Text | WidgetType::ComboBox => {
                self.clipped_text(&mut b, &r, &inner, &self.value, size, color);
            }
            WidgetType::ListBox => {
                let text = self.options.join("\n");
                self.clipped_text(&mut b, &r, &inner, &text, size, color);
            }
            WidgetType::PushButton => {
                let caption = self.base.contents().unwrap_or(&self.name);
                self.clipped_text(&mut b, &r, &inner, caption, size, color);
            }
            _ => {}
        }
        b.finish()
    }

    fn clipped_text(&self, b: &mut Builder, clip: &Rect, inner: &Rect, text: &str, size: f32, color: Color) {
        if text.is_empty() {
            return;
        }
        b.clip(clip);
        b.text(inner, text, size, self.alignment.text_align(), color);
        b.pop_clip();
    }
}
