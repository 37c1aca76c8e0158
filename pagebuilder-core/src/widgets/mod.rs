//! Built-in widget types.

pub mod button;
pub mod code_block;
pub mod contact_form;
pub mod gallery;
pub mod heading;
pub mod image;
pub mod spacer;
pub mod text;

use crate::escape::escape_html;
use crate::settings::Settings;
use crate::widget::Widget;

pub use button::ButtonWidget;
pub use code_block::CodeBlockWidget;
pub use contact_form::ContactFormWidget;
pub use gallery::GalleryWidget;
pub use heading::HeadingWidget;
pub use image::ImageWidget;
pub use spacer::SpacerWidget;
pub use text::TextWidget;

pub(crate) const ALIGN_OPTIONS: &[(&str, &str)] = &[
    ("left", "Left"),
    ("center", "Center"),
    ("right", "Right"),
    ("justify", "Justified"),
];

pub(crate) const FONT_WEIGHT_OPTIONS: &[(&str, &str)] = &[
    ("300", "Light"),
    ("400", "Normal"),
    ("500", "Medium"),
    ("600", "Semi Bold"),
    ("700", "Bold"),
    ("800", "Extra Bold"),
];

pub fn builtin_widgets() -> Vec<Box<dyn Widget>> {
    vec![
        Box::new(HeadingWidget),
        Box::new(TextWidget),
        Box::new(ButtonWidget),
        Box::new(ImageWidget),
        Box::new(GalleryWidget),
        Box::new(CodeBlockWidget),
        Box::new(ContactFormWidget),
        Box::new(SpacerWidget),
    ]
}

/// ` href="…"` plus `target`/`rel` for a url field, or `None` when the url is empty.
pub(crate) fn link_attributes(settings: &Settings, key: &str) -> Option<String> {
    let url = settings.url(key);
    if url.is_empty() {
        return None;
    }
    let link = settings.object(key);
    let mut attrs = format!(" href=\"{}\"", escape_html(url));
    let mut rel = Vec::new();
    if link.flag("isExternal") {
        attrs.push_str(" target=\"_blank\"");
        rel.push("noopener");
    }
    if link.flag("nofollow") {
        rel.push("nofollow");
    }
    if !rel.is_empty() {
        attrs.push_str(&format!(" rel=\"{}\"", rel.join(" ")));
    }
    Some(attrs)
}
