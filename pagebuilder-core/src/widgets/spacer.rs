use serde_json::json;

use crate::control::ControlManager;
use crate::error::BuilderResult;
use crate::field::FieldDefinition;
use crate::widget::{Category, RenderContext, Widget, WidgetConfig};

pub struct SpacerWidget;

impl Widget for SpacerWidget {
    fn config(&self) -> WidgetConfig {
        WidgetConfig {
            widget_type: "spacer".into(),
            name: "Spacer".into(),
            icon: "arrows-alt-v".into(),
            description: "Empty vertical space between widgets".into(),
            category: Category::Layout,
            tags: vec!["space".into(), "gap".into(), "divider".into()],
            pro: false,
        }
    }

    fn general_fields(&self) -> BuilderResult<ControlManager> {
        Ok(ControlManager::new())
    }

    fn style_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("spacer", "Spacer")?
            .register_field(
                "height",
                FieldDefinition::responsive_number("Height")
                    .min(0.0)
                    .max(1000.0)
                    .unit("px")
                    .default_value(json!({"desktop": 50}))
                    .selector("{{WRAPPER}} .pb-spacer", "height: {{VALUE}}{{UNIT}};")
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn render(&self, _ctx: &RenderContext<'_>) -> BuilderResult<String> {
        Ok("<div class=\"pb-spacer\" aria-hidden=\"true\"></div>".to_string())
    }
}
