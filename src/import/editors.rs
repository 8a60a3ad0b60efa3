//! Knowledge about editors that ship with the destination

use crate::schema::Appearance;
use serde_json::json;

/// Capability lookup consulted while rewriting field appearances
pub trait EditorCatalog: Send + Sync {
    /// Whether `editor` is provided by the destination itself rather than a plugin
    fn is_builtin_editor(&self, editor: &str) -> bool;

    /// Appearance a fresh field of `field_type` gets by default
    fn default_appearance(&self, field_type: &str) -> anyhow::Result<Appearance>;
}

const BUILTIN_EDITORS: &[&str] = &[
    "boolean",
    "boolean_radio_group",
    "color_picker",
    "date_picker",
    "date_time_picker",
    "file",
    "float",
    "framed_single_block",
    "frameless_single_block",
    "gallery",
    "integer",
    "json",
    "link_embed",
    "link_select",
    "links_embed",
    "links_select",
    "map",
    "markdown",
    "rich_text",
    "seo",
    "single_line",
    "slug",
    "string_checkbox_group",
    "string_multi_select",
    "string_radio_group",
    "string_select",
    "structured_text",
    "textarea",
    "video",
    "wysiwyg",
];

/// Static catalog of the destination's built-in editors
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEditors;

impl EditorCatalog for BuiltinEditors {
    fn is_builtin_editor(&self, editor: &str) -> bool {
        BUILTIN_EDITORS.contains(&editor)
    }

    fn default_appearance(&self, field_type: &str) -> anyhow::Result<Appearance> {
        let (editor, parameters) = match field_type {
            "boolean" => ("boolean", json!({})),
            "color" => ("color_picker", json!({ "enable_alpha": false, "preset_colors": [] })),
            "date" => ("date_picker", json!({})),
            "date_time" => ("date_time_picker", json!({})),
            "file" => ("file", json!({})),
            "float" => ("float", json!({ "placeholder": null })),
            "gallery" => ("gallery", json!({})),
            "integer" => ("integer", json!({ "placeholder": null })),
            "json" => ("json", json!({})),
            "lat_lon" => ("map", json!({})),
            "link" => ("link_select", json!({})),
            "links" => ("links_select", json!({})),
            "rich_text" => ("rich_text", json!({ "start_collapsed": false })),
            "seo" => ("seo", json!({ "fields": ["title", "description", "image"], "previews": [] })),
            "single_block" => ("framed_single_block", json!({ "start_collapsed": false })),
            "slug" => ("slug", json!({ "url_prefix": null, "placeholder": null })),
            "string" => ("single_line", json!({ "heading": false, "placeholder": null })),
            "structured_text" => (
                "structured_text",
                json!({
                    "marks": [],
                    "nodes": [],
                    "heading_levels": [],
                    "blocks_start_collapsed": false,
                    "show_links_target_blank": true,
                    "show_links_meta_editor": false
                }),
            ),
            "text" => ("textarea", json!({ "placeholder": null })),
            "video" => ("video", json!({})),
            other => anyhow::bail!("No default appearance known for field type {}", other),
        };

        Ok(Appearance::new(editor, parameters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_editors() {
        assert!(BuiltinEditors.is_builtin_editor("single_line"));
        assert!(BuiltinEditors.is_builtin_editor("structured_text"));
        assert!(!BuiltinEditors.is_builtin_editor("5n3Dmq8cQ4aJQVKHm2FwHQ"));
        assert!(!BuiltinEditors.is_builtin_editor(""));
    }

    #[test]
    fn test_default_appearance_is_builtin_and_has_no_addons() {
        for field_type in ["string", "text", "slug", "link", "single_block", "lat_lon"] {
            let appearance = BuiltinEditors.default_appearance(field_type).unwrap();
            assert!(BuiltinEditors.is_builtin_editor(&appearance.editor), "{}", field_type);
            assert!(appearance.addons.is_empty());
        }
    }

    #[test]
    fn test_unknown_field_type_is_an_error() {
        assert!(BuiltinEditors.default_appearance("hologram").is_err());
    }
}
