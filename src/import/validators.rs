//! Which validators embed references to other schema entities

/// Validator pointing at the field that supplies a slug's text
pub const SLUG_TITLE_FIELD: &str = "slug_title_field";

/// Key holding the referenced item type ids inside a validator config
pub const ITEM_TYPES_KEY: &str = "item_types";

/// Key holding the referenced field id inside `slug_title_field`
pub const TITLE_FIELD_ID_KEY: &str = "title_field_id";

/// What kind of item types a validator's `item_types` list points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Records that may be linked from the field
    Links,
    /// Block models that may be embedded in the field
    Blocks,
}

/// Reference kind embedded by `validator` on a field of `field_type`, if any
pub fn item_type_references(field_type: &str, validator: &str) -> Option<ReferenceKind> {
    match (field_type, validator) {
        ("link", "item_item_type") => Some(ReferenceKind::Links),
        ("links", "items_item_type") => Some(ReferenceKind::Links),
        ("structured_text", "structured_text_links") => Some(ReferenceKind::Links),
        ("rich_text", "rich_text_blocks") => Some(ReferenceKind::Blocks),
        ("structured_text", "structured_text_blocks") => Some(ReferenceKind::Blocks),
        ("single_block", "single_block_blocks") => Some(ReferenceKind::Blocks),
        _ => None,
    }
}
