//! Icons, built-in templates and AppStream fragments used while staging.

pub mod appstream;
pub mod icons;
pub mod templates;
