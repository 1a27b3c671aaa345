//! Validation utilities for panel input.
//!
//! This module provides reusable validation functions for bulk job parameters.

use crate::error::{GuildForgeError, Result};

/// Placeholder replaced by the 1-based index in name templates.
pub const INDEX_PLACEHOLDER: &str = "{n}";

/// Largest number of items a single bulk create job may request.
pub const MAX_BULK_COUNT: u32 = 500;

/// Discord caps channel and role names at 100 characters.
const MAX_TEMPLATE_LENGTH: usize = 100;

/// Validate a channel or role name template.
///
/// Templates must:
/// - Not be empty or whitespace only
/// - Be at most 100 characters long
///
/// # Examples
///
/// ```
/// use guildforge::utils::validation::validate_name_template;
///
/// assert!(validate_name_template("raid-{n}").is_ok());
/// assert!(validate_name_template("   ").is_err());
/// ```
pub fn validate_name_template(template: &str) -> Result<()> {
    if template.trim().is_empty() {
        return Err(GuildForgeError::Validation(
            "Name template cannot be empty".to_string()
        ));
    }

    let length = template.chars().count();
    if length > MAX_TEMPLATE_LENGTH {
        return Err(GuildForgeError::Validation(
            format!("Name template too long: {} characters (max {})", length, MAX_TEMPLATE_LENGTH)
        ));
    }

    Ok(())
}

/// Validate the number of items requested by a create job.
pub fn validate_count(count: u32) -> Result<()> {
    if count == 0 || count > MAX_BULK_COUNT {
        return Err(GuildForgeError::Validation(
            format!("Count must be between 1 and {}, got {}", MAX_BULK_COUNT, count)
        ));
    }
    Ok(())
}

/// Substitute the 1-based `index` for every placeholder in `template`.
///
/// # Examples
///
/// ```
/// use guildforge::utils::validation::render_name;
///
/// assert_eq!(render_name("raid-{n}", 3), "raid-3");
/// assert_eq!(render_name("{n}-{n}", 12), "12-12");
/// assert_eq!(render_name("static", 1), "static");
/// ```
pub fn render_name(template: &str, index: u32) -> String {
    template.replace(INDEX_PLACEHOLDER, &index.to_string())
}

/// Parse an RGB hex color string ("FF5733" or "#FF5733") into a `u32`.
///
/// # Errors
///
/// Returns an error if the string is not exactly six hex digits.
///
/// # Examples
///
/// ```
/// use guildforge::utils::validation::parse_hex_color;
///
/// assert_eq!(parse_hex_color("#FF5733").unwrap(), 0xFF5733);
/// assert!(parse_hex_color("12345").is_err());
/// ```
pub fn parse_hex_color(hex: &str) -> Result<u32> {
    // Remove '#' prefix if present
    let hex = hex.trim().trim_start_matches('#');

    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GuildForgeError::Validation(
            format!("Hex color must be 6 hex digits, got: {}", hex)
        ));
    }

    u32::from_str_radix(hex, 16)
        .map_err(|_| GuildForgeError::Validation(format!("Invalid hex color: {}", hex)))
}
