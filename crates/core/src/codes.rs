//! Translation of upstream two-digit codes into domain values.
//!
//! Every function is total: unknown input maps to a documented default
//! (privacy) or to "no value" (everything else). Nothing here returns an error.

use crate::document::{PhysicalState, Privacy, ReliabilityLevel};

/// Language tag for the first entry of an upstream language list.
///
/// Empty lists, an empty first entry and unknown codes all yield `""`.
pub fn language_code(languages: &[String]) -> String {
    let Some(base) = languages.first() else {
        return String::new();
    };
    let tag = match base.as_str() {
        "01" => "vi",
        "02" => "en",
        "03" => "fr",
        "04" => "ru",
        "05" => "zh",
        "06" => "vi-en",
        "07" => "vi-ru",
        "08" => "vi-fr",
        "09" => "sino_vn",
        "10" => "vi-zh",
        _ => "",
    };
    tag.to_string()
}

/// Access mode. Unrecognized codes are treated as private.
pub fn privacy(mode: &str) -> Privacy {
    match mode {
        "01" => Privacy::Public,
        "02" => Privacy::Conditional,
        _ => Privacy::Private,
    }
}

pub fn physical_state(format: &str) -> Option<PhysicalState> {
    match format {
        "01" => Some(PhysicalState::Good),
        "02" => Some(PhysicalState::Normal),
        "03" => Some(PhysicalState::Damaged),
        _ => None,
    }
}

pub fn reliability(level: &str) -> Option<ReliabilityLevel> {
    match level {
        "01" => Some(ReliabilityLevel::ElectronicOriginal),
        "02" => Some(ReliabilityLevel::Digitized),
        "03" => Some(ReliabilityLevel::Mixed),
        _ => None,
    }
}
