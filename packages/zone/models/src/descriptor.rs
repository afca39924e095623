//! Display color and advisory text for each risk level.
//!
//! The lookup is total: unrecognized level names fall back to the
//! [`RiskLevel::Stable`] advisory with a neutral gray.

use serde::Serialize;

use crate::{Localized, RiskLevel};

/// Color used for level names outside the fixed set.
pub const UNKNOWN_LEVEL_COLOR: &str = "#6b7280";

/// Color and bilingual advisory for a risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskDescriptor {
    /// Hex color used on maps and badges.
    pub color: &'static str,
    /// Advisory shown to someone standing in the zone.
    pub description: Localized<&'static str>,
}

impl RiskDescriptor {
    /// Descriptor for a known level.
    #[must_use]
    pub const fn for_level(level: RiskLevel) -> Self {
        Self {
            color: color(level),
            description: description(level),
        }
    }

    /// Descriptor for a level given by name.
    ///
    /// Names outside the fixed set get the stable advisory and
    /// [`UNKNOWN_LEVEL_COLOR`].
    #[must_use]
    pub fn for_level_name(name: &str) -> Self {
        name.parse::<RiskLevel>().map_or(
            Self {
                color: UNKNOWN_LEVEL_COLOR,
                description: description(RiskLevel::Stable),
            },
            Self::for_level,
        )
    }
}

const fn color(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => "#dc2626",
        RiskLevel::High => "#ea580c",
        RiskLevel::Moderate => "#ca8a04",
        RiskLevel::Low => "#65a30d",
        RiskLevel::Stable => "#16a34a",
        RiskLevel::Uplifting => "#2563eb",
    }
}

const fn description(level: RiskLevel) -> Localized<&'static str> {
    match level {
        RiskLevel::Critical => Localized::new(
            "You are in a CRITICAL subsidence zone. This area has recorded significant ground movement. Please exercise extreme caution and consider evacuation.",
            "आप एक गंभीर धंसाव क्षेत्र में हैं। इस क्षेत्र में महत्वपूर्ण जमीन की गति दर्ज की गई है। कृपया अत्यधिक सावधानी बरतें और निकासी पर विचार करें।",
        ),
        RiskLevel::High => Localized::new(
            "You are in a HIGH risk subsidence zone. Regular monitoring is essential. Be alert to any ground changes.",
            "आप उच्च जोखिम वाले धंसाव क्षेत्र में हैं। नियमित निगरानी आवश्यक है। किसी भी जमीन के बदलाव पर ध्यान दें।",
        ),
        RiskLevel::Moderate => Localized::new(
            "You are in a MODERATE risk zone. Some subsidence activity detected. Stay informed about area updates.",
            "आप मध्यम जोखिम वाले क्षेत्र में हैं। कुछ धंसाव गतिविधि का पता चला है। क्षेत्र के अपडेट के बारे में सूचित रहें।",
        ),
        RiskLevel::Low => Localized::new(
            "You are in a LOW risk zone. Minimal subsidence activity recorded.",
            "आप कम जोखिम वाले क्षेत्र में हैं। न्यूनतम धंसाव गतिविधि दर्ज की गई है।",
        ),
        RiskLevel::Stable => Localized::new(
            "This location is in a STABLE zone with minimal subsidence risk.",
            "यह स्थान न्यूनतम धंसाव जोखिम वाले स्थिर क्षेत्र में है।",
        ),
        RiskLevel::Uplifting => Localized::new(
            "This area shows UPLIFTING trend. Ground is rising slightly.",
            "यह क्षेत्र उत्थान की प्रवृत्ति दिखाता है। जमीन थोड़ी ऊपर उठ रही है।",
        ),
    }
}
