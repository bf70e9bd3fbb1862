//! Service icons.
//!
//! Services store their icon as a plain name. Rendering goes through this closed set;
//! names outside it fall back to [`ServiceIcon::Generic`].

/// Icons a service card can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceIcon {
    Code,
    Palette,
    Smartphone,
    Globe,
    Database,
    Shield,
    Cloud,
    Rocket,
    Generic,
}

impl ServiceIcon {
    /// Resolve a stored icon name. Matching ignores case and surrounding whitespace.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "code" | "code2" => ServiceIcon::Code,
            "palette" | "pen-tool" => ServiceIcon::Palette,
            "smartphone" | "mobile" => ServiceIcon::Smartphone,
            "globe" | "web" => ServiceIcon::Globe,
            "database" => ServiceIcon::Database,
            "shield" => ServiceIcon::Shield,
            "cloud" => ServiceIcon::Cloud,
            "rocket" => ServiceIcon::Rocket,
            other => {
                if !other.is_empty() {
                    tracing::debug!("Unknown service icon '{}', using generic icon", other);
                }
                ServiceIcon::Generic
            }
        }
    }

    /// Canonical stored name.
    pub fn tag(&self) -> &'static str {
        match self {
            ServiceIcon::Code => "code",
            ServiceIcon::Palette => "palette",
            ServiceIcon::Smartphone => "smartphone",
            ServiceIcon::Globe => "globe",
            ServiceIcon::Database => "database",
            ServiceIcon::Shield => "shield",
            ServiceIcon::Cloud => "cloud",
            ServiceIcon::Rocket => "rocket",
            ServiceIcon::Generic => "sparkles",
        }
    }

    /// Glyph used when rendering to a terminal.
    pub fn glyph(&self) -> &'static str {
        match self {
            ServiceIcon::Code => "</>",
            ServiceIcon::Palette => "🎨",
            ServiceIcon::Smartphone => "📱",
            ServiceIcon::Globe => "🌐",
            ServiceIcon::Database => "🗄",
            ServiceIcon::Shield => "🛡",
            ServiceIcon::Cloud => "☁",
            ServiceIcon::Rocket => "🚀",
            ServiceIcon::Generic => "✨",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_resolve() {
        assert_eq!(ServiceIcon::from_tag("code"), ServiceIcon::Code);
        assert_eq!(ServiceIcon::from_tag(" Palette "), ServiceIcon::Palette);
        assert_eq!(ServiceIcon::from_tag("mobile"), ServiceIcon::Smartphone);
    }

    #[test]
    fn test_unknown_tag_falls_back() {
        assert_eq!(ServiceIcon::from_tag("FaReact"), ServiceIcon::Generic);
        assert_eq!(ServiceIcon::from_tag(""), ServiceIcon::Generic);
    }

    #[test]
    fn test_tag_resolves_to_itself() {
        for icon in [
            ServiceIcon::Code,
            ServiceIcon::Palette,
            ServiceIcon::Smartphone,
            ServiceIcon::Globe,
            ServiceIcon::Database,
            ServiceIcon::Shield,
            ServiceIcon::Cloud,
            ServiceIcon::Rocket,
        ] {
            assert_eq!(ServiceIcon::from_tag(icon.tag()), icon);
        }
    }
}
