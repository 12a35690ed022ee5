/// Tuning constants for one execution target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineProfile {
    /// Longest image side fed to the detector.
    pub max_side: u32,
    /// Probability above which a detection cell counts as text.
    pub box_threshold: f32,
    /// Growth factor applied to each detected box before cropping.
    pub unclip_ratio: f32,
    /// Widest line image fed to the recognizer.
    pub rec_width_cap: u32,
}

impl EngineProfile {
    pub const MOBILE: Self = Self {
        max_side: 960,
        box_threshold: 0.3,
        unclip_ratio: 1.6,
        rec_width_cap: 960,
    };

    /// Desktop-class CPUs can afford larger inputs, which recovers faint text.
    pub const DESKTOP: Self = Self {
        max_side: 1920,
        box_threshold: 0.25,
        unclip_ratio: 1.8,
        rec_width_cap: 1280,
    };

    pub fn for_target() -> Self {
        if cfg!(any(target_arch = "x86", target_arch = "x86_64")) {
            Self::DESKTOP
        } else {
            Self::MOBILE
        }
    }

    /// Resolve a configured profile name (`auto`, `mobile`, `desktop`).
    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::for_target()),
            "mobile" => Some(Self::MOBILE),
            "desktop" => Some(Self::DESKTOP),
            _ => None,
        }
    }
}

impl Default for EngineProfile {
    fn default() -> Self {
        Self::for_target()
    }
}
