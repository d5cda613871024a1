//! Registered font families.
//!
//! Proprietary family names map onto open fonts with the same role; the file
//! on disk is always named after the requested family.

/// Families every tier may use.
pub const BASE_FONTS: &[&str] = &["Arial", "Open Sans"];

/// Families added by the pro tier.
pub const PRO_FONTS: &[&str] = &["Roboto", "Lato", "Montserrat", "Poppins"];

/// Families added by the elite tier.
pub const ELITE_FONTS: &[&str] = &[
    "Inter",
    "Playfair Display",
    "Times New Roman",
    "Georgia",
    "Verdana",
    "Courier New",
];

/// Where a registered family can be downloaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSource {
    pub family: &'static str,
    /// The open font actually served for this family
    pub open_name: &'static str,
    pub url: &'static str,
    pub fallback_url: &'static str,
}

impl FontSource {
    pub fn urls(&self) -> [&'static str; 2] {
        [self.url, self.fallback_url]
    }
}

pub const FONT_SOURCES: &[FontSource] = &[
    FontSource {
        family: "Arial",
        open_name: "Open Sans",
        url: "https://github.com/googlefonts/opensans/raw/main/fonts/ttf/OpenSans-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/opensans/v40/memSYaGs126MiZpBA-UvWbX2vVnXBbObj2OVZyOOSr4dVJWUgsjZ0B4gaVc.ttf",
    },
    FontSource {
        family: "Open Sans",
        open_name: "Open Sans",
        url: "https://github.com/googlefonts/opensans/raw/main/fonts/ttf/OpenSans-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/opensans/v40/memSYaGs126MiZpBA-UvWbX2vVnXBbObj2OVZyOOSr4dVJWUgsjZ0B4gaVc.ttf",
    },
    FontSource {
        family: "Times New Roman",
        open_name: "Merriweather",
        url: "https://github.com/SorkinType/Merriweather/raw/master/fonts/ttf/Merriweather-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/merriweather/v30/u-440qyriQwlOrhSvowK_l5OeyxNV-bnrw.ttf",
    },
    FontSource {
        family: "Courier New",
        open_name: "Roboto Mono",
        url: "https://github.com/googlefonts/RobotoMono/raw/main/fonts/ttf/RobotoMono-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/robotomono/v23/L0xTDF4xlVMF-BfR8bXMIhJHg45mwgGEFl0_3vrtSM1J-gEPT5Ese6hmHSh0mf0h.ttf",
    },
    FontSource {
        family: "Georgia",
        open_name: "Playfair Display",
        url: "https://github.com/clauseggers/Playfair/raw/master/fonts/ttf/PlayfairDisplay-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/playfairdisplay/v37/nuFvD-vYSZviVYUb_rj3ij__anPXJzDwcbmjWBN2PKdFvXDXbtM.ttf",
    },
    FontSource {
        family: "Playfair Display",
        open_name: "Playfair Display",
        url: "https://github.com/clauseggers/Playfair/raw/master/fonts/ttf/PlayfairDisplay-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/playfairdisplay/v37/nuFvD-vYSZviVYUb_rj3ij__anPXJzDwcbmjWBN2PKdFvXDXbtM.ttf",
    },
    FontSource {
        family: "Verdana",
        open_name: "Nunito",
        url: "https://raw.githubusercontent.com/googlefonts/nunito/main/fonts/variable/Nunito[wght].ttf",
        fallback_url: "https://fonts.gstatic.com/s/nunito/v26/XRXI3I6Li01BKofiOc5wtlZ2di8HDLshdTk3j77e.ttf",
    },
    FontSource {
        family: "Inter",
        open_name: "Inter",
        url: "https://github.com/rsms/inter/releases/download/v4.0/Inter-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/inter/v13/UcCO3FwrK3iLTeHuS_fvQtMwCp50KnMw2boKoduKmMEVuLyfAZ9hjg.ttf",
    },
    FontSource {
        family: "Montserrat",
        open_name: "Montserrat",
        url: "https://raw.githubusercontent.com/JulietaUla/Montserrat/master/fonts/ttf/Montserrat-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/montserrat/v26/JTUSjIg1_i6t8kCHKm459WlhyyTh89Y.ttf",
    },
    FontSource {
        family: "Poppins",
        open_name: "Poppins",
        url: "https://raw.githubusercontent.com/itfoundry/poppins/master/products/Poppins-4.003-GoogleFonts-TTF/Poppins-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/poppins/v21/pxiEyp8kv8JHgFVrJJfecnFHGPc.ttf",
    },
    FontSource {
        family: "Roboto",
        open_name: "Roboto",
        url: "https://github.com/googlefonts/roboto/raw/main/src/hinted/Roboto-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/roboto/v30/KFOmCnqEu92Fr1Mu4mxKKTU1Kg.ttf",
    },
    FontSource {
        family: "Lato",
        open_name: "Lato",
        url: "https://raw.githubusercontent.com/googlefonts/LatoGFVersion/main/fonts/Lato-Regular.ttf",
        fallback_url: "https://fonts.gstatic.com/s/lato/v24/S6uyw4BMUTPHjx4wXiWtFCc.ttf",
    },
];

pub fn lookup(family: &str) -> Option<&'static FontSource> {
    FONT_SOURCES.iter().find(|s| s.family == family)
}

pub fn is_registered(family: &str) -> bool {
    lookup(family).is_some()
}

/// `"Playfair Display"` → `"PlayfairDisplay.ttf"`
pub fn file_name(family: &str) -> String {
    let stem: String = family.chars().filter(|c| *c != ' ').collect();
    format!("{}.ttf", stem)
}
