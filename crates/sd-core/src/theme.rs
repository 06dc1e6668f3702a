use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background_color: &'static str,
    pub text_color: &'static str,
    pub primary_color: &'static str,
    pub secondary_color: &'static str,
    pub aside_background: &'static str,
    pub header_background: &'static str,
    pub border_color: &'static str,
    pub hover_color: &'static str,
    pub menu_text_color: &'static str,
    pub menu_active_text_color: &'static str,
    pub menu_active_background: &'static str,
    pub shadow_color: &'static str,
    pub accent_color: &'static str,
}

const DARK: Palette = Palette {
    background_color: "#0d1014",
    text_color: "#ffffff",
    primary_color: "#3f85ed",
    secondary_color: "#a2c5f9",
    aside_background: "#14181e",
    header_background: "#14181e",
    border_color: "#303c4b",
    hover_color: "rgba(63, 133, 237, 0.1)",
    menu_text_color: "#c7dcfb",
    menu_active_text_color: "#a2c5f9",
    menu_active_background: "rgba(63, 133, 237, 0.2)",
    shadow_color: "rgba(0, 0, 0, 0.3)",
    accent_color: "#5f7ca5",
};

const LIGHT: Palette = Palette {
    background_color: "#f0f9ff",
    text_color: "#333333",
    primary_color: "#1890ff",
    secondary_color: "#52c41a",
    aside_background: "#ffffff",
    header_background: "#ffffff",
    border_color: "#e6e6e6",
    hover_color: "#f5f7fa",
    menu_text_color: "#333333",
    menu_active_text_color: "#1890ff",
    menu_active_background: "rgba(24, 144, 255, 0.1)",
    shadow_color: "rgba(0, 0, 0, 0.1)",
    accent_color: "#61dafb",
};

pub fn palette(mode: ThemeMode) -> &'static Palette {
    match mode {
        ThemeMode::Light => &LIGHT,
        ThemeMode::Dark => &DARK,
    }
}

/// CSS custom properties for `mode`, in a fixed order.
pub fn css_variables(mode: ThemeMode) -> [(&'static str, &'static str); 13] {
    let p = palette(mode);
    [
        ("--bg-color", p.background_color),
        ("--text-color", p.text_color),
        ("--primary-color", p.primary_color),
        ("--secondary-color", p.secondary_color),
        ("--aside-bg", p.aside_background),
        ("--header-bg", p.header_background),
        ("--border-color", p.border_color),
        ("--hover-color", p.hover_color),
        ("--menu-text-color", p.menu_text_color),
        ("--menu-active-text-color", p.menu_active_text_color),
        ("--menu-active-bg", p.menu_active_background),
        ("--shadow-color", p.shadow_color),
        ("--accent-color", p.accent_color),
    ]
}
