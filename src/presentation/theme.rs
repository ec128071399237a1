use colored::Colorize;

pub struct Theme {
    pub status_ok: fn(&str) -> String,
    pub status_err: fn(&str) -> String,
    pub source: fn(&str) -> String,
    pub line: fn(&str) -> String,
    pub key: fn(&str) -> String,
    pub body: fn(&str) -> String,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name {
            "default" | "" => Self::default_theme(),
            "vivid" => Self::vivid(),
            "plain" => Self::plain(),
            _ => {
                eprintln!("{}", format!("✘ Unknown theme: {}", name).red());
                Self::default_theme()
            }
        }
    }

    fn default_theme() -> Self {
        Self {
            status_ok: |s| s.green().bold().to_string(),
            status_err: |s| s.red().bold().to_string(),
            source: |s| s.cyan().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            key: |s| s.bright_white().to_string(),
            body: |s| s.white().to_string(),
        }
    }

    fn vivid() -> Self {
        Self {
            status_ok: |s| s.bright_green().bold().underline().to_string(),
            status_err: |s| s.bright_red().bold().underline().to_string(),
            source: |s| s.bright_magenta().italic().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            key: |s| s.yellow().to_string(),
            body: |s| s.bright_white().to_string(),
        }
    }

    fn plain() -> Self {
        Self {
            status_ok: |s| s.to_string(),
            status_err: |s| s.to_string(),
            source: |s| s.to_string(),
            line: |s| s.to_string(),
            key: |s| s.to_string(),
            body: |s| s.to_string(),
        }
    }
}
