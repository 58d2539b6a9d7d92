use std::env;

use clap::ValueEnum;

/// Shown instead of an author name when a post has no user attached.
pub const PLACEHOLDER_AUTHOR: &str = "Товарищ";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Locale {
    En,
    Ru,
}

impl Locale {
    /// Guess the user's locale the way the C library does: the first of
    /// `LC_ALL`, `LC_MESSAGES` and `LANG` that is set wins.
    pub fn detect() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .into_iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.is_empty())
            .map_or(Self::En, |value| Self::from_posix(&value))
    }

    fn from_posix(value: &str) -> Self {
        if value.to_ascii_lowercase().starts_with("ru") {
            Self::Ru
        } else {
            Self::En
        }
    }

    pub fn missing_credential(self) -> &'static str {
        match self {
            Self::En => "Comrade, please log in!",
            Self::Ru => "Товарищ, авторизуйтесь!",
        }
    }

    /// A `chrono` format string approximating how a browser in this locale
    /// renders a date with its time.
    pub fn time_format(self) -> &'static str {
        match self {
            Self::En => "%-m/%-d/%Y, %-I:%M:%S %p",
            Self::Ru => "%d.%m.%Y, %H:%M:%S",
        }
    }

    pub fn like_hint(self, id: i64) -> String {
        match self {
            Self::En => format!("run `like {id}` to like this post"),
            Self::Ru => format!("`like {id}`, чтобы поставить лайк"),
        }
    }
}
