use std::fmt::{Display, Write};

use build_html::{Html, HtmlContainer, HtmlElement, HtmlTag, escape_html};
use chrono::{
    TimeZone,
    format::{Item, StrftimeItems},
};

use crate::{
    api::Post,
    error::Error,
    locale::{Locale, PLACEHOLDER_AUTHOR},
};

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub locale: Locale,
    /// Overrides the locale's date format when set.
    time_format: Option<String>,
}

impl RenderOptions {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            time_format: None,
        }
    }

    /// Use `format` for post dates instead of the locale's. Formats chrono
    /// cannot parse are refused here, so rendering never meets one.
    pub fn with_time_format(mut self, format: impl Into<String>) -> Result<Self, Error> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::TimeFormat { format });
        }
        self.time_format = Some(format);
        Ok(self)
    }

    fn time_format(&self) -> &str {
        self.time_format
            .as_deref()
            .unwrap_or_else(|| self.locale.time_format())
    }
}

/// Render every post, in the order given, into one string of fragments.
pub fn posts<Tz>(posts: &[Post], options: &RenderOptions, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    posts
        .iter()
        .map(|post| fragment(post, options, tz).to_html_string())
        .collect()
}

/// Render a single post.
pub fn fragment<Tz>(post: &Post, options: &RenderOptions, tz: &Tz) -> HtmlElement
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let author = post.author().unwrap_or(PLACEHOLDER_AUTHOR);
    let local = post.created_at.with_timezone(tz);
    let mut created = String::new();
    if write!(created, "{}", local.format(options.time_format())).is_err() {
        created = local.to_rfc3339();
    }

    let mut div = HtmlElement::new(HtmlTag::Div)
        .with_attribute("class", "post")
        .with_attribute("data-id", post.id.to_string());

    div.add_child(
        HtmlElement::new(HtmlTag::Div)
            .with_attribute("class", "post-header")
            .with_raw(format!(
                r#"<strong>{}</strong><span class="slogan">{}</span>"#,
                escape_html(author),
                escape_html(&post.slogan)
            ))
            .into(),
    );
    div.add_child(
        HtmlElement::new(HtmlTag::ParagraphText)
            .with_raw(escape_html(&post.content))
            .into(),
    );
    // The post list endpoint does not count comments, so 0 means unknown.
    let comments = if post.comments_count > 0 {
        format!(r#"<span class="comments">💬 {}</span>"#, post.comments_count)
    } else {
        String::new()
    };
    div.add_child(
        HtmlElement::new(HtmlTag::Div)
            .with_attribute("class", "post-footer")
            .with_raw(format!(
                r#"<button data-like="{id}" title="{hint}">👍 {likes}</button>{comments}<span class="created">{created}</span>"#,
                id = post.id,
                hint = escape_html(&options.locale.like_hint(post.id)),
                likes = post.likes,
                created = escape_html(&created),
            ))
            .into(),
    );

    div
}
