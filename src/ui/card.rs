use std::fmt::Write;

use serde::Serialize;

use super::action_menu::{ActionCommand, ActionMenu, MenuInput};
use crate::domain::ExternalId;

/// One catalog or shelf item as shown in a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card<A> {
    pub id: ExternalId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    /// Path opened by a body tap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<ActionMenu<A>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardInput {
    BodyTap,
    Action(MenuInput),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEvent<A> {
    Open(ExternalId),
    Action(A),
    None,
}

fn present(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// One decimal place, e.g. `4.56` renders as `4.6`.
#[must_use]
pub fn rating_label(rating: f64) -> String {
    format!("{rating:.1}")
}

impl<A: ActionCommand> Card<A> {
    #[must_use]
    pub fn new(id: impl Into<ExternalId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            description: None,
            image_url: None,
            rating: None,
            footer: None,
            href: None,
            actions: None,
        }
    }

    #[must_use]
    pub fn subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = present(subtitle);
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = present(description);
        self
    }

    #[must_use]
    pub fn image(mut self, image_url: Option<String>) -> Self {
        self.image_url = present(image_url);
        self
    }

    #[must_use]
    pub const fn rating(mut self, rating: Option<f64>) -> Self {
        self.rating = rating;
        self
    }

    #[must_use]
    pub fn footer(mut self, footer: Option<String>) -> Self {
        self.footer = present(footer);
        self
    }

    #[must_use]
    pub fn href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: ActionMenu<A>) -> Self {
        self.actions = Some(actions);
        self
    }

    #[must_use]
    pub const fn clickable(&self) -> bool {
        self.href.is_some()
    }

    #[must_use]
    pub fn rating_label(&self) -> Option<String> {
        self.rating.map(rating_label)
    }

    /// Body taps open the item; action inputs go to the menu only.
    pub fn handle(&mut self, input: CardInput) -> CardEvent<A> {
        match input {
            CardInput::BodyTap if self.clickable() => CardEvent::Open(self.id.clone()),
            CardInput::BodyTap => CardEvent::None,
            CardInput::Action(menu_input) => self
                .actions
                .as_mut()
                .and_then(|menu| menu.handle(menu_input))
                .map_or(CardEvent::None, CardEvent::Action),
        }
    }

    /// Plain-text rendering for terminals.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = format!("[{}] {}", self.id, self.title);
        if let Some(subtitle) = &self.subtitle {
            let _ = write!(out, " ({subtitle})");
        }
        if let Some(rating) = self.rating_label() {
            let _ = write!(out, " ★ {rating}");
        }
        if let Some(footer) = &self.footer {
            let _ = write!(out, "\n    {footer}");
        }
        if let Some(description) = &self.description {
            let short: String = description.chars().take(160).collect();
            let ellipsis = if short.len() < description.len() { "…" } else { "" };
            let _ = write!(out, "\n    {short}{ellipsis}");
        }
        out
    }
}
