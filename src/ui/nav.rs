//! Top navigation: two section menus and the user menu.

use serde::Serialize;

use crate::session::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Movies,
    Books,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

const MOVIE_LINKS: &[NavLink] = &[
    NavLink { label: "Explorar", href: "/movies" },
    NavLink { label: "Por Ver", href: "/movies/watchlist" },
    NavLink { label: "Ya Vistas", href: "/movies/watched" },
];

const BOOK_LINKS: &[NavLink] = &[
    NavLink { label: "Explorar", href: "/books" },
    NavLink { label: "Por Leer", href: "/books/to-read" },
    NavLink { label: "Leyendo", href: "/books/reading" },
    NavLink { label: "Leídos", href: "/books/read" },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserMenu {
    SignIn { label: &'static str, href: &'static str },
    SignedIn { initial: String, username: String, sign_out_label: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavMenu {
    pub section: Section,
    pub label: &'static str,
    pub links: &'static [NavLink],
    pub open: bool,
}

/// At most one section menu is open at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavBar {
    open: Option<Section>,
}

impl NavBar {
    #[must_use]
    pub const fn new() -> Self {
        Self { open: None }
    }

    #[must_use]
    pub const fn open_menu(&self) -> Option<Section> {
        self.open
    }

    /// Opens `section`, closing the other one, or closes it when already open.
    pub fn toggle(&mut self, section: Section) {
        self.open = if self.open == Some(section) {
            None
        } else {
            Some(section)
        };
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    #[must_use]
    pub fn menus(&self) -> [NavMenu; 2] {
        [
            NavMenu {
                section: Section::Movies,
                label: "Películas",
                links: MOVIE_LINKS,
                open: self.open == Some(Section::Movies),
            },
            NavMenu {
                section: Section::Books,
                label: "Libros",
                links: BOOK_LINKS,
                open: self.open == Some(Section::Books),
            },
        ]
    }

    #[must_use]
    pub fn user_menu(identity: Option<&Identity>) -> UserMenu {
        match identity {
            None => UserMenu::SignIn {
                label: "Iniciar Sesión",
                href: "/login",
            },
            Some(identity) => UserMenu::SignedIn {
                initial: identity.initial(),
                username: identity.username.clone(),
                sign_out_label: "Cerrar Sesión",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn test_menus_are_mutually_exclusive() {
        let mut nav = NavBar::new();

        nav.toggle(Section::Movies);
        assert_eq!(nav.open_menu(), Some(Section::Movies));

        nav.toggle(Section::Books);
        let [movies, books] = nav.menus();
        assert!(!movies.open);
        assert!(books.open);

        nav.toggle(Section::Books);
        assert_eq!(nav.open_menu(), None);
    }

    #[test]
    fn test_links() {
        let [movies, books] = NavBar::new().menus();
        assert_eq!(movies.links.len(), 3);
        assert_eq!(books.links[2].label, "Leyendo");
    }

    #[test]
    fn test_user_menu() {
        assert!(matches!(NavBar::user_menu(None), UserMenu::SignIn { .. }));

        let identity = Identity::new(UserId::new(1), "marta");
        assert_eq!(
            NavBar::user_menu(Some(&identity)),
            UserMenu::SignedIn {
                initial: "M".into(),
                username: "marta".into(),
                sign_out_label: "Cerrar Sesión",
            }
        );
    }
}
