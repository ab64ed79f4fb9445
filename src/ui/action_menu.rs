//! Button with an attached dropdown of commands.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Primary,
    Secondary,
    Danger,
}

/// A command a menu entry runs.
pub trait ActionCommand: Copy + PartialEq + Send + Sync + 'static {
    fn label(&self) -> &'static str;

    fn variant(&self) -> Variant {
        Variant::Primary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionItem<A> {
    pub command: A,
    pub label: &'static str,
    pub variant: Variant,
}

impl<A: ActionCommand> ActionItem<A> {
    #[must_use]
    pub fn new(command: A) -> Self {
        Self {
            label: command.label(),
            variant: command.variant(),
            command,
        }
    }

    #[must_use]
    pub const fn labeled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuState {
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    MainClick,
    Toggle,
    Select(usize),
    PointerDownOutside,
    PointerDownInside,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionMenu<A> {
    items: Vec<ActionItem<A>>,
    selected: usize,
    main_label: Option<String>,
    disabled: bool,
    state: MenuState,
}

impl<A: ActionCommand> ActionMenu<A> {
    #[must_use]
    pub fn new(items: Vec<ActionItem<A>>) -> Self {
        Self {
            items,
            selected: 0,
            main_label: None,
            disabled: false,
            state: MenuState::Closed,
        }
    }

    #[must_use]
    pub fn with_main_label(mut self, label: impl Into<String>) -> Self {
        self.main_label = Some(label.into());
        self
    }

    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[must_use]
    pub fn items(&self) -> &[ActionItem<A>] {
        &self.items
    }

    #[must_use]
    pub const fn state(&self) -> MenuState {
        self.state
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[must_use]
    pub fn selected(&self) -> Option<&ActionItem<A>> {
        self.items.get(self.selected)
    }

    /// Text on the main button: the fixed label, else the selected command.
    #[must_use]
    pub fn button_label(&self) -> &str {
        match &self.main_label {
            Some(label) => label,
            None => self.selected().map_or("", |item| item.label),
        }
    }

    /// Whether the outside-pointer listener is registered.
    #[must_use]
    pub fn listening(&self) -> bool {
        self.state == MenuState::Open
    }

    /// Entries shown in the dropdown, with their indices.
    pub fn visible_options(&self) -> impl Iterator<Item = (usize, &ActionItem<A>)> {
        let show_all = self.main_label.is_some();
        let selected = self.selected;
        self.items
            .iter()
            .enumerate()
            .filter(move |(index, _)| show_all || *index != selected)
    }

    /// Applies one input, returning the command to run, if any.
    pub fn handle(&mut self, input: MenuInput) -> Option<A> {
        match input {
            MenuInput::MainClick => {
                if self.disabled {
                    None
                } else if self.main_label.is_some() {
                    self.toggle();
                    None
                } else {
                    self.selected().map(|item| item.command)
                }
            }
            MenuInput::Toggle => {
                self.toggle();
                None
            }
            MenuInput::Select(index) => {
                if self.disabled || self.state != MenuState::Open {
                    return None;
                }
                let command = self.items.get(index)?.command;
                self.selected = index;
                self.state = MenuState::Closed;
                Some(command)
            }
            MenuInput::PointerDownOutside => {
                if self.listening() {
                    self.state = MenuState::Closed;
                }
                None
            }
            MenuInput::PointerDownInside => None,
        }
    }

    fn toggle(&mut self) {
        if self.disabled {
            return;
        }
        self.state = match self.state {
            MenuState::Closed => MenuState::Open,
            MenuState::Open => MenuState::Closed,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cmd {
        Add,
        Watched,
        Remove,
    }

    impl ActionCommand for Cmd {
        fn label(&self) -> &'static str {
            match self {
                Self::Add => "Agregar",
                Self::Watched => "Vista",
                Self::Remove => "Quitar",
            }
        }

        fn variant(&self) -> Variant {
            match self {
                Self::Remove => Variant::Danger,
                _ => Variant::Primary,
            }
        }
    }

    fn menu() -> ActionMenu<Cmd> {
        ActionMenu::new(vec![
            ActionItem::new(Cmd::Add),
            ActionItem::new(Cmd::Watched),
            ActionItem::new(Cmd::Remove),
        ])
    }

    #[test]
    fn test_main_click_runs_selected_command() {
        let mut menu = menu();
        assert_eq!(menu.button_label(), "Agregar");
        assert_eq!(menu.handle(MenuInput::MainClick), Some(Cmd::Add));
        assert_eq!(menu.state(), MenuState::Closed);
    }

    #[test]
    fn test_main_click_with_label_toggles() {
        let mut menu = menu().with_main_label("Acciones");
        assert_eq!(menu.handle(MenuInput::MainClick), None);
        assert_eq!(menu.state(), MenuState::Open);
        assert_eq!(menu.visible_options().count(), 3);
    }

    #[test]
    fn test_select_runs_command_and_closes() {
        let mut menu = menu();
        menu.handle(MenuInput::Toggle);

        assert_eq!(menu.handle(MenuInput::Select(2)), Some(Cmd::Remove));
        assert_eq!(menu.state(), MenuState::Closed);
        assert_eq!(menu.button_label(), "Quitar");

        let visible: Vec<_> = menu.visible_options().map(|(i, _)| i).collect();
        assert_eq!(visible, [0, 1]);
        assert_eq!(menu.handle(MenuInput::Select(9)), None);
    }

    #[test]
    fn test_outside_pointer_closes_only_when_open() {
        let mut menu = menu();
        assert!(!menu.listening());
        menu.handle(MenuInput::PointerDownOutside);
        assert_eq!(menu.state(), MenuState::Closed);

        menu.handle(MenuInput::Toggle);
        assert!(menu.listening());
        menu.handle(MenuInput::PointerDownInside);
        assert_eq!(menu.state(), MenuState::Open);
        menu.handle(MenuInput::PointerDownOutside);
        assert_eq!(menu.state(), MenuState::Closed);
        assert!(!menu.listening());
    }

    #[test]
    fn test_disabled_menu_ignores_clicks() {
        let mut menu = menu().disabled(true);
        assert_eq!(menu.handle(MenuInput::MainClick), None);
        menu.handle(MenuInput::Toggle);
        assert_eq!(menu.state(), MenuState::Closed);
        assert_eq!(menu.handle(MenuInput::Select(0)), None);
    }

    #[test]
    fn test_select_on_closed_menu_is_ignored() {
        let mut menu = menu();

        assert_eq!(menu.handle(MenuInput::Select(1)), None);
        assert_eq!(menu.button_label(), "Agregar");
    }

    #[test]
    fn test_item_relabel_and_variant() {
        let item = ActionItem::new(Cmd::Remove).labeled("Eliminar");
        assert_eq!(item.label, "Eliminar");
        assert_eq!(item.variant, Variant::Danger);
    }
}
