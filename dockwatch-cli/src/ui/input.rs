use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};

use dockwatch_core::state::ScrollState;

/// Lines moved per mouse wheel notch.
const WHEEL_STEP: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    Top,
    Follow,
}

pub fn action_for(event: &Event) -> Option<Action> {
    match event {
        Event::Key(key) => key_action(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => Some(Action::ScrollUp(WHEEL_STEP)),
            MouseEventKind::ScrollDown => Some(Action::ScrollDown(WHEEL_STEP)),
            _ => None,
        },
        _ => None,
    }
}

fn key_action(key: &KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let action = match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
        (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => Action::Quit,
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Action::ScrollUp(1),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Action::ScrollDown(1),
        (KeyCode::PageUp, _) => Action::PageUp,
        (KeyCode::PageDown, _) => Action::PageDown,
        (KeyCode::Home, _) | (KeyCode::Char('g'), _) => Action::Top,
        (KeyCode::End, _) | (KeyCode::Char('G'), _) | (KeyCode::Char('f'), _) => Action::Follow,
        _ => return None,
    };
    Some(action)
}

/// Applies a scroll action. Returns false for `Quit`.
pub fn apply(action: Action, scroll: &mut ScrollState) -> bool {
    match action {
        Action::Quit => return false,
        Action::ScrollUp(n) => scroll.scroll_up(n),
        Action::ScrollDown(n) => scroll.scroll_down(n),
        Action::PageUp => scroll.page_up(),
        Action::PageDown => scroll.page_down(),
        Action::Top => scroll.scroll_to_top(),
        Action::Follow => scroll.follow(),
    }
    true
}
