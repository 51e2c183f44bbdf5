//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use orderdesk_core::auth::{Route, View};

use crate::app::{
    can_add_password_char, can_add_username_char, App, AppState, LoginFocus, Mutation, PromptKind,
    PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Overlays take every key while open
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => return Ok(handle_quit_confirm(app, key)),
        AppState::ConfirmingLogout => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_logout(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.state = AppState::Normal,
                _ => {}
            }
            return Ok(false);
        }
        AppState::Prompting => {
            handle_prompt_input(app, key);
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    match app.view() {
        View::Loading => {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            Ok(false)
        }
        View::Render(Route::Login) => handle_login_input(app, key).await,
        View::Render(route) => {
            handle_shell_input(app, route, key);
            Ok(false)
        }
    }
}

fn handle_quit_confirm(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.state = AppState::Quitting;
            true
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.state = AppState::Normal;
            false
        }
        _ => false,
    }
}

fn handle_shell_input(app: &mut App, route: Route, key: KeyEvent) {
    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return;
        }
        KeyCode::Char('L') => {
            app.state = AppState::ConfirmingLogout;
            return;
        }
        KeyCode::Char('t') => {
            app.toggle_theme();
            return;
        }
        KeyCode::Char('r') => {
            app.reload();
            return;
        }
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            app.search_query.clear();
            return;
        }
        KeyCode::Char(c @ '1'..='8') => {
            let index = c as usize - '1' as usize;
            app.navigate(Route::NAVIGATION[index]);
            return;
        }
        KeyCode::Left => {
            app.navigate(cycle_section(route, false));
            return;
        }
        KeyCode::Right => {
            app.navigate(cycle_section(route, true));
            return;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.move_selection(-1);
            return;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.move_selection(1);
            return;
        }
        KeyCode::PageUp => {
            app.move_selection(-(PAGE_SCROLL_SIZE as isize));
            return;
        }
        KeyCode::PageDown => {
            app.move_selection(PAGE_SCROLL_SIZE as isize);
            return;
        }
        KeyCode::Home => {
            app.selection = 0;
            return;
        }
        KeyCode::End => {
            app.select_last();
            return;
        }
        KeyCode::Enter => {
            if route == Route::CreateOrder {
                app.open_prompt(PromptKind::CreateOrder);
            } else {
                app.open_selected();
            }
            return;
        }
        KeyCode::Esc => {
            if app.search_query.is_empty() {
                app.go_back();
            } else {
                app.search_query.clear();
                app.selection = 0;
            }
            return;
        }
        _ => {}
    }

    if let KeyCode::Char(c) = key.code {
        handle_screen_key(app, route, c);
    }
}

/// Keys that only mean something on one screen
fn handle_screen_key(app: &mut App, route: Route, c: char) {
    match (route, c) {
        (Route::Orders, 'n') => {
            app.navigate(Route::CreateOrder);
            app.open_prompt(PromptKind::CreateOrder);
        }
        (Route::CreateOrder, 'n') => app.open_prompt(PromptKind::CreateOrder),
        (Route::Orders, 'f') => {
            app.order_filter = app.order_filter.next();
            app.selection = 0;
        }
        (Route::OrderDetail(id), 'd') => {
            if app.data.order.as_ref().is_some_and(|o| o.can_deliver()) {
                app.mutate(Mutation::DeliverOrder(id));
            } else {
                app.status_message = Some("This order cannot be delivered".to_string());
            }
        }
        (Route::OrderDetail(id), 'c') => {
            if app.data.order.as_ref().is_some_and(|o| o.can_cancel()) {
                app.open_prompt(PromptKind::CancelOrder(id));
            } else {
                app.status_message = Some("This order cannot be cancelled".to_string());
            }
        }
        (Route::OrderDetail(id), 'p') => {
            if app.data.order.as_ref().is_some_and(|o| o.can_pay()) {
                app.open_prompt(PromptKind::AddPayment(id));
            } else {
                app.status_message = Some("Nothing left to pay on this order".to_string());
            }
        }
        (Route::OrderDetail(id), 'a') => app.open_prompt(PromptKind::AddOrderNote(id)),
        (Route::Customers, 'n') => app.open_prompt(PromptKind::CreateCustomer),
        (Route::CustomerDetail(id), 's') => app.open_prompt(PromptKind::AddCustomerStatus(id)),
        (Route::CustomerDetail(id), 'a') => app.open_prompt(PromptKind::AddCustomerNote(id)),
        (Route::Products, 'n') => app.open_prompt(PromptKind::CreateProduct),
        (Route::Products, 'a') => {
            let target = app
                .visible_products()
                .get(app.selection)
                .map(|p| (p.id, !p.is_active));
            if let Some((id, active)) = target {
                app.mutate(Mutation::SetProductActive(id, active));
            }
        }
        (Route::StockMovements, 'n') => app.open_prompt(PromptKind::RecordMovement),
        (Route::Users, 'n') => app.open_prompt(PromptKind::CreateUser),
        (Route::Users, 'a') => toggle_selected_user(app),
        (Route::Profile, 'e') => {
            if let Some(id) = app.data.profile.as_ref().map(|u| u.id) {
                app.open_prompt(PromptKind::ChangeFullName(id));
            }
        }
        _ => {}
    }
}

fn toggle_selected_user(app: &mut App) {
    let Some((id, active)) = app
        .visible_users()
        .get(app.selection)
        .map(|u| (u.id, !u.is_active))
    else {
        return;
    };
    if app.session.current_user().is_some_and(|me| me.id == id) {
        app.status_message = Some("You cannot deactivate your own account".to_string());
        return;
    }
    app.mutate(Mutation::SetUserActive(id, active));
}

/// Neighbouring navigation entry, wrapping at both ends
fn cycle_section(route: Route, forward: bool) -> Route {
    let nav = &Route::NAVIGATION;
    let current = nav.iter().position(|r| *r == route.section()).unwrap_or(0);
    let next = if forward {
        (current + 1) % nav.len()
    } else {
        (current + nav.len() - 1) % nav.len()
    };
    nav[next]
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            // Keep search query active
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.selection = 0;
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.selection = 0;
        }
        _ => {}
    }
}

fn handle_prompt_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Backspace => app.pop_prompt_char(),
        KeyCode::Char(c) => app.push_prompt_char(c),
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            // Submitting from the password field saves a keystroke
            LoginFocus::Password | LoginFocus::Button => app.attempt_login().await,
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}
