//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Frame layout, login screen and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Dark and light palettes
//! - `screens`: Per-route content rendering (orders, customers, etc.)

pub mod input;
pub mod render;
pub mod screens;
pub mod styles;
