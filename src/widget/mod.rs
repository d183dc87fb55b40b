pub mod help_popup;
pub mod hud_message;
pub mod reader_view;
pub mod sidebar;
