pub mod dataimage;
pub mod keymap;
pub mod menu;

pub use dataimage::{decode, DataImage};
pub use keymap::{Binding, Platform};
pub use menu::{build, Command, MenuConfig, MenuGroup};
