//! Builds the editor command menu from the configuration value the editing
//! surface hands over once it is ready. The configuration is pure data; the
//! same config always produces the same menu.

use std::collections::HashMap;

use serde::Deserialize;

use crate::keymap::{self, Binding, Platform};

/// The one-time configuration value read from the editor at ready time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MenuConfig {
    pub keymap: HashMap<String, Binding>,
    pub toolbar: ToolbarConfig,
}

impl MenuConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolbarConfig {
    pub visibility: BarVisibility,
    pub insert_bar: InsertBar,
    pub style_menu: StyleMenu,
    pub style_bar: StyleBar,
    pub format_bar: FormatBar,
    pub table_menu: TableMenu,
}

/// Per-group visibility switches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BarVisibility {
    pub insert_bar: bool,
    pub style_menu: bool,
    pub style_bar: bool,
    pub format_bar: bool,
    pub search_bar: bool,
}

impl Default for BarVisibility {
    fn default() -> Self {
        Self {
            insert_bar: true,
            style_menu: true,
            style_bar: true,
            format_bar: true,
            search_bar: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InsertBar {
    pub link: bool,
    pub image: bool,
    pub table: bool,
}

impl Default for InsertBar {
    fn default() -> Self {
        Self {
            link: true,
            image: true,
            table: true,
        }
    }
}

/// Paragraph style flags. A present value is both the visibility flag and
/// the display label for that style.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleMenu {
    pub p: Option<String>,
    pub h1: Option<String>,
    pub h2: Option<String>,
    pub h3: Option<String>,
    pub h4: Option<String>,
    pub h5: Option<String>,
    pub h6: Option<String>,
    pub pre: Option<String>,
}

impl Default for StyleMenu {
    fn default() -> Self {
        Self {
            p: Some("Normal".to_string()),
            h1: Some("H1".to_string()),
            h2: Some("H2".to_string()),
            h3: Some("H3".to_string()),
            h4: Some("H4".to_string()),
            h5: Some("H5".to_string()),
            h6: Some("H6".to_string()),
            pre: Some("Code".to_string()),
        }
    }
}

/// `list` covers both list kinds, `dent` covers indent and outdent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleBar {
    pub list: bool,
    pub dent: bool,
}

impl Default for StyleBar {
    fn default() -> Self {
        Self {
            list: true,
            dent: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormatBar {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub subscript: bool,
    pub superscript: bool,
}

impl Default for FormatBar {
    fn default() -> Self {
        Self {
            bold: true,
            italic: true,
            underline: true,
            code: false,
            strikethrough: false,
            subscript: false,
            superscript: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableMenu {
    pub header: bool,
    pub border: bool,
}

impl Default for TableMenu {
    fn default() -> Self {
        Self {
            header: true,
            border: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Pre,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSide {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableBorder {
    All,
    Outer,
    Header,
    None,
}

/// Every operation the menu can ask the editor to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    InsertLink,
    InsertImage,
    InsertTable { rows: u32, cols: u32 },
    SetStyle(ParagraphStyle),
    BulletList,
    NumberedList,
    Indent,
    Outdent,
    Bold,
    Italic,
    Underline,
    Code,
    Strikethrough,
    Subscript,
    Superscript,
    Search,
    AddRow(TableSide),
    AddColumn(TableSide),
    AddHeader,
    DeleteRow,
    DeleteColumn,
    DeleteTable,
    SetBorder(TableBorder),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    pub accelerator: Option<String>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuItem {
    Command(MenuEntry),
    Submenu { label: String, items: Vec<MenuItem> },
}

impl MenuItem {
    pub fn label(&self) -> &str {
        match self {
            Self::Command(entry) => &entry.label,
            Self::Submenu { label, .. } => label,
        }
    }
}

/// An ordered run of menu items rendered with a separator after it.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuGroup {
    pub label: String,
    pub items: Vec<MenuItem>,
}

/// Build the ordered command menu for a configuration.
pub fn build(config: &MenuConfig, platform: Platform) -> Vec<MenuGroup> {
    let mut groups = Vec::new();
    push_group(&mut groups, insert_group(config, platform));
    push_group(&mut groups, style_group(config, platform));
    push_group(&mut groups, list_group(config, platform));
    push_group(&mut groups, format_group(config, platform));
    push_group(&mut groups, search_group(config, platform));
    groups
}

/// A group with no qualifying member disappears, separator included.
fn push_group(groups: &mut Vec<MenuGroup>, group: MenuGroup) {
    if !group.items.is_empty() {
        groups.push(group);
    }
}

/// The inclusion rule, in one place: a command is shown when its group is
/// visible and its own toolbar flag is set, OR when the keymap binds it.
/// Either side alone is sufficient.
fn included(config: &MenuConfig, group_visible: bool, flag: bool, id: &str) -> bool {
    (group_visible && flag) || config.keymap.contains_key(id)
}

fn accelerator(config: &MenuConfig, platform: Platform, id: &str) -> Option<String> {
    config
        .keymap
        .get(id)
        .and_then(|binding| keymap::translate_binding(binding, platform))
}

fn entry(
    config: &MenuConfig,
    platform: Platform,
    id: &str,
    label: &str,
    command: Command,
) -> MenuItem {
    MenuItem::Command(MenuEntry {
        label: label.to_string(),
        accelerator: accelerator(config, platform, id),
        command,
    })
}

fn insert_group(config: &MenuConfig, platform: Platform) -> MenuGroup {
    let bar = &config.toolbar.insert_bar;
    let visible = config.toolbar.visibility.insert_bar;
    let specs: [(&str, &str, Command, bool); 2] = [
        ("link", "Link…", Command::InsertLink, bar.link),
        ("image", "Image…", Command::InsertImage, bar.image),
    ];

    let mut items = Vec::new();
    for (id, label, command, flag) in specs {
        if included(config, visible, flag, id) {
            items.push(entry(config, platform, id, label, command));
        }
    }
    if included(config, visible, bar.table, "table") {
        items.push(table_submenu(&config.toolbar.table_menu));
    }
    MenuGroup {
        label: "Insert".to_string(),
        items,
    }
}

fn style_group(config: &MenuConfig, platform: Platform) -> MenuGroup {
    let menu = &config.toolbar.style_menu;
    let visible = config.toolbar.visibility.style_menu;
    let specs: [(&str, &Option<String>, ParagraphStyle); 8] = [
        ("p", &menu.p, ParagraphStyle::P),
        ("h1", &menu.h1, ParagraphStyle::H1),
        ("h2", &menu.h2, ParagraphStyle::H2),
        ("h3", &menu.h3, ParagraphStyle::H3),
        ("h4", &menu.h4, ParagraphStyle::H4),
        ("h5", &menu.h5, ParagraphStyle::H5),
        ("h6", &menu.h6, ParagraphStyle::H6),
        ("pre", &menu.pre, ParagraphStyle::Pre),
    ];

    let mut items = Vec::new();
    for (id, label, style) in specs {
        if included(config, visible, label.is_some(), id) {
            let label = label
                .clone()
                .unwrap_or_else(|| default_style_label(style).to_string());
            items.push(MenuItem::Command(MenuEntry {
                label,
                accelerator: accelerator(config, platform, id),
                command: Command::SetStyle(style),
            }));
        }
    }
    MenuGroup {
        label: "Style".to_string(),
        items,
    }
}

/// Fallback label for a style forced in by a keymap binding alone.
fn default_style_label(style: ParagraphStyle) -> &'static str {
    match style {
        ParagraphStyle::P => "Normal",
        ParagraphStyle::H1 => "H1",
        ParagraphStyle::H2 => "H2",
        ParagraphStyle::H3 => "H3",
        ParagraphStyle::H4 => "H4",
        ParagraphStyle::H5 => "H5",
        ParagraphStyle::H6 => "H6",
        ParagraphStyle::Pre => "Code",
    }
}

fn list_group(config: &MenuConfig, platform: Platform) -> MenuGroup {
    let bar = &config.toolbar.style_bar;
    let visible = config.toolbar.visibility.style_bar;
    let specs: [(&str, &str, Command, bool); 4] = [
        ("bullet", "Bullet List", Command::BulletList, bar.list),
        ("number", "Numbered List", Command::NumberedList, bar.list),
        ("indent", "Indent", Command::Indent, bar.dent),
        ("outdent", "Outdent", Command::Outdent, bar.dent),
    ];

    let mut items = Vec::new();
    for (id, label, command, flag) in specs {
        if included(config, visible, flag, id) {
            items.push(entry(config, platform, id, label, command));
        }
    }
    MenuGroup {
        label: "List".to_string(),
        items,
    }
}

fn format_group(config: &MenuConfig, platform: Platform) -> MenuGroup {
    let bar = &config.toolbar.format_bar;
    let visible = config.toolbar.visibility.format_bar;
    let specs: [(&str, &str, Command, bool); 7] = [
        ("bold", "Bold", Command::Bold, bar.bold),
        ("italic", "Italic", Command::Italic, bar.italic),
        ("underline", "Underline", Command::Underline, bar.underline),
        ("code", "Code", Command::Code, bar.code),
        (
            "strikethrough",
            "Strikethrough",
            Command::Strikethrough,
            bar.strikethrough,
        ),
        ("subscript", "Subscript", Command::Subscript, bar.subscript),
        (
            "superscript",
            "Superscript",
            Command::Superscript,
            bar.superscript,
        ),
    ];

    let mut items = Vec::new();
    for (id, label, command, flag) in specs {
        if included(config, visible, flag, id) {
            items.push(entry(config, platform, id, label, command));
        }
    }
    MenuGroup {
        label: "Format".to_string(),
        items,
    }
}

fn search_group(config: &MenuConfig, platform: Platform) -> MenuGroup {
    let visible = config.toolbar.visibility.search_bar;
    let mut items = Vec::new();
    // Search has no sub-flag of its own; the bar switch stands in for it.
    if included(config, visible, true, "search") {
        items.push(entry(config, platform, "search", "Search…", Command::Search));
    }
    MenuGroup {
        label: "Search".to_string(),
        items,
    }
}

const TABLE_GRID_MAX: u32 = 4;

fn table_submenu(menu: &TableMenu) -> MenuItem {
    let mut grid = Vec::new();
    for rows in 1..=TABLE_GRID_MAX {
        for cols in 1..=TABLE_GRID_MAX {
            grid.push(plain(
                &format!("{rows}×{cols}"),
                Command::InsertTable { rows, cols },
            ));
        }
    }

    let mut items = vec![MenuItem::Submenu {
        label: "Insert Table".to_string(),
        items: grid,
    }];
    items.push(plain("Add Row Above", Command::AddRow(TableSide::Before)));
    items.push(plain("Add Row Below", Command::AddRow(TableSide::After)));
    items.push(plain(
        "Add Column Before",
        Command::AddColumn(TableSide::Before),
    ));
    items.push(plain(
        "Add Column After",
        Command::AddColumn(TableSide::After),
    ));
    if menu.header {
        items.push(plain("Add Header", Command::AddHeader));
    }
    items.push(plain("Delete Row", Command::DeleteRow));
    items.push(plain("Delete Column", Command::DeleteColumn));
    items.push(plain("Delete Table", Command::DeleteTable));
    if menu.border {
        items.push(MenuItem::Submenu {
            label: "Border".to_string(),
            items: vec![
                plain("All", Command::SetBorder(TableBorder::All)),
                plain("Outer", Command::SetBorder(TableBorder::Outer)),
                plain("Header", Command::SetBorder(TableBorder::Header)),
                plain("None", Command::SetBorder(TableBorder::None)),
            ],
        });
    }

    MenuItem::Submenu {
        label: "Table".to_string(),
        items,
    }
}

fn plain(label: &str, command: Command) -> MenuItem {
    MenuItem::Command(MenuEntry {
        label: label.to_string(),
        accelerator: None,
        command,
    })
}
