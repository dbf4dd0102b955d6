//! Default site settings.

use bridge_traits::{SettingItem, SettingVisibility};
use rand::distributions::Alphanumeric;
use rand::Rng;

pub const KEY_TITLE: &str = "title";
pub const KEY_PASSWORD: &str = "password";
pub const KEY_LOGO: &str = "logo";
pub const KEY_FAVICON: &str = "favicon";
pub const KEY_ICON_COLOR: &str = "icon color";
pub const KEY_TEXT_TYPES: &str = "text types";
pub const KEY_README_FILE: &str = "readme file";
pub const KEY_MUSIC_COVER: &str = "music cover";
pub const KEY_CHECK_PARENT: &str = "check parent folder";

pub const DEFAULT_TEXT_TYPES: &[&str] = &[
    "txt", "htm", "html", "xml", "java", "properties", "sql", "js", "md", "json", "conf", "ini",
    "vue", "php", "py", "bat", "gitignore", "yml", "go", "sh", "c", "cpp", "h", "hpp", "tsx",
];

/// Admin password generated on first start.
fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

fn item(key: &str, value: &str, description: &str, visibility: SettingVisibility) -> SettingItem {
    SettingItem {
        description: description.to_string(),
        ..SettingItem::new(key, value, visibility)
    }
}

/// Items written on first start when their key is absent.
pub fn defaults() -> Vec<SettingItem> {
    use SettingVisibility::{Private, Public};

    vec![
        item(KEY_TITLE, "Cloudmux", "title", Public),
        item(KEY_PASSWORD, &random_password(), "password", Private),
        item(
            KEY_LOGO,
            "https://cdn.jsdelivr.net/gh/alist-org/logo@main/can_circle.svg",
            "logo",
            Public,
        ),
        item(
            KEY_FAVICON,
            "https://cdn.jsdelivr.net/gh/alist-org/logo@main/logo.svg",
            "favicon",
            Public,
        ),
        item(KEY_ICON_COLOR, "#1890ff", "icon's color", Public),
        item(
            KEY_TEXT_TYPES,
            &DEFAULT_TEXT_TYPES.join(","),
            "text type extensions",
            Public,
        ),
        item(
            KEY_README_FILE,
            "README.md",
            "file shown below a folder listing",
            Public,
        ),
        item(
            KEY_MUSIC_COVER,
            "https://cdn.jsdelivr.net/gh/alist-org/logo@main/circle_center.svg",
            "music cover image",
            Public,
        ),
        item(
            KEY_CHECK_PARENT,
            "false",
            "check parent folder password",
            Private,
        ),
    ]
}
