//! Extension → icon table used by the tree renderer when icons are enabled.

/// Icon shown in front of directories.
pub const FOLDER_ICON: &str = "📁 ";

/// Icon for files whose extension is not in the table.
pub const DEFAULT_FILE_ICON: &str = "📄 ";

/// Icon (including its trailing space) for an entry named `name`.
pub fn icon_for(name: &str, is_dir: bool) -> &'static str {
    if is_dir {
        return FOLDER_ICON;
    }

    let lower = name.to_lowercase();
    // Conventional extension-less build files.
    match lower.as_str() {
        "dockerfile" => return "🐳 ",
        "makefile" => return "🛠️ ",
        _ => {}
    }

    let ext = match lower.rfind('.') {
        Some(pos) if pos > 0 => &lower[pos..],
        // Dotfiles such as `.gitignore` are their own "extension".
        Some(_) => lower.as_str(),
        None => return DEFAULT_FILE_ICON,
    };

    match ext {
        ".py" => "🐍 ",
        ".js" => "📜 ",
        ".jsx" | ".tsx" => "⚛️ ",
        ".ts" => "📘 ",
        ".html" => "🌐 ",
        ".css" | ".scss" => "🎨 ",
        ".md" => "📝 ",
        ".txt" => "📄 ",
        ".json" | ".bat" => "⚙️ ",
        ".yml" | ".yaml" => "🔧 ",
        ".xml" => "📰 ",
        ".csv" | ".xls" | ".xlsx" => "📊 ",
        ".pdf" => "📕 ",
        ".png" | ".jpg" | ".jpeg" | ".gif" | ".svg" => "🖼️ ",
        ".zip" | ".rar" | ".tar" | ".gz" => "📦 ",
        ".exe" => "🚀 ",
        ".sh" => "🐚 ",
        ".dockerfile" => "🐳 ",
        ".gitignore" => "👁️ ",
        ".rs" => "🦀 ",
        _ => DEFAULT_FILE_ICON,
    }
}
