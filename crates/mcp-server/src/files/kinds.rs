use std::path::Path;

fn extension_lower(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Content-type tag derived from the file extension alone; contents are never sniffed.
pub fn content_type_for_path(path: &Path) -> &'static str {
    match extension_lower(path).as_str() {
        "txt" | "rb" | "php" | "log" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" | "cjs" | "jsx" => "application/javascript",
        "ts" | "tsx" => "text/typescript",
        "json" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "md" | "markdown" => "text/markdown",
        "go" => "text/x-go",
        "py" => "text/x-python",
        "java" => "text/x-java",
        "c" | "cpp" | "cc" | "h" | "hpp" => "text/x-c",
        "rs" => "text/x-rust",
        "sh" | "bash" | "zsh" => "text/x-shellscript",
        "sql" => "text/x-sql",
        "toml" => "text/x-toml",
        "yaml" | "yml" => "text/yaml",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "doc" | "docx" => "application/msword",
        "xls" | "xlsx" => "application/vnd.ms-excel",
        "ppt" | "pptx" => "application/vnd.ms-powerpoint",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Fenced-code-block language tag for syntax highlighting.
pub fn language_for_path(path: &Path) -> &'static str {
    match extension_lower(path).as_str() {
        "go" => "go",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "jsx",
        "ts" => "typescript",
        "tsx" => "tsx",
        "html" | "htm" => "html",
        "css" => "css",
        "java" => "java",
        "json" => "json",
        "xml" => "xml",
        "md" | "markdown" => "markdown",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "rb" => "ruby",
        "php" => "php",
        "sh" | "bash" | "zsh" => "bash",
        "sql" => "sql",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "rs" => "rust",
        "swift" => "swift",
        "kt" => "kotlin",
        "scala" => "scala",
        "groovy" => "groovy",
        "pl" => "perl",
        "r" => "r",
        "m" => "matlab",
        "ps1" => "powershell",
        "cs" => "csharp",
        "fs" => "fsharp",
        "vb" => "vbnet",
        "dart" => "dart",
        "ex" | "exs" => "elixir",
        "erl" => "erlang",
        "hs" => "haskell",
        "lua" => "lua",
        "jl" => "julia",
        "clj" => "clojure",
        _ => "text",
    }
}
