//! Self-contained HTML page for `render`: styles, script, and map document
//! are all inlined so the file opens without the server.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::compose::MapDocument;
use crate::web::assets;

pub fn standalone_html(document: &MapDocument) -> Result<String> {
    let json = serde_json::to_string(document).context("failed to serialise map document")?;
    // Keep "</script>" inside the payload from closing the data block.
    let json = json.replace("</", "<\\/");
    Ok(assets::INDEX_HTML
        .replace(assets::STYLES_LINK, &format!("<style>\n{}</style>", assets::STYLES_CSS))
        .replace(
            assets::DATA_SCRIPT,
            &format!(r#"<script id="atlas-data" type="application/json">{json}</script>"#),
        )
        .replace(assets::APP_SCRIPT, &format!("<script>\n{}</script>", assets::APP_JS)))
}

pub fn write_standalone(document: &MapDocument, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let html = standalone_html(document)?;
    fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
