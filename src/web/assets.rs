pub const INDEX_HTML: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/src/web/assets/index.html"
));
pub const STYLES_CSS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/src/web/assets/styles.css"
));
pub const APP_JS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/src/web/assets/app.js"
));

pub const STYLES_LINK: &str = r#"<link rel="stylesheet" href="/styles.css">"#;
pub const APP_SCRIPT: &str = r#"<script src="/app.js"></script>"#;
pub const DATA_SCRIPT: &str = r#"<script id="atlas-data" type="application/json"></script>"#;
