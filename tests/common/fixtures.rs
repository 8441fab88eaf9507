//! Test fixtures and constants.

/// Render URLs used in export requests
pub mod urls {
    /// Render page with a snapshot id
    pub const WITH_SNAPSHOT: &str = "http://localhost:3000/render-image?snapshotId=42";

    /// Render page without any snapshot id
    pub const WITHOUT_SNAPSHOT: &str = "http://localhost:3000/render-image";
}

/// Build a JSON export request body
pub fn export_body(render_url: &str) -> String {
    serde_json::json!({ "renderUrl": render_url }).to_string()
}

/// Encode a solid PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().expect("PNG header");
        writer
            .write_image_data(&vec![0x80u8; (width * height * 4) as usize])
            .expect("PNG data");
    }
    out
}

/// Render pages following the front-end contract: draw on a canvas, then set
/// `window.renderComplete`.
pub mod pages {
    /// Draws a 300x200 canvas and signals completion after a short delay
    pub const COMPLETES: &str = r#"<!doctype html>
<html><head><title>Snapshot</title></head>
<body style="margin:0">
<canvas width="300" height="200" style="width:300px;height:200px"></canvas>
<script>
  const ctx = document.querySelector('canvas').getContext('2d');
  ctx.fillStyle = '#ff66aa';
  ctx.fillRect(0, 0, 300, 200);
  setTimeout(() => { window.renderComplete = true; }, 300);
</script>
</body></html>"#;

    /// Draws but never signals completion, and records an error
    pub const NEVER_COMPLETES: &str = r#"<!doctype html>
<html><head><title>Stuck</title></head>
<body>
<canvas width="100" height="100"></canvas>
<script>window.lastError = 'Fabric.js not loaded';</script>
</body></html>"#;

    /// Signals completion without ever creating a canvas
    pub const NO_CANVAS: &str = r#"<!doctype html>
<html><head><title>Empty</title></head>
<body>
<div id="message">Snapshot not found</div>
<script>window.renderComplete = true;</script>
</body></html>"#;
}
